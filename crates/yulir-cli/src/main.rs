use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use yulir::{
    CodegenSettings, Dialect, EmitterConfig, EvmVersion, OptimiserStepContext, OptimiserSuite,
    ReasoningBasedSimplifierStep, YulPrinter, DEFAULT_PROVER,
};

#[derive(Parser)]
#[command(name = "yulir")]
#[command(about = "yulir - reasoning-based optimisation and validation of textual EVM IR")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct GlobalOptions {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging. RUST_LOG overrides the level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Codegen settings as JSON, e.g. {"evmVersion": "berlin", "revertStrings": "debug"}.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Target EVM version. Overrides the settings file.
    #[arg(long, global = true)]
    evm_version: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace `if` conditions that are provably constant.
    Optimize {
        /// A `.yul` file or a directory searched recursively for them.
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print per-step timing.
        #[arg(long)]
        stats: bool,

        /// Highlight keywords in printed code.
        #[arg(long)]
        color: bool,
    },

    /// Check that IR files parse.
    Validate {
        input: PathBuf,
    },

    /// Show the effective settings and what the target EVM supports.
    Settings,
}

#[derive(Serialize)]
struct FileReport {
    file: String,
    steps: Vec<StepReport>,
    code: String,
}

#[derive(Serialize)]
struct StepReport {
    name: String,
    duration_ms: f64,
    summary: Option<String>,
}

#[derive(Serialize)]
struct SettingsReport {
    settings: CodegenSettings,
    prover: &'static str,
    bitwise_shifting: bool,
    static_call: bool,
    returndata: bool,
    create2: bool,
    chain_id: bool,
    base_fee: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        env_logger::Builder::new()
            .filter_module("yulir", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .init();
    }

    let settings = load_settings(&cli.global)?;

    match cli.command {
        Commands::Optimize {
            input,
            output,
            stats,
            color,
        } => cmd_optimize(&cli.global, settings, input, output, stats, color),
        Commands::Validate { input } => cmd_validate(&cli.global, input),
        Commands::Settings => cmd_settings(&cli.global, settings),
    }
}

fn load_settings(global: &GlobalOptions) -> Result<CodegenSettings> {
    let mut settings = match &global.settings {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            CodegenSettings::from_json(&json)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => CodegenSettings::default(),
    };
    if let Some(version) = &global.evm_version {
        settings.evm_version = version.parse::<EvmVersion>()?;
    }
    log::debug!(
        "using evm version {} with revert strings {}",
        settings.evm_version,
        settings.revert_strings
    );
    Ok(settings)
}

/// `input` itself if it is a file, otherwise every `.yul` file below it in path order.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input not found: {}", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "yul") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn cmd_optimize(
    global: &GlobalOptions,
    settings: CodegenSettings,
    input: PathBuf,
    output: Option<PathBuf>,
    stats: bool,
    color: bool,
) -> Result<()> {
    let files = collect_inputs(&input)?;
    if output.is_some() && files.len() != 1 {
        bail!("--output needs exactly one input file, found {}", files.len());
    }

    if global.verbose && !global.json {
        println!("{}", " yulir Optimiser".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!(" Input: {}", input.display());
        println!(" EVM version: {}", settings.evm_version);
        println!(" Prover: {}", DEFAULT_PROVER);
        println!(" Files: {}", files.len());
        println!();
    }

    let context = OptimiserStepContext::new(Dialect::evm(settings.evm_version));
    let printer = YulPrinter::with_config(EmitterConfig {
        use_colors: color && output.is_none() && !global.json,
        ..EmitterConfig::plain()
    });

    let mut reports = Vec::new();
    for file in &files {
        log::info!("optimising {}", file.display());
        let mut block = yulir::parse_file(file)
            .with_context(|| format!("Failed to parse {}", file.display()))?;

        let mut suite = OptimiserSuite::new();
        suite.enable_statistics();
        suite.register_step(ReasoningBasedSimplifierStep::new());
        suite.run_all(&context, &mut block)?;

        let code = printer.print_block(&block);
        let steps = suite
            .statistics()
            .iter()
            .map(|stat| StepReport {
                name: stat.name.clone(),
                duration_ms: stat.duration.as_secs_f64() * 1000.0,
                summary: stat.summary.clone(),
            })
            .collect();
        reports.push(FileReport {
            file: file.display().to_string(),
            steps,
            code,
        });
    }

    if global.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if let Some(output_path) = output {
        let report = &reports[0];
        fs::write(&output_path, format!("{}\n", report.code))?;
        println!(
            " {} Optimised IR saved to: {}",
            "SUCCESS:".bright_green().bold(),
            output_path.display()
        );
        print_steps(report, stats);
        return Ok(());
    }

    for report in &reports {
        if files.len() > 1 || global.verbose {
            println!("{}", format!("// {}", report.file).bright_yellow());
        }
        println!("{}", report.code);
        print_steps(report, stats);
    }
    Ok(())
}

fn print_steps(report: &FileReport, stats: bool) {
    for step in &report.steps {
        if let Some(summary) = &step.summary {
            eprintln!(" {} {}", format!("{}:", step.name).bright_cyan(), summary);
        }
        if stats {
            eprintln!("   {:<30} {:>12.3} ms", step.name, step.duration_ms);
        }
    }
}

fn cmd_validate(global: &GlobalOptions, input: PathBuf) -> Result<()> {
    let files = collect_inputs(&input)?;

    if global.verbose && !global.json {
        println!("{}", " Validating IR".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let mut invalid = 0;
    let mut results = Vec::new();
    for file in &files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        match yulir::parse(&source) {
            Ok(block) => {
                if !global.json {
                    println!("{} {}", " VALID".bright_green().bold(), file.display());
                    if global.verbose {
                        println!("   {} top-level statements", block.statements.len());
                    }
                }
                results.push(serde_json::json!({ "file": file.display().to_string(), "valid": true }));
            }
            Err(err) => {
                invalid += 1;
                if !global.json {
                    println!("{} {}", " INVALID".bright_red().bold(), file.display());
                    println!("\n{}", "Parse Error:".bright_red());
                    println!("{}", err);
                }
                results.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": false,
                    "error": err.to_string(),
                }));
            }
        }
    }

    if global.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    if invalid > 0 {
        bail!("Validation failed for {} of {} file(s)", invalid, files.len());
    }
    Ok(())
}

fn cmd_settings(global: &GlobalOptions, settings: CodegenSettings) -> Result<()> {
    let version = settings.evm_version;
    let report = SettingsReport {
        settings,
        prover: DEFAULT_PROVER,
        bitwise_shifting: version.has_bitwise_shifting(),
        static_call: version.has_static_call(),
        returndata: version.supports_returndata(),
        create2: version.has_create2(),
        chain_id: version.has_chain_id(),
        base_fee: version.has_base_fee(),
    };

    if global.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", " Settings".bright_cyan().bold());
    println!(" EVM version: {}", version);
    println!(" Revert strings: {}", settings.revert_strings);
    println!(" Prover: {}", report.prover);
    let flag = |supported: bool| if supported { "yes".green() } else { "no".red() };
    println!(" Bitwise shifting: {}", flag(report.bitwise_shifting));
    println!(" STATICCALL: {}", flag(report.static_call));
    println!(" RETURNDATA: {}", flag(report.returndata));
    println!(" CREATE2: {}", flag(report.create2));
    println!(" CHAINID: {}", flag(report.chain_id));
    println!(" BASEFEE: {}", flag(report.base_fee));
    Ok(())
}
