use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::debug;
use yulir_core::ast::Block;
use yulir_core::Dialect;

/// What every step gets to see besides the code.
#[derive(Debug, Clone)]
pub struct OptimiserStepContext {
    pub dialect: Dialect,
}

impl OptimiserStepContext {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

pub trait OptimiserStep {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn run(&mut self, context: &OptimiserStepContext, block: &mut Block) -> Result<()>;

    /// One line describing what the step did so far, for reports.
    fn summary(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StepStatistics {
    pub name: String,
    pub duration: Duration,
    pub summary: Option<String>,
}

/// Runs registered steps in order over one block.
pub struct OptimiserSuite {
    steps: Vec<Box<dyn OptimiserStep>>,
    statistics: Vec<StepStatistics>,
    collect_stats: bool,
}

impl OptimiserSuite {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            statistics: Vec::new(),
            collect_stats: false,
        }
    }

    pub fn enable_statistics(&mut self) {
        self.collect_stats = true;
    }

    pub fn register_step<S: OptimiserStep + 'static>(&mut self, step: S) {
        self.steps.push(Box::new(step));
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn run_all(&mut self, context: &OptimiserStepContext, block: &mut Block) -> Result<()> {
        for step in &mut self.steps {
            let start = self.collect_stats.then(Instant::now);

            debug!(step = step.name(), "running optimiser step");
            step.run(context, block)?;

            if let Some(start) = start {
                self.statistics.push(StepStatistics {
                    name: step.name().to_string(),
                    duration: start.elapsed(),
                    summary: step.summary(),
                });
            }
        }
        Ok(())
    }

    pub fn statistics(&self) -> &[StepStatistics] {
        &self.statistics
    }
}

impl Default for OptimiserSuite {
    fn default() -> Self {
        Self::new()
    }
}
