/*! Rewrites `if` conditions that a prover shows to be constant.
 *
 * The walk keeps one prover session. Definitions of single-assignment variables are asserted as
 * they are reached, and each `if` body is visited under the assumption that its condition is
 * non-zero. Every assumption lives in a [`ProverScope`], so nothing asserted inside a body is
 * visible to the statements after it.
 */

use crate::encoder::FormulaEncoder;
use crate::prover::{CheckResult, Formula, Prover, ProverScope};
use crate::ssa::SSAValueTracker;
use crate::step::{OptimiserStep, OptimiserStepContext};
use tracing::debug;
use yulir_core::ast::{Block, Expression, If, Literal, Statement, VariableDeclaration};
use yulir_core::Dialect;

/// The prover [`ReasoningBasedSimplifier::run`] uses: Z3 with the `smt` feature, otherwise the
/// built-in evaluator.
#[cfg(feature = "smt")]
pub type DefaultProver = crate::z3_prover::Z3Prover;
#[cfg(not(feature = "smt"))]
pub type DefaultProver = crate::eval_prover::EvalProver;

/// Short name of [`DefaultProver`] for reports.
pub const DEFAULT_PROVER: &str = if cfg!(feature = "smt") { "z3" } else { "eval" };

/// How many conditions a run replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifierStats {
    pub rewritten_to_true: usize,
    pub rewritten_to_false: usize,
}

impl SimplifierStats {
    pub fn total(&self) -> usize {
        self.rewritten_to_true + self.rewritten_to_false
    }
}

pub struct ReasoningBasedSimplifier<'a, P: Prover + ?Sized> {
    encoder: FormulaEncoder<'a>,
    prover: &'a mut P,
    stats: SimplifierStats,
}

impl ReasoningBasedSimplifier<'_, DefaultProver> {
    /// Simplifies `block` in place with the [`DefaultProver`].
    pub fn run(dialect: &Dialect, block: &mut Block) -> SimplifierStats {
        let mut prover = DefaultProver::new();
        ReasoningBasedSimplifier::run_with_prover(dialect, block, &mut prover)
    }
}

impl<'a, P: Prover + ?Sized> ReasoningBasedSimplifier<'a, P> {
    pub fn new(dialect: &'a Dialect, block: &Block, prover: &'a mut P) -> Self {
        Self {
            encoder: FormulaEncoder::new(dialect, SSAValueTracker::ssa_variables(block)),
            prover,
            stats: SimplifierStats::default(),
        }
    }

    pub fn run_with_prover(dialect: &'a Dialect, block: &mut Block, prover: &'a mut P) -> SimplifierStats {
        let mut simplifier = ReasoningBasedSimplifier::new(dialect, block, prover);
        simplifier.visit_block(block);
        debug!(
            to_true = simplifier.stats.rewritten_to_true,
            to_false = simplifier.stats.rewritten_to_false,
            "reasoning-based simplifier finished"
        );
        simplifier.stats
    }

    pub fn visit_block(&mut self, block: &mut Block) {
        for statement in &mut block.statements {
            self.visit_statement(statement);
        }
    }

    fn visit_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::VariableDeclaration(declaration) => self.visit_declaration(declaration),
            Statement::If(if_statement) => self.visit_if(if_statement),
            Statement::FunctionDefinition(function) => self.visit_block(&mut function.body),
            Statement::Switch(switch) => {
                for case in &mut switch.cases {
                    self.visit_block(&mut case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                self.visit_block(&mut for_loop.pre);
                self.visit_block(&mut for_loop.body);
                self.visit_block(&mut for_loop.post);
            }
            Statement::Block(block) => self.visit_block(block),
            Statement::ExpressionStatement(_)
            | Statement::Assignment(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Leave(_) => {}
        }
    }

    fn visit_declaration(&mut self, declaration: &VariableDeclaration) {
        let [variable] = declaration.variables.as_slice() else {
            return;
        };
        let Some(value) = &declaration.value else {
            return;
        };
        if !self.encoder.is_ssa_variable(&variable.name) {
            return;
        }
        let bound = self.encoder.bind_variable(self.prover, &variable.name);
        let definition = self.encoder.encode(self.prover, value);
        self.prover.assert(bound.equals(definition));
    }

    fn visit_if(&mut self, if_statement: &mut If) {
        let condition = self.encoder.encode(self.prover, &if_statement.condition);
        let span = if_statement.condition.span();

        let never_zero = self.refutes(condition.clone().equals(Formula::int(0)));
        let always_zero = self.refutes(condition.clone().not_equals(Formula::int(0)));
        // Both hold only in unreachable code. Zero wins there.
        if always_zero {
            debug!(%condition, "condition is always zero");
            if_statement.condition = Expression::Literal(Literal::number("0").with_span(span));
            self.stats.rewritten_to_false += 1;
        } else if never_zero {
            debug!(%condition, "condition is never zero");
            if_statement.condition = Expression::Literal(Literal::number("1").with_span(span));
            self.stats.rewritten_to_true += 1;
        }

        self.with_scope(|simplifier| {
            simplifier
                .prover
                .assert(condition.not_equals(Formula::int(0)));
            simplifier.visit_block(&mut if_statement.body);
        });
    }

    /// Runs `visit` inside a prover scope that is closed on return.
    fn with_scope<R>(&mut self, visit: impl FnOnce(&mut Self) -> R) -> R {
        self.prover.push();
        let result = visit(self);
        self.prover.pop();
        result
    }

    /// Whether `hypothesis` is unsatisfiable in the current context. `Unknown` refutes nothing.
    fn refutes(&mut self, hypothesis: Formula) -> bool {
        let mut scope = ProverScope::new(&mut *self.prover);
        scope.assert(hypothesis);
        scope.check(&[]) == CheckResult::Unsatisfiable
    }
}

/// [`ReasoningBasedSimplifier`] as a step of an [`crate::OptimiserSuite`].
#[derive(Debug, Default)]
pub struct ReasoningBasedSimplifierStep {
    stats: SimplifierStats,
}

impl ReasoningBasedSimplifierStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites summed over every run of this step.
    pub fn stats(&self) -> SimplifierStats {
        self.stats
    }
}

impl OptimiserStep for ReasoningBasedSimplifierStep {
    fn name(&self) -> &'static str {
        "ReasoningBasedSimplifier"
    }

    fn description(&self) -> &'static str {
        "Replaces if conditions that are provably constant"
    }

    fn run(&mut self, context: &OptimiserStepContext, block: &mut Block) -> anyhow::Result<()> {
        let stats = ReasoningBasedSimplifier::run(&context.dialect, block);
        self.stats.rewritten_to_true += stats.rewritten_to_true;
        self.stats.rewritten_to_false += stats.rewritten_to_false;
        Ok(())
    }

    fn summary(&self) -> Option<String> {
        Some(format!(
            "{} condition(s) always true, {} always false",
            self.stats.rewritten_to_true, self.stats.rewritten_to_false
        ))
    }
}
