/*! Optimiser steps over yulir IR.
 *
 * The main step is the [`ReasoningBasedSimplifier`]: it encodes the definitions of
 * single-assignment variables and every `if` condition as formulas, asks a [`Prover`] whether
 * the condition can be zero or non-zero, and replaces conditions that cannot with a constant.
 *
 * Provers are pluggable. With the `smt` feature, `Z3Prover` hands the formulas to Z3 and is
 * the default. [`EvalProver`] is always available and is the default without the feature. It
 * only answers "unsatisfiable" when concrete definitions force a contradiction, so conditions
 * that depend on an assumed branch condition stay untouched.
 */

pub mod encoder;
pub mod eval_prover;
pub mod prover;
pub mod simplifier;
pub mod ssa;
pub mod step;
#[cfg(feature = "smt")]
pub mod z3_prover;

pub use encoder::FormulaEncoder;
pub use eval_prover::EvalProver;
pub use prover::{CheckResult, Formula, Prover, ProverScope, Sort};
pub use simplifier::{
    DefaultProver, ReasoningBasedSimplifier, ReasoningBasedSimplifierStep, SimplifierStats,
    DEFAULT_PROVER,
};
pub use ssa::SSAValueTracker;
pub use step::{OptimiserStep, OptimiserStepContext, OptimiserSuite, StepStatistics};
#[cfg(feature = "smt")]
pub use z3_prover::Z3Prover;
