/*! Unified interface for the yulir back end.
 *
 * One import for the code generation context and its dispatch machinery, the branch simplifier,
 * and parsing and printing of the textual IR.
 */

pub use yulir_codegen as codegen;
pub use yulir_core as core;
pub use yulir_emit as emit;
pub use yulir_optimizer as optimizer;
pub use yulir_parser as parser;

pub use yulir_core::{
    ast::{Block, Expression, Statement},
    Arity, CodegenSettings, Dialect, EvmVersion, RevertStrings, SolType,
};

pub use yulir_codegen::{
    CodegenError, FunctionLowering, FunctionRef, IRGenerationContext, ObjectGenerator,
};

pub use yulir_emit::{EmitterConfig, YulPrinter};

pub use yulir_optimizer::{
    DefaultProver, EvalProver, OptimiserStepContext, OptimiserSuite, Prover,
    ReasoningBasedSimplifier, ReasoningBasedSimplifierStep, DEFAULT_PROVER,
};

#[cfg(feature = "smt")]
pub use yulir_optimizer::Z3Prover;

pub use yulir_parser::{parse, parse_file};
