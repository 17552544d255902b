/*! Core IR types shared by the code generator, the optimiser and the printers.
 *
 * Lowering and optimisation both operate on the same small block-structured IR and consult the same
 * frontend declarations. Keeping those types in one crate lets every stage agree on identities,
 * arities and target configuration without depending on each other.
 */

pub mod arity;
pub mod ast;
pub mod dialect;
pub mod frontend;
pub mod literal;
pub mod settings;
pub mod types;

pub use arity::Arity;
pub use ast::{
    Assignment, Block, Case, Expression, ForLoop, FunctionCall, FunctionDefinition, Identifier, If,
    Literal, LiteralKind, Span, Statement, Switch, VariableDeclaration,
};
pub use dialect::{BuiltinFunction, Dialect, Instruction};
pub use frontend::{CallExpression, ContractDefinition, FunctionKind, NodeId, VariableMutability};
pub use literal::value_of_literal;
pub use settings::{CodegenSettings, EvmVersion, RevertStrings};
pub use types::{tuple_size_on_stack, DataLocation, FunctionTypeKind, SolType};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("Unknown builtin: {0}")]
    UnknownBuiltin(String),
    #[error("Unknown EVM version: {0}")]
    UnknownEvmVersion(String),
    #[error("Unknown revert strings setting: {0}")]
    UnknownRevertStrings(String),
}

pub type Result<T> = std::result::Result<T, IrError>;
