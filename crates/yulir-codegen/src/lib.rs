/*! Bookkeeping shared by every step of lowering a contract to IR.
 *
 * Lowering discovers work as it goes: functions called from the code being lowered, functions
 * taken by value and called through pointers elsewhere, locals, immutables and state variables.
 * [`IRGenerationContext`] records all of it, hands out deterministic names, and builds the internal
 * dispatch functions that make pointer calls possible. [`ObjectGenerator`] drives lowering and
 * dispatch promotion to a fixed point for one object at a time.
 */

pub mod abi;
pub mod ast_builder;
pub mod collector;
pub mod context;
pub mod dispatch;
pub mod driver;
pub mod names;
pub mod utils;
pub mod variable;

pub use abi::ABIFunctions;
pub use collector::MultiUseFunctionCollector;
pub use context::IRGenerationContext;
pub use dispatch::{
    DispatchFixedPoint, DispatchPhase, DispatchTableBuilder, FunctionRef, FunctionSet,
    InternalDispatchMap,
};
pub use driver::{FunctionLowering, GeneratedObject, ObjectGenerator};
pub use utils::{PanicCode, YulUtilFunctions};
pub use variable::IRVariable;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// The caller broke the protocol of the context. Always a compiler bug.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// A construct the generator knowingly does not handle yet.
    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error(transparent)]
    Ir(#[from] yulir_core::IrError),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

pub(crate) fn precondition(holds: bool, message: impl FnOnce() -> String) -> Result<()> {
    if holds {
        Ok(())
    } else {
        Err(CodegenError::PreconditionViolation(message()))
    }
}
