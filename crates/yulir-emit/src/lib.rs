/*! Turn IR back into readable text.
 *
 * Generated helper functions, dispatchers and optimiser output all end up as text. One printer
 * keeps their layout identical so outputs can be compared byte for byte.
 */

pub mod config;
pub mod emitter;
pub mod printer;

pub use config::{EmitterConfig, IndentStyle};
pub use emitter::{EmitContext, EmitResult, Emitter};
pub use printer::YulPrinter;
