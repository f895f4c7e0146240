//! Target code emission.
//!
//! Runs after a definition is fully resolved. Helpers the definition needs
//! (classes, conversions, morphs, dispatchers) are emitted on first request
//! into their own batches, ahead of the definition itself.

mod constructor;
mod conversion;
mod emitter;
mod expr;
mod poly;
mod runtime;


pub use constructor::{constructor_ref, field_name};
pub use conversion::{conversion_ref, needs_conversion};
pub use emitter::{Emitter, Output, js_string};
pub use expr::ExprEmitter;
pub use poly::{dispatch_ref, emit_morph, morph_ref};
pub use runtime::RUNTIME;
