//! Semantic core of the ploy compiler.
//!
//! A [`Program`] built from syntax nodes is typed definition by definition
//! and emitted as a JavaScript program. Type checking and code generation
//! are interleaved: a definition is compiled the first time it is
//! referenced, so only what `main` reaches ends up in the output.

pub mod check;
pub mod codegen;
pub mod compiler;
pub mod context;
pub mod diagnostics;
pub mod errors;
pub mod infer;
pub mod options;
pub mod poly;
pub mod scope;
pub mod syntax;
pub mod types;

pub use compiler::compile_program;
pub use diagnostics::{Diagnostic, RelatedInfo, Severity};
pub use errors::{Error, InternalError, ScopeError, ScopeErrorKind, TypeError, TypeErrorKind};
pub use options::CompileOptions;
pub use syntax::{ExprBuilder, Program, Span};
pub use types::{TypeId, TypeStore};
