//! Ploy - an expression language compiled to JavaScript
//!
//! # Overview
//!
//! Ploy programs are typed definition by definition and emitted as one
//! self-running JavaScript file. Values of compatible but different types are
//! adapted by generated conversion functions, and polymorphic families are
//! resolved to a single morph when the argument type is known or to a runtime
//! dispatch table when it is a union.
//!
//! The parser is not part of this crate: programs are built with
//! [`ExprBuilder`].
//!
//! # Quick Start
//!
//! ```
//! use bumpalo::Bump;
//! use ploy::{CompileOptions, ExprBuilder, TypeStore, compile_program};
//!
//! let arena = Bump::new();
//! let store = TypeStore::new(&arena);
//! let b = ExprBuilder::new(&arena);
//!
//! // in ROOT: answer = 42
//! // main: answer
//! let program = b.program(
//!     vec![b.in_(&[], vec![b.def_bind("answer", b.int(42))])],
//!     b.body(&[], b.sym("answer")),
//! );
//!
//! let js = compile_program(store, program, CompileOptions::default()).unwrap();
//! assert!(js.contains("const answer = 42;"));
//! ```

mod error_renderer;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};

// Re-export public API from ploy_core
pub use ploy_core::{
    CompileOptions, Diagnostic, Error, ExprBuilder, InternalError, Program, RelatedInfo,
    ScopeError, ScopeErrorKind, Severity, Span, TypeError, TypeErrorKind, TypeId, TypeStore,
    compile_program,
};

// Re-export modules for embedders that build trees or inspect types
pub use ploy_core::{syntax, types};
