//! Syntax tree consumed by the compiler core.

mod builder;
mod expr;
mod span;

pub use builder::ExprBuilder;
pub use expr::{Accessor, Body, Case, Def, Expr, ExprKind, In, Place, Program, Sym};
pub use span::Span;
