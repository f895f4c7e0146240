//! Constraint generation.
//!
//! Each definition is typed in its own [`Session`]: the [`Generator`] walks
//! the expression tree, assigns every node a type (possibly containing free
//! placeholders) and queues the obligations that resolution must discharge.

mod constraint;
mod generate;
mod session;
mod type_expr;


pub use constraint::{Constraint, ConstraintSet, PolyCon, PropCon, RelCon};
pub use generate::Generator;
pub(crate) use generate::{Element, classify};
pub use session::Session;
pub use type_expr::eval_type;
pub(crate) use type_expr::path_name;
