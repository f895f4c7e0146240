//! Type comparison, unification and constraint resolution.

mod comparator;
mod resolve;
mod unify;
mod verdict;

#[cfg(test)]
mod comparator_test;

pub use comparator::{FieldSource, align_fields};
pub use resolve::{Resolution, Selection, resolve};
pub use unify::{UnifyError, Unifier, field_type};
pub use verdict::{Incompatibility, Verdict};
