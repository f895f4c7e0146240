//! Hierarchical name resolution.
//!
//! Scopes form a tree. Space scopes are path-addressable modules rooted at
//! `ROOT` and hold definitions that are compiled on first reference; local
//! and function scopes hold bindings introduced while generating a body.

mod record;
mod tree;

pub use record::{BindingRecord, RecordKind, mangle};
pub use tree::{PendingDef, ScopeId, ScopeKind, ScopeTree};
