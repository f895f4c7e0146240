mod store;
mod ty;


pub use store::TypeStore;
pub use ty::{Field, TypeId, TypeKind, TypeRecord};
