//! State shared by every definition of one compilation.

use hashbrown::HashSet;

use crate::codegen::Output;
use crate::options::CompileOptions;
use crate::poly::PolyRegistry;
use crate::scope::{ScopeTree, mangle};
use crate::types::{TypeId, TypeStore};

/// Registries threaded through the whole compilation.
///
/// The conversion and constructor sets record what has already been
/// emitted, so each helper appears in the output exactly once.
pub struct GlobalCtx<'a> {
    pub store: &'a TypeStore<'a>,
    pub options: CompileOptions,
    pub scopes: ScopeTree<'a>,
    pub polys: PolyRegistry<'a>,
    pub(crate) conversions: HashSet<(TypeId, TypeId)>,
    pub(crate) constructors: HashSet<TypeId>,
    pub out: Output,
    next_local: usize,
}

impl<'a> GlobalCtx<'a> {
    pub fn new(store: &'a TypeStore<'a>, options: CompileOptions) -> Self {
        Self {
            store,
            options,
            scopes: ScopeTree::new(store),
            polys: PolyRegistry::new(),
            conversions: HashSet::new(),
            constructors: HashSet::new(),
            out: Output::new(),
            next_local: 0,
        }
    }

    /// Target name for a local binding. Suffixed so it never shadows a
    /// definition of the same source name.
    pub fn local_name(&mut self, name: &str) -> String {
        let n = self.next_local;
        self.next_local += 1;
        format!("{}${}", mangle(name), n)
    }
}
