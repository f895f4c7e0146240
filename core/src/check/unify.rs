use std::collections::BTreeSet;

use hashbrown::HashMap;
use tracing::debug;

use crate::syntax::Accessor;
use crate::types::{TypeId, TypeKind, TypeStore};

/// Errors from explicit unification requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnifyError {
    #[error("{free} is already bound to {bound}; cannot bind it to {other}")]
    Conflict {
        free: String,
        bound: String,
        other: String,
    },
    #[error("{ty} is not a free type")]
    NotFree { ty: String },
}

/// Substitution state of one inference session.
///
/// Bindings are permanent: once a free placeholder is bound, it stays bound
/// for the rest of the session. There is no occurs check and no
/// generalization.
pub struct Unifier<'a> {
    pub(super) store: &'a TypeStore<'a>,
    subst: HashMap<u32, TypeId>,
    // Frees that so far only received the bottom type.
    free_nevers: BTreeSet<u32>,
}

impl<'a> Unifier<'a> {
    pub fn new(store: &'a TypeStore<'a>) -> Self {
        Self {
            store,
            subst: HashMap::new(),
            free_nevers: BTreeSet::new(),
        }
    }

    pub fn store(&self) -> &'a TypeStore<'a> {
        self.store
    }

    pub fn is_bound(&self, index: u32) -> bool {
        self.subst.contains_key(&index)
    }

    /// Follows bound frees and projects properties whose base is a known struct.
    pub fn resolve(&self, mut ty: TypeId) -> TypeId {
        loop {
            match *self.store.kind(ty) {
                TypeKind::Free(index) => match self.subst.get(&index) {
                    Some(&bound) if bound != ty => ty = bound,
                    _ => return ty,
                },
                TypeKind::Prop { accessor, base } => {
                    let base = self.resolve(base);
                    match field_type(self.store, base, accessor) {
                        Some(field) => ty = field,
                        None => return ty,
                    }
                }
                _ => return ty,
            }
        }
    }

    pub(super) fn bind(&mut self, index: u32, ty: TypeId) {
        debug!(
            free = index,
            ty = self.store.descriptor(ty),
            "binding free type"
        );
        self.subst.insert(index, ty);
    }

    /// Binds `free` to `ty`.
    ///
    /// Binding a free to the type it is already bound to succeeds; binding it
    /// to anything else is a conflict.
    pub fn unify(&mut self, free: TypeId, ty: TypeId) -> Result<(), UnifyError> {
        let TypeKind::Free(index) = *self.store.kind(free) else {
            return Err(UnifyError::NotFree {
                ty: self.store.descriptor(free).to_string(),
            });
        };
        let ty = self.resolve(ty);
        match self.subst.get(&index) {
            Some(&bound) => {
                let bound = self.resolve(bound);
                if bound == ty {
                    Ok(())
                } else {
                    Err(UnifyError::Conflict {
                        free: self.store.descriptor(free).to_string(),
                        bound: self.store.descriptor(bound).to_string(),
                        other: self.store.descriptor(ty).to_string(),
                    })
                }
            }
            None => {
                if ty != free {
                    self.bind(index, ty);
                }
                Ok(())
            }
        }
    }

    pub(super) fn defer_never(&mut self, index: u32) {
        self.free_nevers.insert(index);
    }

    /// Binds every bottom candidate that no other constraint resolved to the
    /// bottom type. Returns how many were bound.
    pub fn bind_bottom_candidates(&mut self) -> usize {
        let never = self.store.never();
        let pending: Vec<u32> = self
            .free_nevers
            .iter()
            .copied()
            .filter(|index| !self.is_bound(*index))
            .collect();
        for &index in &pending {
            self.bind(index, never);
        }
        pending.len()
    }

    /// Deep substitution of every bound free and resolvable property in `ty`.
    ///
    /// Unbound frees are left in place; callers check concreteness.
    pub fn substitute(&self, ty: TypeId) -> TypeId {
        let mut visiting = Vec::new();
        self.substitute_inner(ty, &mut visiting)
    }

    fn substitute_inner(&self, ty: TypeId, visiting: &mut Vec<u32>) -> TypeId {
        let store = self.store;
        if store.is_concrete(ty) {
            return ty;
        }
        match *store.kind(ty) {
            TypeKind::Prim(_) | TypeKind::Host(_) | TypeKind::Var(_) => ty,
            TypeKind::Free(index) => match self.subst.get(&index) {
                // Without an occurs check a free can reach itself; stop there.
                Some(&bound) if !visiting.contains(&index) => {
                    visiting.push(index);
                    let result = self.substitute_inner(bound, visiting);
                    visiting.pop();
                    result
                }
                _ => ty,
            },
            TypeKind::Prop { accessor, base } => {
                let base_sub = self.substitute_inner(base, visiting);
                match field_type(store, base_sub, accessor) {
                    Some(field) => self.substitute_inner(field, visiting),
                    None if base_sub == base => ty,
                    None => store.prop(accessor, base_sub),
                }
            }
            TypeKind::Struct {
                pos,
                labs,
                variants,
            } => {
                let pos: Vec<TypeId> = pos
                    .iter()
                    .map(|&t| self.substitute_inner(t, visiting))
                    .collect();
                let labs: Vec<(&str, TypeId)> = labs
                    .iter()
                    .map(|f| (f.label, self.substitute_inner(f.ty, visiting)))
                    .collect();
                let variants: Vec<(&str, TypeId)> = variants
                    .iter()
                    .map(|f| (f.label, self.substitute_inner(f.ty, visiting)))
                    .collect();
                store.struct_type(&pos, &labs, &variants)
            }
            TypeKind::Union(members) => {
                let members: Vec<TypeId> = members
                    .iter()
                    .map(|&t| self.substitute_inner(t, visiting))
                    .collect();
                store.union(&members)
            }
            TypeKind::Sig { dom, ret } => {
                let dom = self.substitute_inner(dom, visiting);
                let ret = self.substitute_inner(ret, visiting);
                store.sig(dom, ret)
            }
            TypeKind::VariantMember(field) => {
                let payload = self.substitute_inner(field.ty, visiting);
                store.variant_member(field.label, payload)
            }
            TypeKind::Poly(sigs) => {
                let sigs: Vec<TypeId> = sigs
                    .iter()
                    .map(|&t| self.substitute_inner(t, visiting))
                    .collect();
                store.poly(&sigs)
            }
        }
    }
}

/// Type of the field selected by `accessor`, if `base` is a struct that has it.
pub fn field_type(store: &TypeStore<'_>, base: TypeId, accessor: Accessor<'_>) -> Option<TypeId> {
    let TypeKind::Struct { pos, labs, .. } = *store.kind(base) else {
        return None;
    };
    match accessor {
        Accessor::Index(i) => pos.get(i).copied(),
        Accessor::Name(name) => labs.iter().find(|f| f.label == name).map(|f| f.ty),
    }
}
