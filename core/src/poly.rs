//! Polymorphic families and their morphs.
//!
//! A family collects every morph declared under one name in a space. Each
//! morph is keyed by the domain of its signature; selection happens during
//! resolution and emission is lazy and at most once per morph.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::check::Resolution;
use crate::errors::{TypeError, TypeErrorKind};
use crate::scope::ScopeId;
use crate::syntax::{Expr, Span};
use crate::types::{TypeId, TypeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionStatus {
    NotEmitted,
    InProgress,
    Emitted,
}

pub struct Morph<'a> {
    pub val: &'a Expr<'a>,
    /// Site of the morph definition.
    pub span: Span,
    pub sig: TypeId,
    pub dom: TypeId,
    pub ret: TypeId,
    pub status: EmissionStatus,
    /// Resolved body, once typed.
    pub typed: Option<Rc<Resolution<'a>>>,
    /// Referenced before its body was typed; emit as soon as it is.
    pub wanted: bool,
}

pub struct PolyFamily<'a> {
    pub name: String,
    pub host_name: String,
    /// Space whose definitions declared the family.
    pub space: ScopeId,
    pub morphs: Vec<Morph<'a>>,
    by_domain: HashMap<TypeId, usize>,
    dispatchers: HashMap<TypeId, EmissionStatus>,
}

impl<'a> PolyFamily<'a> {
    /// Adds a morph, rejecting a second morph over the same domain.
    pub fn add_morph(&mut self, store: &TypeStore<'a>, morph: Morph<'a>) -> Result<usize, TypeError> {
        if let Some(&existing) = self.by_domain.get(&morph.dom) {
            let first = self.morphs[existing].span.clone();
            return Err(TypeError::new(
                TypeErrorKind::DuplicateMorph {
                    family: self.name.clone(),
                    domain: store.descriptor(morph.dom).to_string(),
                    first,
                },
                morph.span.clone(),
                "morph definition",
            ));
        }
        let index = self.morphs.len();
        self.by_domain.insert(morph.dom, index);
        self.morphs.push(morph);
        Ok(index)
    }

    pub fn morph_for_domain(&self, dom: TypeId) -> Option<usize> {
        self.by_domain.get(&dom).copied()
    }

    pub fn morph_for_sig(&self, sig: TypeId) -> Option<usize> {
        self.morphs.iter().position(|m| m.sig == sig)
    }

    /// Signatures of every morph, in declaration order.
    pub fn sigs(&self) -> Vec<TypeId> {
        self.morphs.iter().map(|m| m.sig).collect()
    }

    pub fn poly_type(&self, store: &TypeStore<'a>) -> TypeId {
        store.poly(&self.sigs())
    }

    /// Emitted name of the morph or dispatcher with signature `sig`.
    pub fn member_name(&self, sig: TypeId) -> String {
        format!("{}__{}", self.host_name, sig.index())
    }

    pub fn dispatcher_status(&self, sig: TypeId) -> EmissionStatus {
        self.dispatchers
            .get(&sig)
            .copied()
            .unwrap_or(EmissionStatus::NotEmitted)
    }

    pub fn set_dispatcher_status(&mut self, sig: TypeId, status: EmissionStatus) {
        self.dispatchers.insert(sig, status);
    }
}

#[derive(Default)]
pub struct PolyRegistry<'a> {
    families: Vec<PolyFamily<'a>>,
}

impl<'a> PolyRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_family(&mut self, name: &str, host_name: String, space: ScopeId) -> FamilyId {
        self.families.push(PolyFamily {
            name: name.to_string(),
            host_name,
            space,
            morphs: Vec::new(),
            by_domain: HashMap::new(),
            dispatchers: HashMap::new(),
        });
        FamilyId(self.families.len() - 1)
    }

    pub fn family(&self, id: FamilyId) -> &PolyFamily<'a> {
        &self.families[id.0]
    }

    pub fn family_mut(&mut self, id: FamilyId) -> &mut PolyFamily<'a> {
        &mut self.families[id.0]
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ExprBuilder;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    fn morph<'a>(store: &TypeStore<'a>, val: &'a Expr<'a>, dom: TypeId) -> Morph<'a> {
        let ret = store.str();
        Morph {
            val,
            span: val.span.clone(),
            sig: store.sig(dom, ret),
            dom,
            ret,
            status: EmissionStatus::NotEmitted,
            typed: None,
            wanted: false,
        }
    }

    #[test]
    fn test_duplicate_domain_cites_both_sites() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);
        let first = b.int(1);
        let second = b.int(2);

        let mut registry = PolyRegistry::new();
        let id = registry.add_family("foo", "foo".to_string(), ScopeId::ROOT);
        let family = registry.family_mut(id);
        family.add_morph(store, morph(store, first, store.int())).unwrap();
        let err = family
            .add_morph(store, morph(store, second, store.int()))
            .unwrap_err();

        let TypeErrorKind::DuplicateMorph { first: first_site, domain, .. } = &err.kind else {
            panic!("expected a duplicate morph error, got {:?}", err.kind);
        };
        assert_eq!(domain, "Int");
        assert_eq!(*first_site, first.span);
        assert_eq!(err.span, second.span);
    }

    #[test]
    fn test_member_names_use_signature_index() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);

        let mut registry = PolyRegistry::new();
        let id = registry.add_family("show", "A__show".to_string(), ScopeId::ROOT);
        let family = registry.family_mut(id);
        family.add_morph(store, morph(store, b.int(1), store.int())).unwrap();
        let sig = family.morphs[0].sig;
        assert_eq!(family.member_name(sig), format!("A__show__{}", sig.index()));
        assert_eq!(family.morph_for_domain(store.int()), Some(0));
        assert_eq!(family.morph_for_domain(store.str()), None);
    }
}
