use hashbrown::HashMap;

use super::constraint::ConstraintSet;
use crate::errors::InternalError;
use crate::scope::BindingRecord;
use crate::syntax::Expr;
use crate::types::{TypeId, TypeKind, TypeStore};

/// State of one definition's generate-then-resolve cycle.
///
/// Side tables are keyed by node address; nodes live in the arena for the
/// whole compilation, so addresses are stable.
pub struct Session<'a> {
    pub store: &'a TypeStore<'a>,
    next_free: u32,
    pub constraints: ConstraintSet<'a>,
    pub(crate) expr_types: HashMap<*const Expr<'a>, TypeId>,
    /// Binding record behind every symbol, path and bind node.
    pub(crate) records: HashMap<*const Expr<'a>, BindingRecord>,
    /// Consequence types of each conditional without a default.
    pub(crate) branches: HashMap<*const Expr<'a>, Vec<TypeId>>,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a TypeStore<'a>) -> Self {
        Self {
            store,
            next_free: 0,
            constraints: ConstraintSet::new(),
            expr_types: HashMap::new(),
            records: HashMap::new(),
            branches: HashMap::new(),
        }
    }

    pub fn fresh_free(&mut self) -> TypeId {
        let free = self.store.free(self.next_free);
        self.next_free += 1;
        free
    }

    /// Records the type of `expr`. Each node is typed exactly once.
    pub fn track(&mut self, expr: &'a Expr<'a>, ty: TypeId) -> Result<TypeId, InternalError> {
        if self.expr_types.insert(expr.as_ptr(), ty).is_some() {
            return Err(InternalError::DoubleTracked {
                span: expr.span.clone(),
            });
        }
        Ok(ty)
    }

    pub fn type_of(&self, expr: &Expr<'a>) -> Option<TypeId> {
        self.expr_types.get(&expr.as_ptr()).copied()
    }

    pub fn record(&mut self, expr: &'a Expr<'a>, record: BindingRecord) {
        self.records.insert(expr.as_ptr(), record);
    }

    pub fn record_of(&self, expr: &Expr<'a>) -> Option<&BindingRecord> {
        self.records.get(&expr.as_ptr())
    }

    /// Replaces every type variable in `ty` with a fresh free, one per
    /// distinct variable.
    pub fn instantiate(&mut self, ty: TypeId) -> TypeId {
        if self.store.is_concrete(ty) {
            return ty;
        }
        let mut vars = HashMap::new();
        self.instantiate_inner(ty, &mut vars)
    }

    fn instantiate_inner(&mut self, ty: TypeId, vars: &mut HashMap<&'a str, TypeId>) -> TypeId {
        let store = self.store;
        match *store.kind(ty) {
            TypeKind::Var(name) => *vars.entry(name).or_insert_with(|| {
                let free = store.free(self.next_free);
                self.next_free += 1;
                free
            }),
            TypeKind::Prim(_) | TypeKind::Host(_) | TypeKind::Free(_) => ty,
            TypeKind::Struct {
                pos,
                labs,
                variants,
            } => {
                let pos: Vec<TypeId> = pos
                    .iter()
                    .map(|&t| self.instantiate_inner(t, vars))
                    .collect();
                let labs: Vec<(&str, TypeId)> = labs
                    .iter()
                    .map(|f| (f.label, self.instantiate_inner(f.ty, vars)))
                    .collect();
                let variants: Vec<(&str, TypeId)> = variants
                    .iter()
                    .map(|f| (f.label, self.instantiate_inner(f.ty, vars)))
                    .collect();
                store.struct_type(&pos, &labs, &variants)
            }
            TypeKind::Union(members) => {
                let members: Vec<TypeId> = members
                    .iter()
                    .map(|&t| self.instantiate_inner(t, vars))
                    .collect();
                store.union(&members)
            }
            TypeKind::Sig { dom, ret } => {
                let dom = self.instantiate_inner(dom, vars);
                let ret = self.instantiate_inner(ret, vars);
                store.sig(dom, ret)
            }
            TypeKind::Prop { accessor, base } => {
                let base = self.instantiate_inner(base, vars);
                store.prop(accessor, base)
            }
            TypeKind::VariantMember(field) => {
                let payload = self.instantiate_inner(field.ty, vars);
                store.variant_member(field.label, payload)
            }
            TypeKind::Poly(sigs) => {
                let sigs: Vec<TypeId> = sigs
                    .iter()
                    .map(|&t| self.instantiate_inner(t, vars))
                    .collect();
                store.poly(&sigs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ExprBuilder;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_track_twice_is_internal_error() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);
        let mut session = Session::new(store);
        let lit = b.int(1);

        session.track(lit, store.int()).unwrap();
        let err = session.track(lit, store.int()).unwrap_err();
        assert_eq!(err, InternalError::DoubleTracked { span: lit.span.clone() });
    }

    #[test]
    fn test_instantiate_shares_one_free_per_variable() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut session = Session::new(store);
        let t = store.type_var("T");
        let generic = store.sig(t, t);

        let first = session.instantiate(generic);
        let second = session.instantiate(generic);
        let (dom, ret) = store.kind(first).as_sig().unwrap();
        assert_eq!(dom, ret);
        assert!(store.kind(dom).is_free());
        assert_ne!(first, second);
        assert_eq!(session.instantiate(store.int()), store.int());
    }
}
