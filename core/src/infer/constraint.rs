//! Ordered obligations produced by constraint generation.
//!
//! Constraints are resolved in exactly the order they were added, which is
//! left-to-right, depth-first over the expression tree.

use crate::poly::FamilyId;
use crate::syntax::{Accessor, Expr};
use crate::types::TypeId;

/// `act` must be compatible with `exp`.
#[derive(Debug, Clone)]
pub struct RelCon<'a> {
    /// Expression whose value flows into the expected position.
    pub act_expr: &'a Expr<'a>,
    pub act: TypeId,
    pub exp: TypeId,
    /// Type expression or site that supplied `exp`, if any.
    pub exp_expr: Option<&'a Expr<'a>>,
    /// What is being checked, e.g. "call argument".
    pub desc: &'static str,
    /// Set for consequences of a conditional without a default.
    pub branch_of: Option<&'a Expr<'a>>,
}

/// `base` must be a struct with a field selected by `accessor`.
#[derive(Debug, Clone)]
pub struct PropCon<'a> {
    pub expr: &'a Expr<'a>,
    pub accessor: Accessor<'a>,
    pub base: TypeId,
}

/// A reference to a polymorphic family, typed as `free` until a morph is
/// selected.
#[derive(Debug, Clone)]
pub struct PolyCon<'a> {
    pub expr: &'a Expr<'a>,
    pub family: FamilyId,
    pub poly: TypeId,
    pub free: TypeId,
}

#[derive(Debug, Clone)]
pub enum Constraint<'a> {
    Rel(RelCon<'a>),
    Prop(PropCon<'a>),
    Poly(PolyCon<'a>),
}

impl<'a> Constraint<'a> {
    pub fn expr(&self) -> &'a Expr<'a> {
        match self {
            Constraint::Rel(c) => c.act_expr,
            Constraint::Prop(c) => c.expr,
            Constraint::Poly(c) => c.expr,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintSet<'a> {
    constraints: Vec<Constraint<'a>>,
}

impl<'a> ConstraintSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rel(&mut self, con: RelCon<'a>) {
        self.constraints.push(Constraint::Rel(con));
    }

    pub fn add_prop(&mut self, expr: &'a Expr<'a>, accessor: Accessor<'a>, base: TypeId) {
        self.constraints
            .push(Constraint::Prop(PropCon { expr, accessor, base }));
    }

    pub fn add_poly(&mut self, expr: &'a Expr<'a>, family: FamilyId, poly: TypeId, free: TypeId) {
        self.constraints.push(Constraint::Poly(PolyCon {
            expr,
            family,
            poly,
            free,
        }));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint<'a>> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ExprBuilder;
    use crate::types::TypeStore;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constraints_keep_insertion_order() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);
        let first = b.int(1);
        let second = b.sym("x");

        let mut cs = ConstraintSet::new();
        cs.add_rel(RelCon {
            act_expr: first,
            act: store.int(),
            exp: store.int(),
            exp_expr: None,
            desc: "test",
            branch_of: None,
        });
        cs.add_prop(second, Accessor::Index(0), store.void());

        assert_eq!(cs.len(), 2);
        let exprs: Vec<*const Expr> = cs.iter().map(|c| c.expr().as_ptr()).collect();
        assert_eq!(exprs, vec![first.as_ptr(), second.as_ptr()]);
    }
}
