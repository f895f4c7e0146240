//! Resolution driver: runs the comparator over a session's constraints.

use hashbrown::HashMap;
use tracing::trace;

use super::unify::{Unifier, field_type};
use super::verdict::{Incompatibility, Verdict};
use crate::codegen::needs_conversion;
use crate::diagnostics::context::Context;
use crate::errors::{Error, InternalError, TypeError, TypeErrorKind};
use crate::infer::{Constraint, PolyCon, PropCon, RelCon, Session};
use crate::poly::{FamilyId, PolyRegistry};
use crate::scope::BindingRecord;
use crate::syntax::Expr;
use crate::types::{TypeId, TypeKind, TypeStore};

/// Morph chosen for a reference to a polymorphic family.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The argument type is exactly one morph's domain.
    Morph { family: FamilyId, sig: TypeId },
    /// The argument is a union; each member is routed to its morph at run time.
    Dispatch {
        family: FamilyId,
        /// Synthesized signature from the union to the shared result.
        sig: TypeId,
        /// `(member type, morph signature)` in union member order.
        members: Vec<(TypeId, TypeId)>,
    },
}

/// Fully resolved view of one definition, consumed by the emitter.
pub struct Resolution<'a> {
    store: &'a TypeStore<'a>,
    types: HashMap<*const Expr<'a>, TypeId>,
    conversions: HashMap<*const Expr<'a>, Vec<(TypeId, TypeId)>>,
    selections: HashMap<*const Expr<'a>, Selection>,
    records: HashMap<*const Expr<'a>, BindingRecord>,
}

impl<'a> Resolution<'a> {
    /// Final type of `expr`, which must be free of placeholders.
    pub fn type_of(&self, expr: &Expr<'a>) -> Result<TypeId, InternalError> {
        let ty = self
            .types
            .get(&expr.as_ptr())
            .copied()
            .ok_or_else(|| InternalError::UntrackedExpr {
                span: expr.span.clone(),
            })?;
        if !self.store.is_concrete(ty) {
            return Err(InternalError::UnresolvedType {
                span: expr.span.clone(),
                ty: self.store.descriptor(ty).to_string(),
            });
        }
        Ok(ty)
    }

    /// Conversions to apply to the value of `expr`, innermost first.
    pub fn conversions_of(&self, expr: &Expr<'a>) -> &[(TypeId, TypeId)] {
        self.conversions
            .get(&expr.as_ptr())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selection(&self, expr: &Expr<'a>) -> Option<&Selection> {
        self.selections.get(&expr.as_ptr())
    }

    pub fn record(&self, expr: &Expr<'a>) -> Result<&BindingRecord, InternalError> {
        self.records
            .get(&expr.as_ptr())
            .ok_or_else(|| InternalError::UntrackedExpr {
                span: expr.span.clone(),
            })
    }
}

/// Resolves every constraint of `session` in generation order.
///
/// Property and polymorphic-reference constraints that cannot be decided yet
/// are parked and retried after each later constraint. The first
/// irresolvable constraint aborts resolution.
pub fn resolve<'a>(session: Session<'a>, polys: &PolyRegistry<'a>) -> Result<Resolution<'a>, Error> {
    let store = session.store;
    let mut resolver = Resolver {
        unifier: Unifier::new(store),
        session: &session,
        polys,
        marks: Vec::new(),
        selections: HashMap::new(),
        parked: Vec::new(),
    };

    for (index, con) in session.constraints.iter().enumerate() {
        trace!(index, span = %con.expr().span, "resolving constraint");
        match con {
            Constraint::Rel(c) => resolver.rel(c)?,
            Constraint::Prop(_) | Constraint::Poly(_) => {
                if !resolver.decide(con)? {
                    resolver.parked.push(con.clone());
                }
            }
        }
        resolver.retry_parked()?;
    }

    resolver.unifier.bind_bottom_candidates();
    resolver.retry_parked()?;
    if let Some(con) = resolver.parked.first() {
        return Err(resolver.undecided(con));
    }

    let Resolver {
        unifier,
        marks,
        selections,
        ..
    } = resolver;

    let mut conversions: HashMap<*const Expr<'a>, Vec<(TypeId, TypeId)>> = HashMap::new();
    for (expr, act, exp) in marks {
        let origin = unifier.substitute(act);
        let destination = unifier.substitute(exp);
        if needs_conversion(store, origin, destination) {
            conversions
                .entry(expr.as_ptr())
                .or_default()
                .push((origin, destination));
        }
    }

    let Session {
        expr_types,
        records,
        ..
    } = session;
    let types = expr_types
        .into_iter()
        .map(|(expr, ty)| (expr, unifier.substitute(ty)))
        .collect();

    Ok(Resolution {
        store,
        types,
        conversions,
        selections,
        records,
    })
}

struct Resolver<'r, 'a> {
    unifier: Unifier<'a>,
    session: &'r Session<'a>,
    polys: &'r PolyRegistry<'a>,
    // Subtype verdicts: (actual expression, actual type, expected type).
    marks: Vec<(&'a Expr<'a>, TypeId, TypeId)>,
    selections: HashMap<*const Expr<'a>, Selection>,
    parked: Vec<Constraint<'a>>,
}

impl<'r, 'a> Resolver<'r, 'a> {
    fn store(&self) -> &'a TypeStore<'a> {
        self.unifier.store()
    }

    fn describe(&self, ty: TypeId) -> String {
        self.store()
            .descriptor(self.unifier.substitute(ty))
            .to_string()
    }

    fn rel(&mut self, c: &RelCon<'a>) -> Result<(), Error> {
        let store = self.store();
        let act = self.unifier.resolve(c.act);
        let exp = self.unifier.resolve(c.exp);
        for (side, other) in [(act, exp), (exp, act)] {
            let TypeKind::Prop { accessor, .. } = *store.kind(side) else {
                continue;
            };
            if !store.kind(other).is_free() {
                return Err(TypeError::new(
                    TypeErrorKind::UndeterminedProperty {
                        accessor: accessor.to_string(),
                    },
                    c.act_expr.span.clone(),
                    c.desc,
                )
                .into());
            }
        }

        match self.unifier.compare(c.act, c.exp) {
            Verdict::Exact | Verdict::FreeBound => Ok(()),
            Verdict::Subtype => {
                self.marks.push((c.act_expr, c.act, c.exp));
                Ok(())
            }
            Verdict::Incompatible(incompatibility) => Err(self.rel_error(c, incompatibility)),
        }
    }

    fn rel_error(&self, c: &RelCon<'a>, incompatibility: Incompatibility) -> Error {
        if let Some(cond) = c.branch_of {
            let branches = self
                .session
                .branches
                .get(&cond.as_ptr())
                .map(|tys| tys.iter().map(|&t| self.describe(t)).collect())
                .unwrap_or_default();
            return TypeError::new(
                TypeErrorKind::InconsistentBranches { branches },
                cond.span.clone(),
                "conditional",
            )
            .into();
        }
        let mut err = TypeError::new(
            TypeErrorKind::Incompatible {
                incompatibility,
                actual: self.describe(c.act),
                expected: self.describe(c.exp),
            },
            c.act_expr.span.clone(),
            c.desc,
        );
        if let Some(exp_expr) = c.exp_expr {
            err = err.with_context(Context::ExpectedHere {
                what: c.desc.to_string(),
                span: exp_expr.span.clone(),
            });
        }
        err.into()
    }

    /// Returns false when the constraint cannot be decided yet.
    fn decide(&mut self, con: &Constraint<'a>) -> Result<bool, Error> {
        match con {
            Constraint::Rel(c) => self.rel(c).map(|()| true),
            Constraint::Prop(c) => self.prop(c),
            Constraint::Poly(c) => self.poly(c),
        }
    }

    fn retry_parked(&mut self) -> Result<(), Error> {
        loop {
            let parked = core::mem::take(&mut self.parked);
            let before = parked.len();
            for con in parked {
                if !self.decide(&con)? {
                    self.parked.push(con);
                }
            }
            if self.parked.is_empty() || self.parked.len() == before {
                return Ok(());
            }
        }
    }

    fn prop(&mut self, c: &PropCon<'a>) -> Result<bool, Error> {
        let store = self.store();
        let base = self.unifier.resolve(c.base);
        match store.kind(base) {
            TypeKind::Free(_) | TypeKind::Prop { .. } => Ok(false),
            TypeKind::Struct { .. } => match field_type(store, base, c.accessor) {
                Some(_) => Ok(true),
                None => Err(TypeError::new(
                    TypeErrorKind::NoSuchField {
                        accessor: c.accessor.to_string(),
                        ty: self.describe(base),
                    },
                    c.expr.span.clone(),
                    "field access",
                )
                .into()),
            },
            _ => Err(TypeError::new(
                TypeErrorKind::PropertyOfNonStruct {
                    accessor: c.accessor.to_string(),
                    ty: self.describe(base),
                },
                c.expr.span.clone(),
                "field access",
            )
            .into()),
        }
    }

    fn poly(&mut self, c: &PolyCon<'a>) -> Result<bool, Error> {
        let store = self.store();
        let family = self.polys.family(c.family);
        let no_match = |domain: String| -> Error {
            TypeError::new(
                TypeErrorKind::NoMatchingMorph {
                    family: family.name.clone(),
                    domain,
                },
                c.expr.span.clone(),
                "polymorphic reference",
            )
            .into()
        };

        let reference = self.unifier.resolve(c.free);
        let dom = match *store.kind(reference) {
            TypeKind::Free(_) => return Ok(false),
            TypeKind::Sig { dom, .. } => self.unifier.substitute(dom),
            _ => return Err(no_match(self.describe(reference))),
        };
        if !store.is_concrete(dom) {
            return Ok(false);
        }

        let (selection, chosen) = if let Some(i) = family.morph_for_domain(dom) {
            let sig = family.morphs[i].sig;
            (Selection::Morph { family: c.family, sig }, sig)
        } else if let Some(members) = store.kind(dom).as_union() {
            let mut routes = Vec::with_capacity(members.len());
            let mut results: Vec<TypeId> = Vec::new();
            for &member in members {
                let Some(i) = family.morph_for_domain(member) else {
                    return Err(no_match(store.descriptor(dom).to_string()));
                };
                let morph = &family.morphs[i];
                routes.push((member, morph.sig));
                if !results.contains(&morph.ret) {
                    results.push(morph.ret);
                }
            }
            let &[ret] = results.as_slice() else {
                return Err(TypeError::new(
                    TypeErrorKind::DispatchResultsDiffer {
                        family: family.name.clone(),
                        results: results
                            .iter()
                            .map(|&t| store.descriptor(t).to_string())
                            .collect(),
                    },
                    c.expr.span.clone(),
                    "polymorphic reference",
                )
                .into());
            };
            let sig = store.sig(dom, ret);
            (
                Selection::Dispatch {
                    family: c.family,
                    sig,
                    members: routes,
                },
                sig,
            )
        } else {
            return Err(no_match(store.descriptor(dom).to_string()));
        };

        match self.unifier.compare(chosen, c.free) {
            Verdict::Exact | Verdict::FreeBound => {}
            Verdict::Subtype => self.marks.push((c.expr, chosen, c.free)),
            Verdict::Incompatible(incompatibility) => {
                return Err(TypeError::new(
                    TypeErrorKind::Incompatible {
                        incompatibility,
                        actual: store.descriptor(chosen).to_string(),
                        expected: self.describe(c.free),
                    },
                    c.expr.span.clone(),
                    "polymorphic reference",
                )
                .into());
            }
        }
        self.selections.insert(c.expr.as_ptr(), selection);
        Ok(true)
    }

    fn undecided(&self, con: &Constraint<'a>) -> Error {
        match con {
            Constraint::Prop(c) => TypeError::new(
                TypeErrorKind::UndeterminedProperty {
                    accessor: c.accessor.to_string(),
                },
                c.expr.span.clone(),
                "field access",
            )
            .into(),
            Constraint::Poly(c) => TypeError::new(
                TypeErrorKind::AmbiguousPolyReference {
                    family: self.polys.family(c.family).name.clone(),
                },
                c.expr.span.clone(),
                "polymorphic reference",
            )
            .into(),
            Constraint::Rel(_) => InternalError::unreachable("relational constraint parked").into(),
        }
    }
}
