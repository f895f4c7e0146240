//! Constraint generation: one function per expression form.

use hashbrown::HashMap;

use super::constraint::RelCon;
use super::session::Session;
use super::type_expr::{eval_type, path_name};
use crate::compiler::{lookup, lookup_path};
use crate::context::GlobalCtx;
use crate::errors::{Error, ScopeError, ScopeErrorKind, TypeError, TypeErrorKind};
use crate::scope::{BindingRecord, RecordKind, ScopeId, ScopeKind};
use crate::syntax::{Accessor, Body, Case, Expr, ExprKind, Place, Span, Sym};
use crate::types::TypeId;

/// Walks expressions, typing every node and queueing constraints in the
/// session.
pub struct Generator<'c, 'a> {
    ctx: &'c mut GlobalCtx<'a>,
    session: &'c mut Session<'a>,
}

impl<'c, 'a> Generator<'c, 'a> {
    pub fn new(ctx: &'c mut GlobalCtx<'a>, session: &'c mut Session<'a>) -> Self {
        Self { ctx, session }
    }

    /// Types `expr` and records the result on the node.
    pub fn expr(&mut self, scope: ScopeId, expr: &'a Expr<'a>) -> Result<TypeId, Error> {
        let ty = match &expr.kind {
            ExprKind::LitNum(_) => self.ctx.store.int(),
            ExprKind::LitStr(_) => self.ctx.store.str(),
            ExprKind::Paren(items) => self.gen_paren(scope, items)?,
            ExprKind::And(terms) | ExprKind::Or(terms) => self.gen_logical(scope, terms)?,
            ExprKind::Call { callee, arg } => self.gen_call(scope, callee, arg)?,
            ExprKind::If { cases, dflt } => self.gen_if(scope, expr, cases, *dflt)?,
            ExprKind::Acc { accessor, accessee } => self.gen_acc(scope, expr, *accessor, accessee)?,
            ExprKind::Ann { expr: inner, ty } => self.gen_ann(scope, inner, ty)?,
            ExprKind::Do(body) => {
                let local = self.ctx.scopes.child(scope, ScopeKind::Local);
                self.body(local, body)?
            }
            ExprKind::Fn { sig, body } => self.gen_fn(scope, sig, body)?,
            ExprKind::HostVal { ty, .. } => {
                let declared = eval_type(self.ctx, scope, ty)?;
                self.session.instantiate(declared)
            }
            ExprKind::Sym(sym) => {
                let record = lookup(self.ctx, scope, sym)?;
                self.gen_reference(expr, sym.name, record)?
            }
            ExprKind::Path(syms) => {
                let record = lookup_path(self.ctx, scope, syms)?;
                self.gen_reference(expr, &path_name(syms), record)?
            }
            ExprKind::Tag(tag) => self.tag_type(tag, self.ctx.store.void()),
            ExprKind::TagTest { tag, expr: inner } => self.gen_tag_test(scope, tag, inner)?,
            ExprKind::Bind { place, .. } => {
                let form = if place.is_tag { "tagged binding" } else { "binding" };
                return Err(not_a_value(form, expr));
            }
            ExprKind::Sig { .. } | ExprKind::Union(_) | ExprKind::TypeVar(_) => {
                return Err(not_a_value(expr.kind.form_name(), expr));
            }
        };
        self.session.track(expr, ty)?;
        Ok(ty)
    }

    /// Types a statement sequence; the trailing expression gives the type.
    pub fn body(&mut self, scope: ScopeId, body: &'a Body<'a>) -> Result<TypeId, Error> {
        for &stmt in body.stmts {
            self.stmt(scope, stmt)?;
        }
        self.expr(scope, body.expr)
    }

    fn stmt(&mut self, scope: ScopeId, stmt: &'a Expr<'a>) -> Result<(), Error> {
        match &stmt.kind {
            ExprKind::Bind { place, val } if !place.is_tag => {
                self.gen_bind(scope, stmt, place, val)?;
                self.session.track(stmt, self.ctx.store.void())?;
            }
            _ => {
                let ty = self.expr(scope, stmt)?;
                let void = self.ctx.store.void();
                self.rel(stmt, ty, void, None, "statement");
            }
        }
        Ok(())
    }

    fn rel(
        &mut self,
        act_expr: &'a Expr<'a>,
        act: TypeId,
        exp: TypeId,
        exp_expr: Option<&'a Expr<'a>>,
        desc: &'static str,
    ) {
        self.session.constraints.add_rel(RelCon {
            act_expr,
            act,
            exp,
            exp_expr,
            desc,
            branch_of: None,
        });
    }

    fn gen_logical(&mut self, scope: ScopeId, terms: &'a [&'a Expr<'a>]) -> Result<TypeId, Error> {
        let bool_ty = self.ctx.store.bool();
        for &term in terms {
            let ty = self.expr(scope, term)?;
            self.rel(term, ty, bool_ty, None, "logical operand");
        }
        Ok(bool_ty)
    }

    fn gen_call(
        &mut self,
        scope: ScopeId,
        callee: &'a Expr<'a>,
        arg: &'a Expr<'a>,
    ) -> Result<TypeId, Error> {
        let callee_ty = self.expr(scope, callee)?;
        let arg_ty = self.expr(scope, arg)?;
        let dom = self.session.fresh_free();
        let ret = self.session.fresh_free();
        let sig = self.ctx.store.sig(dom, ret);
        self.rel(callee, callee_ty, sig, None, "callee");
        self.rel(arg, arg_ty, dom, None, "call argument");
        Ok(ret)
    }

    fn gen_bind(
        &mut self,
        scope: ScopeId,
        stmt: &'a Expr<'a>,
        place: &'a Place<'a>,
        val: &'a Expr<'a>,
    ) -> Result<(), Error> {
        let name = place.sym.name;
        let host_name = self.ctx.local_name(name);
        let span = place.sym.span.clone();
        self.ctx.scopes.add_record(
            scope,
            name,
            BindingRecord::new(host_name.clone(), RecordKind::Fwd, span.clone()),
        )?;

        let ty = match place.ann {
            Some(ann) => {
                let declared = eval_type(self.ctx, scope, ann)?;
                // Annotated functions may call themselves.
                if matches!(val.kind, ExprKind::Fn { .. }) {
                    self.install_local(scope, name, &host_name, declared, &span);
                }
                let actual = self.expr(scope, val)?;
                self.rel(val, actual, declared, Some(ann), "binding");
                declared
            }
            None => self.expr(scope, val)?,
        };
        let record = self.install_local(scope, name, &host_name, ty, &span);
        self.session.record(stmt, record);
        Ok(())
    }

    fn install_local(
        &mut self,
        scope: ScopeId,
        name: &'a str,
        host_name: &str,
        ty: TypeId,
        span: &Span,
    ) -> BindingRecord {
        let record = BindingRecord::new(host_name, RecordKind::Val(ty), span.clone());
        self.ctx.scopes.replace_record(scope, name, record.clone());
        record
    }

    fn gen_if(
        &mut self,
        scope: ScopeId,
        expr: &'a Expr<'a>,
        cases: &'a [Case<'a>],
        dflt: Option<&'a Expr<'a>>,
    ) -> Result<TypeId, Error> {
        let store = self.ctx.store;
        let bool_ty = store.bool();
        let Some(dflt) = dflt else {
            // Without a default the conditional is a statement: every branch is unit.
            let void = store.void();
            let mut branches = Vec::with_capacity(cases.len());
            for case in cases {
                let cond = self.expr(scope, case.cond)?;
                self.rel(case.cond, cond, bool_ty, None, "condition");
                let cons = self.expr(scope, case.cons)?;
                branches.push(cons);
                self.session.constraints.add_rel(RelCon {
                    act_expr: case.cons,
                    act: cons,
                    exp: void,
                    exp_expr: None,
                    desc: "conditional branch",
                    branch_of: Some(expr),
                });
            }
            self.session.branches.insert(expr.as_ptr(), branches);
            return Ok(void);
        };

        let result = self.session.fresh_free();
        for case in cases {
            let cond = self.expr(scope, case.cond)?;
            self.rel(case.cond, cond, bool_ty, None, "condition");
            let cons = self.expr(scope, case.cons)?;
            self.rel(case.cons, cons, result, None, "conditional branch");
        }
        let dflt_ty = self.expr(scope, dflt)?;
        self.rel(dflt, dflt_ty, result, None, "conditional default");
        Ok(result)
    }

    fn gen_acc(
        &mut self,
        scope: ScopeId,
        expr: &'a Expr<'a>,
        accessor: Accessor<'a>,
        accessee: &'a Expr<'a>,
    ) -> Result<TypeId, Error> {
        let base = self.expr(scope, accessee)?;
        self.session.constraints.add_prop(expr, accessor, base);
        Ok(self.ctx.store.prop(accessor, base))
    }

    fn gen_ann(
        &mut self,
        scope: ScopeId,
        inner: &'a Expr<'a>,
        ty: &'a Expr<'a>,
    ) -> Result<TypeId, Error> {
        let declared = eval_type(self.ctx, scope, ty)?;
        let actual = self.expr(scope, inner)?;
        self.rel(inner, actual, declared, Some(ty), "annotated expression");
        Ok(declared)
    }

    fn gen_fn(
        &mut self,
        scope: ScopeId,
        sig: &'a Expr<'a>,
        body: &'a Body<'a>,
    ) -> Result<TypeId, Error> {
        let store = self.ctx.store;
        let sig_ty = eval_type(self.ctx, scope, sig)?;
        let Some((dom, ret)) = store.kind(sig_ty).as_sig() else {
            return Err(TypeError::new(
                TypeErrorKind::NotASignature {
                    ty: store.descriptor(sig_ty).to_string(),
                },
                sig.span.clone(),
                "function signature",
            )
            .into());
        };

        let fn_scope = self.ctx.scopes.child(scope, ScopeKind::Fn);
        for (name, ty) in [("$", dom), ("self", sig_ty)] {
            self.ctx.scopes.add_record(
                fn_scope,
                name,
                BindingRecord::new(name, RecordKind::Val(ty), sig.span.clone()),
            )?;
        }
        let body_ty = self.body(fn_scope, body)?;
        self.rel(body.expr, body_ty, ret, Some(sig), "function result");
        Ok(sig_ty)
    }

    fn gen_reference(
        &mut self,
        expr: &'a Expr<'a>,
        name: &str,
        record: BindingRecord,
    ) -> Result<TypeId, Error> {
        let ty = match record.kind {
            RecordKind::Val(ty) | RecordKind::Lazy(ty) => self.session.instantiate(ty),
            RecordKind::Poly(family) => {
                let free = self.session.fresh_free();
                let poly = self.ctx.polys.family(family).poly_type(self.ctx.store);
                self.session.constraints.add_poly(expr, family, poly, free);
                free
            }
            RecordKind::Fwd => {
                return Err(ScopeError::new(
                    ScopeErrorKind::ForwardReference {
                        name: name.to_string(),
                    },
                    expr.span.clone(),
                )
                .into());
            }
            RecordKind::Space(_) | RecordKind::Type(_) => {
                return Err(ScopeError::new(
                    ScopeErrorKind::ExpectedValue {
                        name: name.to_string(),
                        found: record.kind_name(),
                    },
                    expr.span.clone(),
                )
                .into());
            }
        };
        self.session.record(expr, record);
        Ok(ty)
    }

    fn tag_type(&self, tag: &Sym<'a>, payload: TypeId) -> TypeId {
        self.ctx.store.struct_type(&[], &[], &[(tag.name, payload)])
    }

    fn gen_tag_test(
        &mut self,
        scope: ScopeId,
        tag: &'a Sym<'a>,
        inner: &'a Expr<'a>,
    ) -> Result<TypeId, Error> {
        let actual = self.expr(scope, inner)?;
        let payload = self.session.fresh_free();
        let member = self.ctx.store.variant_member(tag.name, payload);
        self.rel(inner, actual, member, None, "tag test");
        Ok(self.ctx.store.bool())
    }

    fn gen_paren(&mut self, scope: ScopeId, items: &'a [&'a Expr<'a>]) -> Result<TypeId, Error> {
        match items {
            [] => Ok(self.ctx.store.void()),
            [single] if matches!(classify(single), Element::Positional(_)) => {
                self.expr(scope, single)
            }
            _ => self.gen_struct(scope, items),
        }
    }

    fn gen_struct(&mut self, scope: ScopeId, items: &'a [&'a Expr<'a>]) -> Result<TypeId, Error> {
        let mut pos = Vec::new();
        let mut labs: Vec<(&'a str, TypeId)> = Vec::new();
        let mut variant: Option<(&'a Sym<'a>, TypeId)> = None;
        let mut lab_sites: HashMap<&'a str, Span> = HashMap::new();

        for &item in items {
            if let Some((tag, _)) = variant {
                let kind = match classify(item) {
                    Element::Variant(..) => TypeErrorKind::StructMultipleTags {
                        first: tag.span.clone(),
                    },
                    _ => TypeErrorKind::StructTagNotLast {
                        tag: tag.name.to_string(),
                    },
                };
                return Err(TypeError::new(kind, item.span.clone(), "struct literal").into());
            }
            match classify(item) {
                Element::Positional(val) => {
                    if !labs.is_empty() {
                        return Err(TypeError::new(
                            TypeErrorKind::StructPositionalAfterLabeled,
                            item.span.clone(),
                            "struct literal",
                        )
                        .into());
                    }
                    pos.push(self.expr(scope, val)?);
                }
                Element::Labeled(place, val) => {
                    let label = &place.sym;
                    if let Some(first) = lab_sites.get(label.name) {
                        return Err(TypeError::new(
                            TypeErrorKind::StructRepeatedLabel {
                                label: label.name.to_string(),
                                first: first.clone(),
                            },
                            label.span.clone(),
                            "struct literal",
                        )
                        .into());
                    }
                    lab_sites.insert(label.name, label.span.clone());
                    let ty = match place.ann {
                        Some(ann) => self.gen_ann(scope, val, ann)?,
                        None => self.expr(scope, val)?,
                    };
                    labs.push((label.name, ty));
                }
                Element::Variant(tag, payload) => {
                    let ty = match payload {
                        Some(val) => self.expr(scope, val)?,
                        None => self.ctx.store.void(),
                    };
                    variant = Some((tag, ty));
                }
            }
        }

        let variants: Vec<(&str, TypeId)> = variant
            .map(|(tag, ty)| (tag.name, ty))
            .into_iter()
            .collect();
        Ok(self.ctx.store.struct_type(&pos, &labs, &variants))
    }
}

/// Role of one element of a struct literal.
pub(crate) enum Element<'a> {
    Positional(&'a Expr<'a>),
    Labeled(&'a Place<'a>, &'a Expr<'a>),
    Variant(&'a Sym<'a>, Option<&'a Expr<'a>>),
}

pub(crate) fn classify<'a>(item: &'a Expr<'a>) -> Element<'a> {
    match &item.kind {
        ExprKind::Bind { place, val } if place.is_tag => Element::Variant(&place.sym, Some(*val)),
        ExprKind::Bind { place, val } => Element::Labeled(place, *val),
        ExprKind::Tag(tag) => Element::Variant(tag, None),
        _ => Element::Positional(item),
    }
}

fn not_a_value(form: &'static str, expr: &Expr<'_>) -> Error {
    TypeError::new(TypeErrorKind::NotAValue { form }, expr.span.clone(), "value expression").into()
}
