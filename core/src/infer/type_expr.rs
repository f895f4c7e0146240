//! Evaluation of type expressions.

use hashbrown::HashMap;

use crate::compiler::{lookup, lookup_path};
use crate::context::GlobalCtx;
use crate::errors::{Error, ScopeError, ScopeErrorKind, TypeError, TypeErrorKind};
use crate::scope::{BindingRecord, RecordKind, ScopeId};
use crate::syntax::{Expr, ExprKind, Span, Sym};
use crate::types::TypeId;

/// Evaluates `expr` as a type in `scope`.
pub fn eval_type<'a>(
    ctx: &mut GlobalCtx<'a>,
    scope: ScopeId,
    expr: &'a Expr<'a>,
) -> Result<TypeId, Error> {
    let store = ctx.store;
    match &expr.kind {
        ExprKind::Sym(sym) => {
            let record = lookup(ctx, scope, sym)?;
            expect_type(sym.name, &record, &expr.span)
        }
        ExprKind::Path(syms) => {
            let record = lookup_path(ctx, scope, syms)?;
            expect_type(&path_name(syms), &record, &expr.span)
        }
        ExprKind::Sig { dom, ret } => {
            let dom = eval_type(ctx, scope, dom)?;
            let ret = eval_type(ctx, scope, ret)?;
            Ok(store.sig(dom, ret))
        }
        ExprKind::Union(members) => {
            let mut tys = Vec::with_capacity(members.len());
            for member in members.iter() {
                tys.push(eval_type(ctx, scope, member)?);
            }
            Ok(store.union(&tys))
        }
        ExprKind::TypeVar(sym) => Ok(store.type_var(sym.name)),
        ExprKind::Tag(tag) => Ok(store.struct_type(&[], &[], &[(tag.name, store.void())])),
        ExprKind::Paren(items) => match items {
            [single] if !is_struct_element(single) => eval_type(ctx, scope, single),
            _ => eval_struct_type(ctx, scope, items),
        },
        other => Err(TypeError::new(
            TypeErrorKind::NotAType {
                form: other.form_name(),
            },
            expr.span.clone(),
            "type expression",
        )
        .into()),
    }
}

enum Element<'a> {
    Positional(&'a Expr<'a>),
    Labeled(&'a Sym<'a>, &'a Expr<'a>),
    Variant(&'a Sym<'a>, Option<&'a Expr<'a>>),
}

fn classify<'a>(item: &'a Expr<'a>) -> Element<'a> {
    match &item.kind {
        ExprKind::Tag(tag) => Element::Variant(tag, None),
        ExprKind::Ann { expr, ty } => match &expr.kind {
            ExprKind::Sym(label) => Element::Labeled(label, *ty),
            ExprKind::Tag(tag) => Element::Variant(tag, Some(*ty)),
            _ => Element::Positional(item),
        },
        _ => Element::Positional(item),
    }
}

fn is_struct_element(item: &Expr<'_>) -> bool {
    !matches!(classify(item), Element::Positional(_))
}

fn eval_struct_type<'a>(
    ctx: &mut GlobalCtx<'a>,
    scope: ScopeId,
    items: &'a [&'a Expr<'a>],
) -> Result<TypeId, Error> {
    let mut pos = Vec::new();
    let mut labs: Vec<(&'a str, TypeId)> = Vec::new();
    let mut variants: Vec<(&'a str, TypeId)> = Vec::new();
    let mut lab_sites: HashMap<&'a str, Span> = HashMap::new();
    let mut variant_sites: HashMap<&'a str, Span> = HashMap::new();
    let mut first_variant: Option<&'a str> = None;

    for &item in items {
        match classify(item) {
            Element::Positional(ty) => {
                if let Some(tag) = first_variant {
                    return Err(shape_error(TypeErrorKind::StructTagNotLast { tag: tag.to_string() }, item));
                }
                if !labs.is_empty() {
                    return Err(shape_error(TypeErrorKind::StructPositionalAfterLabeled, item));
                }
                pos.push(eval_type(ctx, scope, ty)?);
            }
            Element::Labeled(label, ty) => {
                if let Some(tag) = first_variant {
                    return Err(shape_error(TypeErrorKind::StructTagNotLast { tag: tag.to_string() }, item));
                }
                check_repeated(&mut lab_sites, label)?;
                labs.push((label.name, eval_type(ctx, scope, ty)?));
            }
            Element::Variant(tag, payload) => {
                check_repeated(&mut variant_sites, tag)?;
                first_variant.get_or_insert(tag.name);
                let payload = match payload {
                    Some(ty) => eval_type(ctx, scope, ty)?,
                    None => ctx.store.void(),
                };
                variants.push((tag.name, payload));
            }
        }
    }
    Ok(ctx.store.struct_type(&pos, &labs, &variants))
}

fn check_repeated<'a>(sites: &mut HashMap<&'a str, Span>, label: &Sym<'a>) -> Result<(), Error> {
    if let Some(first) = sites.get(label.name) {
        return Err(TypeError::new(
            TypeErrorKind::StructRepeatedLabel {
                label: label.name.to_string(),
                first: first.clone(),
            },
            label.span.clone(),
            "struct type",
        )
        .into());
    }
    sites.insert(label.name, label.span.clone());
    Ok(())
}

fn shape_error(kind: TypeErrorKind, item: &Expr<'_>) -> Error {
    TypeError::new(kind, item.span.clone(), "struct type").into()
}

fn expect_type(name: &str, record: &BindingRecord, span: &Span) -> Result<TypeId, Error> {
    match record.kind {
        RecordKind::Type(ty) => Ok(ty),
        _ => Err(ScopeError::new(
            ScopeErrorKind::ExpectedType {
                name: name.to_string(),
                found: record.kind_name(),
            },
            span.clone(),
        )
        .into()),
    }
}

pub(crate) fn path_name(syms: &[Sym<'_>]) -> String {
    syms.iter().map(|s| s.name).collect::<Vec<_>>().join("/")
}
