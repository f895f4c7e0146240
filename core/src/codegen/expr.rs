use super::constructor::{constructor_ref, field_name};
use super::conversion::conversion_ref;
use super::emitter::{Emitter, js_string, pad};
use super::poly::{dispatch_ref, morph_ref};
use crate::check::{Resolution, Selection};
use crate::context::GlobalCtx;
use crate::errors::{Error, InternalError};
use crate::infer::{Element, classify};
use crate::scope::RecordKind;
use crate::syntax::{Body, Expr, ExprKind};

/// Emits the target text of resolved expressions.
pub struct ExprEmitter<'c, 'a> {
    ctx: &'c mut GlobalCtx<'a>,
    typed: &'c Resolution<'a>,
}

impl<'c, 'a> ExprEmitter<'c, 'a> {
    pub fn new(ctx: &'c mut GlobalCtx<'a>, typed: &'c Resolution<'a>) -> Self {
        Self { ctx, typed }
    }

    /// Emits `expr` as an expression, wrapped in its pending conversions.
    ///
    /// `indent` is the level of the line the text starts on; nested bodies
    /// are indented one level deeper.
    pub fn compile(&mut self, expr: &'a Expr<'a>, indent: usize) -> Result<String, Error> {
        let mut text = self.compile_bare(expr, indent)?;
        for &(origin, destination) in self.typed.conversions_of(expr) {
            let name = conversion_ref(self.ctx, origin, destination)?;
            text = format!("{}({})", name, text);
        }
        Ok(text)
    }

    /// Emits the lines of a body at `indent`; the trailing expression is
    /// returned when `returns` is set.
    pub fn body(&mut self, body: &'a Body<'a>, returns: bool, indent: usize) -> Result<String, Error> {
        let mut em = Emitter::new();
        for &stmt in body.stmts {
            match &stmt.kind {
                ExprKind::Bind { val, .. } => {
                    let host_name = self.typed.record(stmt)?.host_name.clone();
                    let val = self.compile(val, indent)?;
                    em.line(indent, format!("const {} = {};", host_name, val));
                }
                _ => {
                    let text = self.compile(stmt, indent)?;
                    em.line(indent, format!("{};", text));
                }
            }
        }
        let tail = self.compile(body.expr, indent)?;
        if returns {
            em.line(indent, format!("return {};", tail));
        } else {
            em.line(indent, format!("{};", tail));
        }
        Ok(em.into_block())
    }

    /// Like [`body`](Self::body), for bodies whose value is used: a unit
    /// body still evaluates to `null`.
    fn value_body(&mut self, body: &'a Body<'a>, returns: bool, indent: usize) -> Result<String, Error> {
        let mut lines = self.body(body, returns, indent)?;
        if !returns {
            lines.push('\n');
            lines.push_str(&pad(indent));
            lines.push_str("return null;");
        }
        Ok(lines)
    }

    fn compile_bare(&mut self, expr: &'a Expr<'a>, indent: usize) -> Result<String, Error> {
        let store = self.ctx.store;
        match &expr.kind {
            ExprKind::LitNum(n) if *n < 0 => Ok(format!("({})", n)),
            ExprKind::LitNum(n) => Ok(n.to_string()),
            ExprKind::LitStr(s) => Ok(js_string(s)),
            ExprKind::Paren(items) => match items {
                [] => Ok("null".to_string()),
                [single] if matches!(classify(single), Element::Positional(_)) => {
                    Ok(format!("({})", self.compile(single, indent)?))
                }
                _ => self.compile_struct(expr, items, indent),
            },
            ExprKind::Tag(tag) => {
                let class = constructor_ref(self.ctx, self.typed.type_of(expr)?)?;
                Ok(format!("(new {}({}, null))", class, js_string(tag.name)))
            }
            ExprKind::And(terms) => self.compile_logical(terms, " && ", "true", indent),
            ExprKind::Or(terms) => self.compile_logical(terms, " || ", "false", indent),
            ExprKind::Call { callee, arg } => {
                let callee = self.compile(callee, indent)?;
                let arg = self.compile(arg, indent)?;
                Ok(format!("{}({})", callee, arg))
            }
            ExprKind::If { cases, dflt } => {
                let mut text = String::from("(");
                for case in cases.iter() {
                    let cond = self.compile(case.cond, indent)?;
                    let cons = self.compile(case.cons, indent)?;
                    text.push_str(&format!("{} ? {} : ", cond, cons));
                }
                match dflt {
                    Some(dflt) => text.push_str(&self.compile(dflt, indent)?),
                    None => text.push_str("undefined"),
                }
                text.push(')');
                Ok(text)
            }
            ExprKind::Acc { accessor, accessee } => {
                let base = self.compile(accessee, indent)?;
                Ok(format!("{}.{}", wrap(base), field_name(*accessor)))
            }
            ExprKind::Ann { expr: inner, .. } => self.compile(inner, indent),
            ExprKind::Do(body) => {
                let returns = self.typed.type_of(body.expr)? != store.void();
                let lines = self.value_body(body, returns, indent + 1)?;
                Ok(format!("(() => {{\n{}\n{}}})()", lines, pad(indent)))
            }
            ExprKind::Fn { body, .. } => {
                let sig = self.typed.type_of(expr)?;
                let returns = store
                    .kind(sig)
                    .as_sig()
                    .is_some_and(|(_, ret)| ret != store.void());
                let lines = self.value_body(body, returns, indent + 1)?;
                Ok(format!("(function self($) {{\n{}\n{}}})", lines, pad(indent)))
            }
            ExprKind::HostVal { code, .. } => Ok(format!("({})", code)),
            ExprKind::Sym(_) | ExprKind::Path(_) => self.compile_reference(expr),
            ExprKind::TagTest { tag, expr: inner } => {
                let tested = self.compile(inner, indent)?;
                Ok(format!("({} === ({}).$v)", js_string(tag.name), tested))
            }
            ExprKind::Bind { .. }
            | ExprKind::Sig { .. }
            | ExprKind::Union(_)
            | ExprKind::TypeVar(_) => Err(InternalError::unreachable(format!(
                "{} at {} in value position",
                expr.kind.form_name(),
                expr.span
            ))
            .into()),
        }
    }

    fn compile_logical(
        &mut self,
        terms: &'a [&'a Expr<'a>],
        op: &str,
        empty: &str,
        indent: usize,
    ) -> Result<String, Error> {
        if terms.is_empty() {
            return Ok(empty.to_string());
        }
        let mut parts = Vec::with_capacity(terms.len());
        for &term in terms {
            parts.push(self.compile(term, indent)?);
        }
        Ok(format!("({})", parts.join(op)))
    }

    fn compile_struct(
        &mut self,
        expr: &'a Expr<'a>,
        items: &'a [&'a Expr<'a>],
        indent: usize,
    ) -> Result<String, Error> {
        let class = constructor_ref(self.ctx, self.typed.type_of(expr)?)?;
        let mut args = Vec::with_capacity(items.len() + 1);
        for &item in items {
            match classify(item) {
                Element::Positional(val) | Element::Labeled(_, val) => {
                    args.push(self.compile(val, indent)?);
                }
                Element::Variant(tag, payload) => {
                    args.push(js_string(tag.name));
                    args.push(match payload {
                        Some(val) => self.compile(val, indent)?,
                        None => "null".to_string(),
                    });
                }
            }
        }
        Ok(format!("(new {}({}))", class, args.join(", ")))
    }

    fn compile_reference(&mut self, expr: &'a Expr<'a>) -> Result<String, Error> {
        let record = self.typed.record(expr)?;
        match record.kind {
            RecordKind::Val(_) => Ok(record.host_name.clone()),
            RecordKind::Lazy(_) => Ok(format!("{}__acc()", record.host_name)),
            RecordKind::Poly(_) => match self.typed.selection(expr) {
                Some(Selection::Morph { family, sig }) => morph_ref(self.ctx, *family, *sig),
                Some(Selection::Dispatch {
                    family,
                    sig,
                    members,
                }) => dispatch_ref(self.ctx, *family, *sig, members),
                None => Err(InternalError::unreachable(format!(
                    "polymorphic reference at {} without a selection",
                    expr.span
                ))
                .into()),
            },
            RecordKind::Fwd => Err(InternalError::ForwardPlaceholderEmitted {
                name: record.host_name.clone(),
            }
            .into()),
            RecordKind::Space(_) | RecordKind::Type(_) => Err(InternalError::unreachable(format!(
                "{} at {} in value position",
                record.kind_name(),
                expr.span
            ))
            .into()),
        }
    }
}

/// Parenthesizes `text` unless it is a plain identifier.
fn wrap(text: String) -> String {
    if text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        text
    } else {
        format!("({})", text)
    }
}
