//! Compilation driver.
//!
//! Definitions are compiled on demand: registering a program only queues
//! its definitions in their spaces, and a definition is generated, resolved
//! and emitted the first time a name lookup reaches it. Unreferenced
//! definitions never appear in the output.

use std::rc::Rc;

use tracing::debug;

use crate::check::resolve;
use crate::codegen::{Emitter, ExprEmitter, RUNTIME, emit_morph};
use crate::context::GlobalCtx;
use crate::diagnostics::context::Context;
use crate::errors::{Error, InternalError, ScopeError, ScopeErrorKind, TypeError, TypeErrorKind};
use crate::infer::{Generator, RelCon, Session, eval_type, path_name};
use crate::options::CompileOptions;
use crate::poly::{EmissionStatus, FamilyId, Morph};
use crate::scope::{BindingRecord, PendingDef, RecordKind, ScopeId, ScopeKind, mangle};
use crate::syntax::{Body, Def, Expr, ExprKind, Place, Program, Span, Sym};
use crate::types::{TypeId, TypeStore};

/// Compiles `program` into the text of a self-running target program.
pub fn compile_program<'a>(
    store: &'a TypeStore<'a>,
    program: &'a Program<'a>,
    options: CompileOptions,
) -> Result<String, Error> {
    let mut ctx = GlobalCtx::new(store, options);
    emit_header(&mut ctx);
    for block in program.ins {
        let space = ctx.scopes.space_path(block.path)?;
        for def in block.defs {
            ctx.scopes.add_pending(space, def)?;
        }
    }
    compile_main(&mut ctx, &program.main)?;
    Ok(ctx.out.into_string())
}

fn emit_header(ctx: &mut GlobalCtx<'_>) {
    let mut em = Emitter::new();
    if ctx.options.shebang {
        em.line(0, "#!/usr/bin/env node");
    }
    em.line(0, "'use strict';");
    em.flush(&mut ctx.out);
    em.line(0, RUNTIME);
    em.flush(&mut ctx.out);
    if !ctx.options.prelude.is_empty() {
        em.line(0, ctx.options.prelude.trim_end());
        em.flush(&mut ctx.out);
    }
}

fn compile_main<'a>(ctx: &mut GlobalCtx<'a>, main: &'a Body<'a>) -> Result<(), Error> {
    debug!("compiling main body");
    let scope = ctx.scopes.child(ScopeId::ROOT, ScopeKind::Local);
    let mut session = Session::new(ctx.store);
    Generator::new(ctx, &mut session).body(scope, main)?;
    let typed = resolve(session, &ctx.polys)?;
    let returns = typed.type_of(main.expr)? != ctx.store.void();
    let lines = ExprEmitter::new(ctx, &typed).body(main, returns, 1)?;

    let main_name = ctx.options.main_name.clone();
    let mut em = Emitter::new();
    em.line(0, format!("const {} = function() {{", main_name));
    em.line(0, lines);
    em.line(0, "};");
    em.flush(&mut ctx.out);
    em.line(0, format!("{}();", main_name));
    em.flush(&mut ctx.out);
    Ok(())
}

/// Resolves `sym` from `scope` outwards, compiling a pending definition if
/// that is what the name denotes.
pub fn lookup<'a>(
    ctx: &mut GlobalCtx<'a>,
    scope: ScopeId,
    sym: &Sym<'a>,
) -> Result<BindingRecord, Error> {
    let mut current = Some(scope);
    while let Some(s) = current {
        if let Some(record) = find_in(ctx, s, sym.name)? {
            return Ok(record);
        }
        current = ctx.scopes.parent(s);
    }
    Err(ScopeError::new(
        ScopeErrorKind::Undefined {
            name: sym.name.to_string(),
        },
        sym.span.clone(),
    )
    .into())
}

/// Resolves `A/B/x`: the head through normal lookup, every later segment
/// inside the space named by the one before it.
pub fn lookup_path<'a>(
    ctx: &mut GlobalCtx<'a>,
    scope: ScopeId,
    syms: &'a [Sym<'a>],
) -> Result<BindingRecord, Error> {
    let [head, rest @ ..] = syms else {
        return Err(InternalError::unreachable("empty path").into());
    };
    let mut record = lookup(ctx, scope, head)?;
    let mut prev = head;
    for (i, seg) in rest.iter().enumerate() {
        let RecordKind::Space(space) = record.kind else {
            return Err(ScopeError::new(
                ScopeErrorKind::ExpectedNamespace {
                    name: prev.name.to_string(),
                    found: record.kind_name(),
                },
                prev.span.clone(),
            )
            .into());
        };
        record = find_in(ctx, space, seg.name)?.ok_or_else(|| {
            ScopeError::new(
                ScopeErrorKind::Undefined {
                    name: path_name(&syms[..i + 2]),
                },
                seg.span.clone(),
            )
        })?;
        prev = seg;
    }
    Ok(record)
}

fn find_in<'a>(
    ctx: &mut GlobalCtx<'a>,
    scope: ScopeId,
    name: &str,
) -> Result<Option<BindingRecord>, Error> {
    if ctx.scopes.has_pending(scope, name) {
        compile_pending(ctx, scope, name)?;
    }
    Ok(ctx.scopes.get_local(scope, name).cloned())
}

/// Compiles the pending definition `name` of `space`, if there is one.
pub fn compile_pending<'a>(
    ctx: &mut GlobalCtx<'a>,
    space: ScopeId,
    name: &str,
) -> Result<(), Error> {
    let Some(pending) = ctx.scopes.take_pending(space, name) else {
        return Ok(());
    };
    match pending {
        PendingDef::Single(def) => {
            compile_def(ctx, space, def).map_err(|err| in_definition(err, def.sym()))
        }
        PendingDef::Family(defs) => {
            let Some(&first) = defs.first() else {
                return Ok(());
            };
            compile_family(ctx, space, first.sym().name, &defs)
                .map_err(|err| in_definition(err, first.sym()))
        }
    }
}

fn compile_def<'a>(ctx: &mut GlobalCtx<'a>, space: ScopeId, def: &'a Def<'a>) -> Result<(), Error> {
    let store = ctx.store;
    match def {
        Def::Bind { place, val } => compile_bind(ctx, space, place, *val),
        Def::HostType { sym } => {
            let path = ctx.scopes.path(space);
            let qualified = if path.is_empty() {
                sym.name.to_string()
            } else {
                format!("{}/{}", path, sym.name)
            };
            let ty = store.host(&qualified);
            debug!(name = sym.name, ty = store.descriptor(ty), "declaring host type");
            ctx.scopes.add_record(
                space,
                sym.name,
                BindingRecord::new("", RecordKind::Type(ty), sym.span.clone()),
            )?;
            Ok(())
        }
        Def::Alias { sym, ty } => {
            ctx.scopes.add_record(
                space,
                sym.name,
                BindingRecord::new("", RecordKind::Fwd, sym.span.clone()),
            )?;
            let ty = eval_type(ctx, space, *ty)?;
            ctx.scopes.replace_record(
                space,
                sym.name,
                BindingRecord::new("", RecordKind::Type(ty), sym.span.clone()),
            );
            Ok(())
        }
        Def::Morph { sym, .. } => Err(InternalError::unreachable(format!(
            "morph `{}` outside a family",
            sym.name
        ))
        .into()),
    }
}

/// Whether a definition must be computed on first access instead of at
/// declaration.
fn needs_lazy(store: &TypeStore<'_>, val: &Expr<'_>, ty: TypeId) -> bool {
    match &val.kind {
        ExprKind::Fn { .. } | ExprKind::HostVal { .. } | ExprKind::LitNum(_) | ExprKind::LitStr(_) => {
            false
        }
        ExprKind::Paren(items) => !items.is_empty(),
        ExprKind::Sym(_) | ExprKind::Path(_) => store.kind(ty).as_sig().is_none(),
        ExprKind::Ann { expr, .. } => needs_lazy(store, expr, ty),
        _ => true,
    }
}

fn value_record(host_name: &str, lazy: bool, ty: TypeId, span: &Span) -> BindingRecord {
    let kind = if lazy {
        RecordKind::Lazy(ty)
    } else {
        RecordKind::Val(ty)
    };
    BindingRecord::new(host_name, kind, span.clone())
}

fn compile_bind<'a>(
    ctx: &mut GlobalCtx<'a>,
    space: ScopeId,
    place: &'a Place<'a>,
    val: &'a Expr<'a>,
) -> Result<(), Error> {
    let store = ctx.store;
    let name = place.sym.name;
    let span = &place.sym.span;
    let host_name = format!("{}{}", ctx.scopes.host_prefix(space), mangle(name));
    debug!(name, host_name = host_name.as_str(), "compiling definition");

    ctx.scopes.add_record(
        space,
        name,
        BindingRecord::new(host_name.as_str(), RecordKind::Fwd, span.clone()),
    )?;
    // Annotated definitions are visible with their declared type while
    // their value is generated, so they may refer to each other.
    let declared = match place.ann {
        Some(ann) => {
            let ty = eval_type(ctx, space, ann)?;
            let lazy = needs_lazy(store, val, ty);
            ctx.scopes
                .replace_record(space, name, value_record(&host_name, lazy, ty, span));
            Some(ty)
        }
        None => None,
    };

    let mut session = Session::new(store);
    let actual = Generator::new(ctx, &mut session).expr(space, val)?;
    if let Some(ty) = declared {
        session.constraints.add_rel(RelCon {
            act_expr: val,
            act: actual,
            exp: ty,
            exp_expr: place.ann,
            desc: "definition",
            branch_of: None,
        });
    }
    let typed = resolve(session, &ctx.polys)?;
    let ty = match (declared, &val.kind) {
        (Some(ty), _) => ty,
        // A generic host value keeps its type variables; every reference
        // instantiates them afresh.
        (None, ExprKind::HostVal { ty, .. }) => eval_type(ctx, space, *ty)?,
        (None, _) => typed.type_of(val)?,
    };
    let lazy = needs_lazy(store, val, ty);
    if declared.is_none() {
        ctx.scopes
            .replace_record(space, name, value_record(&host_name, lazy, ty, span));
    }

    let text = ExprEmitter::new(ctx, &typed).compile(val, usize::from(lazy))?;
    let mut em = Emitter::new();
    if ctx.options.type_comments {
        em.line(0, format!("// {}: {}", name, store.descriptor(ty)));
    }
    if lazy {
        let acc = format!("{}__acc", host_name);
        em.line(0, format!("let {} = function() {{", acc));
        em.line(1, format!("{} = $lazy_sentinel;", acc));
        em.line(1, format!("const $val = {};", text));
        em.line(1, format!("{} = function() {{ return $val; }};", acc));
        em.line(1, "return $val;");
        em.line(0, "};");
    } else {
        em.line(0, format!("const {} = {};", host_name, text));
    }
    em.flush(&mut ctx.out);
    Ok(())
}

/// Registers every morph signature of a family, then types each body.
///
/// Signatures are known before any body is typed, so morphs may refer to
/// their own family.
fn compile_family<'a>(
    ctx: &mut GlobalCtx<'a>,
    space: ScopeId,
    name: &'a str,
    defs: &[&'a Def<'a>],
) -> Result<(), Error> {
    let store = ctx.store;
    let span = defs
        .first()
        .map(|d| d.sym().span.clone())
        .unwrap_or_default();
    let host_name = format!("{}{}", ctx.scopes.host_prefix(space), mangle(name));
    ctx.scopes.add_record(
        space,
        name,
        BindingRecord::new(host_name.as_str(), RecordKind::Fwd, span.clone()),
    )?;

    let family = ctx.polys.add_family(name, host_name.clone(), space);
    for &def in defs {
        let &Def::Morph { ref sym, val } = def else {
            return Err(InternalError::unreachable(format!(
                "non-morph definition in family `{}`",
                name
            ))
            .into());
        };
        let sig = morph_signature(ctx, space, name, val)?;
        let Some((dom, ret)) = store.kind(sig).as_sig() else {
            return Err(InternalError::unreachable("morph signature is not a signature").into());
        };
        ctx.polys.family_mut(family).add_morph(
            store,
            Morph {
                val,
                span: sym.span.clone(),
                sig,
                dom,
                ret,
                status: EmissionStatus::NotEmitted,
                typed: None,
                wanted: false,
            },
        )?;
    }
    ctx.scopes.replace_record(
        space,
        name,
        BindingRecord::new(host_name.as_str(), RecordKind::Poly(family), span),
    );
    debug!(family = name, morphs = defs.len(), "registered polymorphic family");

    let count = ctx.polys.family(family).morphs.len();
    for index in 0..count {
        type_morph(ctx, space, family, index)?;
    }
    Ok(())
}

fn morph_signature<'a>(
    ctx: &mut GlobalCtx<'a>,
    space: ScopeId,
    family: &str,
    val: &'a Expr<'a>,
) -> Result<TypeId, Error> {
    let not_a_function = |ty: String| -> Error {
        TypeError::new(
            TypeErrorKind::MorphNotAFunction {
                family: family.to_string(),
                ty,
            },
            val.span.clone(),
            "morph definition",
        )
        .into()
    };
    let sig_expr = match &val.kind {
        ExprKind::Fn { sig, .. } => *sig,
        ExprKind::HostVal { ty, .. } | ExprKind::Ann { ty, .. } => *ty,
        other => return Err(not_a_function(other.form_name().to_string())),
    };
    let sig = eval_type(ctx, space, sig_expr)?;
    match ctx.store.kind(sig).as_sig() {
        Some(_) => Ok(sig),
        None => Err(not_a_function(ctx.store.descriptor(sig).to_string())),
    }
}

fn type_morph<'a>(
    ctx: &mut GlobalCtx<'a>,
    space: ScopeId,
    family: FamilyId,
    index: usize,
) -> Result<(), Error> {
    let (val, sig) = {
        let morph = &ctx.polys.family(family).morphs[index];
        (morph.val, morph.sig)
    };
    let mut session = Session::new(ctx.store);
    let actual = Generator::new(ctx, &mut session).expr(space, val)?;
    session.constraints.add_rel(RelCon {
        act_expr: val,
        act: actual,
        exp: sig,
        exp_expr: None,
        desc: "morph definition",
        branch_of: None,
    });
    let typed = resolve(session, &ctx.polys)?;

    let morph = &mut ctx.polys.family_mut(family).morphs[index];
    morph.typed = Some(Rc::new(typed));
    if morph.wanted {
        emit_morph(ctx, family, index)?;
    }
    Ok(())
}

/// Attaches the enclosing definition to a type error, innermost first.
fn in_definition(err: Error, sym: &Sym<'_>) -> Error {
    match err {
        Error::Type(e)
            if !e
                .context
                .iter()
                .any(|c| matches!(c, Context::InDefinition { .. })) =>
        {
            Error::Type(e.with_context(Context::InDefinition {
                name: sym.name.to_string(),
                span: sym.span.clone(),
            }))
        }
        other => other,
    }
}
