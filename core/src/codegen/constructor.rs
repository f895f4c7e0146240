//! One class per struct type, emitted on first use.

use tracing::debug;

use super::emitter::Emitter;
use crate::context::GlobalCtx;
use crate::errors::{Error, InternalError};
use crate::scope::mangle;
use crate::syntax::Accessor;
use crate::types::{TypeId, TypeKind};

/// Target property holding the field selected by `accessor`.
pub fn field_name(accessor: Accessor<'_>) -> String {
    match accessor {
        Accessor::Index(i) => format!("_{}", i),
        Accessor::Name(name) => mangle(name),
    }
}

/// Name of the class constructing values of struct type `ty`.
pub fn constructor_ref(ctx: &mut GlobalCtx<'_>, ty: TypeId) -> Result<String, Error> {
    let name = format!("$C{}", ty.index());
    if !ctx.constructors.insert(ty) {
        return Ok(name);
    }
    let store = ctx.store;
    let TypeKind::Struct {
        pos,
        labs,
        variants,
    } = *store.kind(ty)
    else {
        return Err(InternalError::unreachable(format!(
            "constructor for non-struct type {}",
            store.descriptor(ty)
        ))
        .into());
    };
    debug!(ty = store.descriptor(ty), "emitting constructor");

    let mut params: Vec<String> = (0..pos.len())
        .map(|i| field_name(Accessor::Index(i)))
        .collect();
    params.extend(labs.iter().map(|f| field_name(Accessor::Name(f.label))));
    if !variants.is_empty() {
        params.push("$v".to_string());
        params.push("$m".to_string());
    }

    let mut em = Emitter::new();
    if ctx.options.type_comments {
        em.line(0, format!("// {}", store.descriptor(ty)));
    }
    em.line(0, format!("class {} {{", name));
    em.line(1, format!("constructor({}) {{", params.join(", ")));
    for param in &params {
        em.line(2, format!("this.{} = {};", param, param));
    }
    em.line(1, "}");
    em.line(0, "}");
    em.flush(&mut ctx.out);
    Ok(name)
}
