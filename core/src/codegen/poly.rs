//! Emission of morphs and dispatch trampolines.

use tracing::debug;

use super::emitter::{Emitter, js_string};
use super::expr::ExprEmitter;
use crate::context::GlobalCtx;
use crate::errors::{Error, InternalError};
use crate::poly::{EmissionStatus, FamilyId};
use crate::types::TypeId;

/// Reference to the morph of `family` with signature `sig`, emitting it if
/// needed.
///
/// Until the morph's constant is in the output the reference is
/// eta-expanded, so evaluating it never reads the uninitialized constant.
pub fn morph_ref(ctx: &mut GlobalCtx<'_>, family: FamilyId, sig: TypeId) -> Result<String, Error> {
    let (name, emitted) = request_morph(ctx, family, sig)?;
    if emitted {
        Ok(name)
    } else {
        Ok(format!("($ => {}($))", name))
    }
}

/// Mangled name of a morph and whether its definition has been written.
fn request_morph(
    ctx: &mut GlobalCtx<'_>,
    family: FamilyId,
    sig: TypeId,
) -> Result<(String, bool), Error> {
    let fam = ctx.polys.family(family);
    let name = fam.member_name(sig);
    let Some(index) = fam.morph_for_sig(sig) else {
        return Err(InternalError::unreachable(format!(
            "`{}` has no morph with signature {}",
            fam.name,
            ctx.store.descriptor(sig)
        ))
        .into());
    };
    emit_morph(ctx, family, index)?;
    let emitted = ctx.polys.family(family).morphs[index].status == EmissionStatus::Emitted;
    Ok((name, emitted))
}

/// Emits a morph at most once.
///
/// A morph referenced while it is being emitted (recursion) only yields its
/// name. A morph referenced before its body is typed is marked as wanted
/// and emitted as soon as typing completes.
pub fn emit_morph(ctx: &mut GlobalCtx<'_>, family: FamilyId, index: usize) -> Result<(), Error> {
    let fam = ctx.polys.family_mut(family);
    let family_name = fam.name.clone();
    let morph = &mut fam.morphs[index];
    if morph.status != EmissionStatus::NotEmitted {
        return Ok(());
    }
    let Some(typed) = morph.typed.clone() else {
        morph.wanted = true;
        return Ok(());
    };
    morph.status = EmissionStatus::InProgress;
    let (val, sig) = (morph.val, morph.sig);
    let name = fam.member_name(sig);
    debug!(
        family = family_name.as_str(),
        sig = ctx.store.descriptor(sig),
        "emitting morph"
    );

    let text = ExprEmitter::new(ctx, &typed).compile(val, 0)?;
    let mut em = Emitter::new();
    if ctx.options.type_comments {
        em.line(0, format!("// {}: {}", family_name, ctx.store.descriptor(sig)));
    }
    em.line(0, format!("const {} = {};", name, text));
    em.flush(&mut ctx.out);
    ctx.polys.family_mut(family).morphs[index].status = EmissionStatus::Emitted;
    Ok(())
}

/// Name of the trampoline routing a union argument to the morph of its
/// runtime member, emitting the table and trampoline if needed.
pub fn dispatch_ref(
    ctx: &mut GlobalCtx<'_>,
    family: FamilyId,
    sig: TypeId,
    members: &[(TypeId, TypeId)],
) -> Result<String, Error> {
    let fam = ctx.polys.family_mut(family);
    let name = fam.member_name(sig);
    let family_name = fam.name.clone();
    if fam.dispatcher_status(sig) != EmissionStatus::NotEmitted {
        return Ok(name);
    }
    fam.set_dispatcher_status(sig, EmissionStatus::InProgress);
    debug!(
        family = family_name.as_str(),
        sig = ctx.store.descriptor(sig),
        entries = members.len(),
        "emitting dispatcher"
    );

    let mut entries = Vec::with_capacity(members.len());
    for &(member, morph_sig) in members {
        let (target, _) = request_morph(ctx, family, morph_sig)?;
        entries.push((js_string(ctx.store.descriptor(member)), target));
    }

    let table = format!("{}__$table", name);
    let mut em = Emitter::new();
    if ctx.options.type_comments {
        em.line(0, format!("// {}: {}", family_name, ctx.store.descriptor(sig)));
    }
    em.line(0, format!("const {} = {{", table));
    for (tag, target) in &entries {
        // Wrapped so entries may name morphs that are still being emitted.
        em.line(1, format!("{}: $ => {}($),", tag, target));
    }
    em.line(0, "};");
    em.line(0, format!("function {}($) {{", name));
    em.line(1, format!("const morph = {}[$.$u];", table));
    em.line(
        1,
        format!(
            "if (morph === undefined) return $dispatch_failed({}, $.$u);",
            js_string(&family_name)
        ),
    );
    em.line(1, "return morph($.$m);");
    em.line(0, "}");
    em.flush(&mut ctx.out);
    ctx.polys
        .family_mut(family)
        .set_dispatcher_status(sig, EmissionStatus::Emitted);
    Ok(name)
}
