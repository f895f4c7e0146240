//! Runtime adaptation between compatible but different types.
//!
//! Every `(origin, destination)` pair gets one function, `$c{o}_{d}`,
//! emitted the first time it is requested. Conversions of fields, variant
//! payloads and signature components go through the same table.

use tracing::debug;

use super::constructor::{constructor_ref, field_name};
use super::emitter::{Emitter, js_string};
use crate::check::align_fields;
use crate::context::GlobalCtx;
use crate::errors::{Error, InternalError};
use crate::types::{Field, TypeId, TypeKind, TypeStore};

/// Whether a value of type `origin` must be rebuilt to be used as
/// `destination`.
///
/// Bottom values never materialize, the top type accepts any
/// representation, and a union keeps its tagged form when passed as a wider
/// union.
pub fn needs_conversion(store: &TypeStore<'_>, origin: TypeId, destination: TypeId) -> bool {
    if origin == destination || origin == store.never() || destination == store.any() {
        return false;
    }
    match (*store.kind(origin), *store.kind(destination)) {
        (TypeKind::Union(_), TypeKind::Union(_)) => false,
        (_, TypeKind::Union(_)) | (TypeKind::Union(_), _) => true,
        (
            TypeKind::Struct {
                pos: o_pos,
                labs: o_labs,
                variants: o_vars,
            },
            TypeKind::Struct {
                pos: d_pos,
                labs: d_labs,
                variants: d_vars,
            },
        ) => {
            let same_layout = o_pos.len() == d_pos.len()
                && o_labs.len() == d_labs.len()
                && o_labs.iter().zip(d_labs).all(|(o, d)| o.label == d.label);
            !same_layout
                || align_fields(store, origin, destination)
                    .iter()
                    .any(|f| needs_conversion(store, f.src_ty, f.dst_ty))
                || variant_payloads(o_vars, d_vars)
                    .any(|(_, o, d)| needs_conversion(store, o, d))
        }
        (TypeKind::Sig { dom: od, ret: or }, TypeKind::Sig { dom: dd, ret: dr }) => {
            needs_conversion(store, dd, od) || needs_conversion(store, or, dr)
        }
        _ => false,
    }
}

fn variant_payloads<'v, 'a>(
    origin: &'v [Field<'a>],
    destination: &'v [Field<'a>],
) -> impl Iterator<Item = (&'a str, TypeId, TypeId)> + 'v {
    origin.iter().filter_map(move |o| {
        destination
            .iter()
            .find(|d| d.label == o.label)
            .map(|d| (o.label, o.ty, d.ty))
    })
}

/// Name of the function converting `origin` values to `destination`.
pub fn conversion_ref(
    ctx: &mut GlobalCtx<'_>,
    origin: TypeId,
    destination: TypeId,
) -> Result<String, Error> {
    let name = format!("$c{}_{}", origin.index(), destination.index());
    if !ctx.conversions.insert((origin, destination)) {
        return Ok(name);
    }
    debug!(
        origin = ctx.store.descriptor(origin),
        destination = ctx.store.descriptor(destination),
        "emitting conversion"
    );
    let body = conversion_body(ctx, origin, destination)?;

    let mut em = Emitter::new();
    if ctx.options.type_comments {
        em.line(
            0,
            format!(
                "// {} -> {}",
                ctx.store.descriptor(origin),
                ctx.store.descriptor(destination)
            ),
        );
    }
    em.line(0, format!("function {}($) {{", name));
    em.line(1, format!("return {};", body));
    em.line(0, "}");
    em.flush(&mut ctx.out);
    Ok(name)
}

/// Applies the conversion to `value` when one is needed.
fn convert(
    ctx: &mut GlobalCtx<'_>,
    origin: TypeId,
    destination: TypeId,
    value: String,
) -> Result<String, Error> {
    if needs_conversion(ctx.store, origin, destination) {
        let name = conversion_ref(ctx, origin, destination)?;
        Ok(format!("{}({})", name, value))
    } else {
        Ok(value)
    }
}

fn conversion_body(
    ctx: &mut GlobalCtx<'_>,
    origin: TypeId,
    destination: TypeId,
) -> Result<String, Error> {
    let store = ctx.store;
    match (*store.kind(origin), *store.kind(destination)) {
        (TypeKind::Union(_), TypeKind::Union(_)) => Ok("$".to_string()),
        (_, TypeKind::Union(_)) => Ok(format!(
            "({{ $u: {}, $m: $ }})",
            js_string(store.descriptor(origin))
        )),
        (TypeKind::Union(members), _) => {
            // Members are tagged with their own descriptor; the last one needs no test.
            let mut arms = Vec::with_capacity(members.len());
            for &member in members {
                let value = convert(ctx, member, destination, "$.$m".to_string())?;
                arms.push((js_string(store.descriptor(member)), value));
            }
            let mut text = String::new();
            let last = arms.len().saturating_sub(1);
            for (i, (tag, value)) in arms.into_iter().enumerate() {
                if i == last {
                    text.push_str(&value);
                } else {
                    text.push_str(&format!("$.$u === {} ? {} : ", tag, value));
                }
            }
            Ok(format!("({})", text))
        }
        (TypeKind::Struct { variants: o_vars, .. }, TypeKind::Struct { variants: d_vars, .. }) => {
            let class = constructor_ref(ctx, destination)?;
            let mut args = Vec::new();
            for field in align_fields(store, origin, destination) {
                let value = format!("$.{}", field_name(field.source));
                args.push(convert(ctx, field.src_ty, field.dst_ty, value)?);
            }
            if !d_vars.is_empty() {
                args.push("$.$v".to_string());
                let mut payload = String::new();
                for (label, o, d) in variant_payloads(o_vars, d_vars) {
                    if needs_conversion(store, o, d) {
                        let converted = convert(ctx, o, d, "$.$m".to_string())?;
                        payload.push_str(&format!("$.$v === {} ? {} : ", js_string(label), converted));
                    }
                }
                if payload.is_empty() {
                    args.push("$.$m".to_string());
                } else {
                    args.push(format!("({}$.$m)", payload));
                }
            }
            Ok(format!("new {}({})", class, args.join(", ")))
        }
        (TypeKind::Sig { dom: od, ret: or }, TypeKind::Sig { dom: dd, ret: dr }) => {
            // Arguments flow against the arrow, results with it.
            let arg = convert(ctx, dd, od, "$x".to_string())?;
            let result = convert(ctx, or, dr, format!("$({})", arg))?;
            Ok(format!("(function($x) {{ return {}; }})", result))
        }
        _ => Err(InternalError::unreachable(format!(
            "conversion from {} to {}",
            store.descriptor(origin),
            store.descriptor(destination)
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;
    use crate::test_utils::init_test_logging;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(store: &'a TypeStore<'a>) -> GlobalCtx<'a> {
        GlobalCtx::new(
            store,
            CompileOptions {
                type_comments: false,
                ..CompileOptions::default()
            },
        )
    }

    #[test]
    fn test_needs_conversion() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let int_str = store.union(&[store.int(), store.str()]);
        let ab = store.struct_type(&[], &[("a", store.int()), ("b", store.str())], &[]);
        let ba = store.struct_type(&[], &[("b", store.str()), ("a", store.int())], &[]);

        assert!(needs_conversion(store, store.int(), int_str));
        assert!(needs_conversion(store, ab, ba));
        assert!(!needs_conversion(store, store.never(), store.int()));
        assert!(!needs_conversion(store, store.int(), store.any()));
        assert!(!needs_conversion(store, int_str, store.union(&[int_str, store.bool()])));
        assert!(needs_conversion(
            store,
            store.sig(int_str, store.int()),
            store.sig(store.int(), store.int())
        ));
        assert!(!needs_conversion(
            store,
            store.sig(store.int(), store.never()),
            store.sig(store.int(), store.int())
        ));
    }

    #[test]
    fn test_union_injection_tags_with_origin_descriptor() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut ctx = ctx(store);
        let int_str = store.union(&[store.int(), store.str()]);

        let name = conversion_ref(&mut ctx, store.int(), int_str).unwrap();
        assert_eq!(name, format!("$c{}_{}", store.int().index(), int_str.index()));
        assert_eq!(
            ctx.out.as_str(),
            format!("function {}($) {{\n  return ({{ $u: \"Int\", $m: $ }});\n}}\n\n", name)
        );
    }

    #[test]
    fn test_conversion_emitted_once() {
        init_test_logging();
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut ctx = ctx(store);
        let int_str = store.union(&[store.int(), store.str()]);

        let first = conversion_ref(&mut ctx, store.int(), int_str).unwrap();
        let emitted = ctx.out.as_str().len();
        for _ in 0..3 {
            assert_eq!(conversion_ref(&mut ctx, store.int(), int_str).unwrap(), first);
        }
        assert_eq!(ctx.out.as_str().len(), emitted);
        assert_eq!(ctx.out.as_str().matches("function $c").count(), 1);
    }

    #[test]
    fn test_struct_reorder_reads_by_label_in_destination_order() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut ctx = ctx(store);
        let ab = store.struct_type(&[], &[("a", store.int()), ("b", store.str())], &[]);
        let ba = store.struct_type(&[], &[("b", store.str()), ("a", store.int())], &[]);

        let name = conversion_ref(&mut ctx, ab, ba).unwrap();
        let out = ctx.out.as_str();
        assert!(out.contains(&format!("class $C{} {{", ba.index())));
        assert!(out.contains(&format!(
            "function {}($) {{\n  return new $C{}($.b, $.a);\n}}",
            name,
            ba.index()
        )));
    }

    #[test]
    fn test_nested_field_conversion_is_shared() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut ctx = ctx(store);
        let int_str = store.union(&[store.int(), store.str()]);
        let from = store.struct_type(&[store.int()], &[], &[]);
        let to = store.struct_type(&[int_str], &[], &[]);

        conversion_ref(&mut ctx, from, to).unwrap();
        conversion_ref(&mut ctx, store.int(), int_str).unwrap();
        let inner = format!("$c{}_{}", store.int().index(), int_str.index());
        assert_eq!(ctx.out.as_str().matches(&format!("function {}(", inner)).count(), 1);
        // The nested conversion is flushed ahead of the one using it.
        let inner_at = ctx.out.as_str().find(&format!("function {}(", inner)).unwrap();
        let outer_at = ctx
            .out
            .as_str()
            .find(&format!("function $c{}_{}(", from.index(), to.index()))
            .unwrap();
        assert!(inner_at < outer_at);
    }

    #[test]
    fn test_signature_wrapper_converts_argument_and_result() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let mut ctx = ctx(store);
        let int_str = store.union(&[store.int(), store.str()]);
        let actual = store.sig(int_str, store.int());
        let expected = store.sig(store.int(), int_str);

        let name = conversion_ref(&mut ctx, actual, expected).unwrap();
        let to_union = format!("$c{}_{}", store.int().index(), int_str.index());
        assert!(ctx.out.as_str().contains(&format!(
            "function {}($) {{\n  return (function($x) {{ return {}($({}($x))); }});\n}}",
            name, to_union, to_union
        )));
    }
}
