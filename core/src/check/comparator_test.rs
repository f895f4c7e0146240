use super::comparator::align_fields;
use super::{Incompatibility, Unifier, Verdict};
use crate::syntax::Accessor;
use crate::types::{TypeId, TypeStore};
use bumpalo::Bump;
use pretty_assertions::assert_eq;

fn sample_types(store: &TypeStore<'_>) -> Vec<TypeId> {
    let int = store.int();
    let str = store.str();
    let void = store.void();
    vec![
        int,
        str,
        void,
        store.any(),
        store.never(),
        store.host("Socket"),
        store.sig(int, str),
        store.sig(store.sig(int, int), void),
        store.union(&[int, str]),
        store.struct_type(&[int], &[("a", str)], &[("t", void)]),
        store.struct_type(&[], &[("b", str), ("a", int)], &[]),
    ]
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_compare_is_reflexive() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    for ty in sample_types(store) {
        let mut unifier = Unifier::new(store);
        assert_eq!(
            unifier.compare(ty, ty),
            Verdict::Exact,
            "{}",
            store.descriptor(ty)
        );
    }
}

// ============================================================================
// Signatures
// ============================================================================

#[test]
fn test_signature_domain_is_contravariant() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let union = store.union(&[int, store.str()]);

    // A function accepting Int|Str can stand in for one accepting Int.
    let wide = store.sig(union, int);
    let narrow = store.sig(int, int);
    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(wide, narrow), Verdict::Subtype);

    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(narrow, wide),
        Verdict::Incompatible(Incompatibility::UnionMemberMissing)
    );
}

#[test]
fn test_signature_result_is_covariant() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let union = store.union(&[int, store.str()]);

    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.sig(int, int), store.sig(int, union)),
        Verdict::Subtype
    );
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.sig(int, union), store.sig(int, int)),
        Verdict::Incompatible(Incompatibility::UnionMemberMissing)
    );
}

#[test]
fn test_signature_domain_is_checked_before_result() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let str = store.str();

    // Both components are wrong; the domain failure is reported.
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.sig(int, store.void()), store.sig(str, int)),
        Verdict::Incompatible(Incompatibility::Incomparable)
    );
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.sig(int, int), store.sig(int, store.void())),
        Verdict::Incompatible(Incompatibility::UnitRequiresExact)
    );
}

// ============================================================================
// Structs
// ============================================================================

#[test]
fn test_struct_label_reordering_is_subtype() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let str = store.str();
    let ab = store.struct_type(&[], &[("a", int), ("b", str)], &[]);
    let ba = store.struct_type(&[], &[("b", str), ("a", int)], &[]);

    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(ab, ba), Verdict::Subtype);

    let sources = align_fields(store, ab, ba);
    assert_eq!(
        sources.iter().map(|s| s.source).collect::<Vec<_>>(),
        vec![Accessor::Name("b"), Accessor::Name("a")]
    );
}

#[test]
fn test_positional_fields_satisfy_labels() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let pair = store.struct_type(&[int, int], &[], &[]);
    let labeled = store.struct_type(&[int], &[("y", int)], &[]);

    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(pair, labeled), Verdict::Subtype);
    assert_eq!(
        align_fields(store, pair, labeled)
            .iter()
            .map(|s| s.source)
            .collect::<Vec<_>>(),
        vec![Accessor::Index(0), Accessor::Index(1)]
    );
}

#[test]
fn test_struct_field_errors() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let cases = [
        (
            store.struct_type(&[int], &[], &[]),
            store.struct_type(&[int, int], &[], &[]),
            Incompatibility::StructMissingPositionalField { index: 1 },
        ),
        (
            store.struct_type(&[int, int], &[], &[]),
            store.struct_type(&[int], &[], &[]),
            Incompatibility::StructExtraneousPositionalField { index: 1 },
        ),
        (
            store.struct_type(&[], &[("a", int)], &[]),
            store.struct_type(&[], &[("b", int)], &[]),
            Incompatibility::StructLabelMismatch {
                expected: "b".to_string(),
                found: "a".to_string(),
            },
        ),
        (
            store.struct_type(&[], &[("a", int)], &[]),
            store.struct_type(&[], &[("a", int), ("b", int)], &[]),
            Incompatibility::StructMissingLabeledField {
                label: "b".to_string(),
            },
        ),
        (
            store.struct_type(&[], &[("a", int), ("b", int)], &[]),
            store.struct_type(&[], &[("a", int)], &[]),
            Incompatibility::StructExtraneousLabeledField {
                label: "b".to_string(),
            },
        ),
    ];
    for (act, exp, expected) in cases {
        let mut unifier = Unifier::new(store);
        assert_eq!(
            unifier.compare(act, exp),
            Verdict::Incompatible(expected),
            "{} vs {}",
            store.descriptor(act),
            store.descriptor(exp)
        );
    }
}

#[test]
fn test_variant_sets() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let void = store.void();
    let a = store.struct_type(&[], &[], &[("a", void)]);
    let ab = store.struct_type(&[], &[], &[("a", void), ("b", void)]);

    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(a, ab), Verdict::Subtype);

    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(ab, a),
        Verdict::Incompatible(Incompatibility::StructTagNotInDestinationVariants {
            tag: "b".to_string()
        })
    );
}

#[test]
fn test_variant_member_expectation() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let tagged = store.struct_type(&[], &[], &[("ok", int)]);

    let mut unifier = Unifier::new(store);
    let payload = store.free(0);
    assert_eq!(
        unifier.compare(tagged, store.variant_member("ok", payload)),
        Verdict::FreeBound
    );
    assert_eq!(unifier.resolve(payload), int);

    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(tagged, store.variant_member("err", store.free(1))),
        Verdict::Incompatible(Incompatibility::StructMissingMatchingVariant {
            tag: "err".to_string()
        })
    );
}

#[test]
fn test_unit_destination_requires_exact() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.struct_type(&[int], &[], &[]), store.void()),
        Verdict::Incompatible(Incompatibility::UnitRequiresExact)
    );
}

// ============================================================================
// Unions, top and bottom
// ============================================================================

#[test]
fn test_union_injection_is_subtype() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let union = store.union(&[int, store.str()]);

    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(int, union), Verdict::Subtype);
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(store.bool(), union),
        Verdict::Incompatible(Incompatibility::NotInUnion)
    );
}

#[test]
fn test_union_actual_requires_every_member() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let int = store.int();
    let str = store.str();
    let small = store.union(&[int, str]);
    let big = store.union(&[int, str, store.bool()]);

    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(small, big), Verdict::Subtype);
    let mut unifier = Unifier::new(store);
    assert_eq!(
        unifier.compare(big, small),
        Verdict::Incompatible(Incompatibility::UnionMemberMissing)
    );
}

#[test]
fn test_any_absorbs_everything() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    for ty in sample_types(store) {
        if ty == store.any() {
            continue;
        }
        let mut unifier = Unifier::new(store);
        assert_eq!(unifier.compare(ty, store.any()), Verdict::Subtype);
    }
}

#[test]
fn test_never_does_not_bind_free() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let mut unifier = Unifier::new(store);
    let shared = store.free(0);

    assert_eq!(unifier.compare(store.never(), shared), Verdict::FreeBound);
    assert_eq!(unifier.resolve(shared), shared);
    // A later branch supplies the real type.
    assert_eq!(unifier.compare(store.int(), shared), Verdict::FreeBound);
    assert_eq!(unifier.bind_bottom_candidates(), 0);
    assert_eq!(unifier.resolve(shared), store.int());
}

#[test]
fn test_never_is_subtype_of_concrete() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let mut unifier = Unifier::new(store);
    assert_eq!(unifier.compare(store.never(), store.int()), Verdict::Subtype);
}

// ============================================================================
// Free variables
// ============================================================================

#[test]
fn test_higher_free_binds_to_lower() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let mut unifier = Unifier::new(store);
    let f0 = store.free(0);
    let f1 = store.free(1);

    assert_eq!(unifier.compare(f0, f1), Verdict::FreeBound);
    assert_eq!(unifier.resolve(f1), f0);
    assert_eq!(unifier.resolve(f0), f0);
}

#[test]
fn test_bound_free_is_not_rebound() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let mut unifier = Unifier::new(store);
    let free = store.free(0);

    assert_eq!(unifier.compare(store.int(), free), Verdict::FreeBound);
    assert_eq!(unifier.compare(store.int(), free), Verdict::Exact);
    assert_eq!(
        unifier.compare(store.str(), free),
        Verdict::Incompatible(Incompatibility::Incomparable)
    );
}

#[test]
fn test_call_shape_binds_domain_and_result() {
    let bump = Bump::new();
    let store = TypeStore::new(&bump);
    let mut unifier = Unifier::new(store);
    let int = store.int();
    let str = store.str();
    let dom = store.free(0);
    let ret = store.free(1);

    let callee = store.sig(int, str);
    assert_eq!(unifier.compare(callee, store.sig(dom, ret)), Verdict::FreeBound);
    assert_eq!(unifier.resolve(dom), int);
    assert_eq!(unifier.resolve(ret), str);
    assert_eq!(unifier.compare(int, dom), Verdict::Exact);
}
