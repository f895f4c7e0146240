/*
 * Conversion Tests
 *
 * Values whose type is compatible with, but not identical to, the expected
 * type are adapted at runtime by generated conversion functions.
 */

#[macro_use]
mod cases;

use bumpalo::Bump;
use ploy::{ExprBuilder, TypeStore, compile_program};

test_case! {
    name: injection_into_union,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.ann(b.str("s"), b.union(&[b.sym("Int"), b.sym("Str")]))),
    ),
    contains: ["  return ({ $u: \"Str\", $m: $ });\n"],
}

test_case! {
    name: struct_fields_are_reordered_by_label,
    program: |b, store| {
        let target = b.paren(&[b.field_ty("b", b.sym("Str")), b.field_ty("a", b.sym("Int"))]);
        let value = b.paren(&[b.bind("a", b.int(1)), b.bind("b", b.str("x"))]);
        b.program(
            vec![b.in_(&[], vec![b.def_bind_ann("p", target, value)])],
            b.body(&[], b.sym("p")),
        )
    },
    contains: ["($.b, $.a);\n", "  const $val = $c"],
}

test_case! {
    name: function_values_are_wrapped,
    program: |b, store| {
        let union = b.union(&[b.sym("Int"), b.sym("Str")]);
        let id = b.fn_(b.sig(b.sym("Int"), b.sym("Int")), &[], b.sym("$"));
        b.program(
            vec![b.in_(&[], vec![b.def_bind_ann("widen", b.sig(b.sym("Int"), union), id)])],
            b.body(&[], b.sym("widen")),
        )
    },
    contains: ["  return (function($x) { return $c", "($($x)); });\n"],
}

test_case! {
    name: divergent_value_needs_no_conversion,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.ann(b.host_val(b.sym("Never"), "abort()"), b.sym("Int"))),
    ),
    contains: ["  return (abort());\n"],
}

test_case! {
    name: union_passes_through_to_wider_union,
    program: |b, store| {
        let narrow = b.union(&[b.sym("Int"), b.sym("Str")]);
        let wide = b.union(&[b.sym("Int"), b.sym("Str"), b.sym("Bool")]);
        b.program(
            vec![],
            b.body(&[b.bind_ann("n", narrow, b.int(1))], b.ann(b.sym("n"), wide)),
        )
    },
    contains: ["  return n$0;\n"],
}

#[test]
fn test_conversion_is_emitted_once_and_shared() {
    let arena = Bump::new();
    let store = TypeStore::new(&arena);
    let b = ExprBuilder::new(&arena);
    let union = || b.union(&[b.sym("Int"), b.sym("Str")]);
    let program = b.program(
        vec![],
        b.body(
            &[b.bind_ann("a", union(), b.int(1)), b.bind_ann("c", union(), b.int(2))],
            b.paren(&[b.sym("a"), b.sym("c")]),
        ),
    );

    let out = compile_program(store, program, cases::options()).unwrap();
    let int_str = store.union(&[store.int(), store.str()]);
    let name = format!("$c{}_{}", store.int().index(), int_str.index());
    assert_eq!(out.matches(&format!("function {}(", name)).count(), 1);
    assert!(out.contains(&format!("  const a$0 = {}(1);\n", name)));
    assert!(out.contains(&format!("  const c$1 = {}(2);\n", name)));
    // The helper precedes main.
    assert!(out.find(&format!("function {}(", name)) < out.find("const _main"));
}
