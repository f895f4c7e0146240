/*
 * Type Error Reporting Tests
 *
 * Error codes and messages of type-level failures, plus the secondary
 * sites attached to them.
 */

#[macro_use]
mod cases;

use bumpalo::Bump;
use ploy::{Error, ExprBuilder, TypeErrorKind, TypeStore, compile_program};
use pretty_assertions::assert_eq;

test_case! {
    name: annotation_mismatch,
    program: |b, store| b.program(vec![], b.body(&[], b.ann(b.str("x"), b.sym("Int")))),
    error: "E200",
    message: "annotated expression: types are not comparable; actual type Str, expected Int",
}

test_case! {
    name: value_outside_union,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.ann(b.sym("true"), b.union(&[b.sym("Int"), b.sym("Str")]))),
    ),
    error: "E200",
    message: "annotated expression: actual type is not a member of the expected union; actual type Bool, expected Union[Int Str]",
}

test_case! {
    name: conditional_without_default_needs_unit_branches,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.if_(&[(b.sym("true"), b.int(1))], None)),
    ),
    error: "E201",
    message: "conditional: conditional without a default requires unit branches; found Int",
}

test_case! {
    name: conditional_without_default_names_every_branch,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.if_(&[(b.sym("true"), b.int(1)), (b.sym("false"), b.str("x"))], None)),
    ),
    error: "E201",
    message: "conditional: conditional without a default requires unit branches; found Int, Str",
}

test_case! {
    name: condition_must_be_bool,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.if_(&[(b.int(1), b.int(2))], Some(b.int(3)))),
    ),
    error: "E200",
    message: "condition: types are not comparable; actual type Int, expected Bool",
}

test_case! {
    name: missing_field,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.acc_name(b.paren(&[b.bind("a", b.int(1))]), "b")),
    ),
    error: "E207",
    message: "field access: type (a:Int) has no field `b`",
}

test_case! {
    name: field_of_non_struct,
    program: |b, store| b.program(vec![], b.body(&[], b.acc_name(b.int(1), "x"))),
    error: "E208",
    message: "field access: cannot access `x` on non-struct type Int",
}

test_case! {
    name: field_of_unknown_type,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.acc_name(b.host_val(b.type_var("T"), "thing"), "a")),
    ),
    error: "E209",
    message: "field access: cannot determine the type accessed by `a`",
}

test_case! {
    name: struct_tag_must_be_last,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.paren(&[b.tag("ok"), b.int(1)])),
    ),
    error: "E210",
    message: "struct literal: struct element follows tagged element `-ok`",
}

test_case! {
    name: signature_is_not_a_value,
    program: |b, store| b.program(
        vec![],
        b.body(&[], b.sig(b.sym("Int"), b.sym("Int"))),
    ),
    error: "E214",
    message: "value expression: signature cannot be used as a value",
}

test_case! {
    name: literal_is_not_a_type,
    program: |b, store| b.program(vec![], b.body(&[], b.ann(b.int(1), b.int(2)))),
    error: "E215",
    message: "type expression: number literal cannot be used as a type",
}

#[test]
fn test_definition_errors_name_the_definition() {
    let arena = Bump::new();
    let store = TypeStore::new(&arena);
    let b = ExprBuilder::new(&arena);
    let program = b.program(
        vec![b.in_(&[], vec![b.def_bind_ann("count", b.sym("Int"), b.str("many"))])],
        b.body(&[], b.sym("count")),
    );

    let err = compile_program(store, program, cases::options()).unwrap_err();
    let Error::Type(type_err) = &err else {
        panic!("expected a type error, got {:?}", err);
    };
    assert!(matches!(type_err.kind, TypeErrorKind::Incompatible { .. }));

    let related: Vec<String> = err
        .to_diagnostic()
        .related
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(
        related,
        vec![
            "expected type comes from definition".to_string(),
            "in definition of `count`".to_string(),
        ]
    );
}

#[test]
fn test_nested_definition_error_keeps_innermost_definition() {
    let arena = Bump::new();
    let store = TypeStore::new(&arena);
    let b = ExprBuilder::new(&arena);
    let program = b.program(
        vec![b.in_(
            &[],
            vec![
                b.def_bind("outer", b.sym("inner")),
                b.def_bind_ann("inner", b.sym("Str"), b.int(0)),
            ],
        )],
        b.body(&[], b.sym("outer")),
    );

    let err = compile_program(store, program, cases::options()).unwrap_err();
    let definitions: Vec<String> = err
        .to_diagnostic()
        .related
        .into_iter()
        .map(|r| r.message)
        .filter(|m| m.starts_with("in definition"))
        .collect();
    assert_eq!(definitions, vec!["in definition of `inner`".to_string()]);
}
