/*
 * Definition Tests
 *
 * Plain and lazy definitions, spaces, host types, aliases, and the
 * scope errors a definition can raise.
 */

#[macro_use]
mod cases;

use bumpalo::Bump;
use indoc::indoc;
use ploy::{CompileOptions, ExprBuilder, TypeStore, compile_program};
use pretty_assertions::assert_eq;

test_case! {
    name: literal_definition_is_a_constant,
    program: |b, store| b.program(
        vec![b.in_(&[], vec![b.def_bind("limit", b.int(10))])],
        b.body(&[], b.sym("limit")),
    ),
    contains: ["const limit = 10;\n", "  return limit;\n"],
}

test_case! {
    name: self_referencing_definition_guards_initialization,
    program: |b, store| b.program(
        vec![b.in_(&[], vec![b.def_bind_ann(
            "knot",
            b.sym("Int"),
            b.call(b.host_val(b.sig(b.sym("Int"), b.sym("Int")), "inc"), b.sym("knot")),
        )])],
        b.body(&[], b.sym("knot")),
    ),
    contains: [
        "let knot__acc = function() {\n",
        "  knot__acc = $lazy_sentinel;\n",
        "  const $val = (inc)(knot__acc());\n",
    ],
}

test_case! {
    name: mutually_recursive_functions,
    program: |b, store| {
        let int_bool = || b.sig(b.sym("Int"), b.sym("Bool"));
        let even = b.fn_(int_bool(), &[], b.call(b.sym("odd"), b.sym("$")));
        let odd = b.fn_(int_bool(), &[], b.call(b.sym("even"), b.sym("$")));
        b.program(
            vec![b.in_(&[], vec![
                b.def_bind_ann("even", int_bool(), even),
                b.def_bind_ann("odd", int_bool(), odd),
            ])],
            b.body(&[], b.call(b.sym("even"), b.int(4))),
        )
    },
    contains: [
        "const odd = (function self($) {\n  return even($);\n});\n",
        "const even = (function self($) {\n  return odd($);\n});\n",
    ],
}

test_case! {
    name: host_type_and_alias,
    program: |b, store| b.program(
        vec![b.in_(&["Net"], vec![
            b.def_host_type("Socket"),
            b.def_alias("Port", b.sym("Int")),
            b.def_bind_ann("port", b.sym("Port"), b.int(80)),
            b.def_bind("sock", b.host_val(b.sym("Socket"), "openSocket()")),
        ])],
        b.body(&[], b.paren(&[b.path(&["Net", "port"]), b.path(&["Net", "sock"])])),
    ),
    contains: ["const Net__port = 80;\n", "const Net__sock = (openSocket());\n"],
}

test_case! {
    name: generic_host_value_is_instantiated_per_reference,
    program: |b, store| {
        let id = b.host_val(b.sig(b.type_var("T"), b.type_var("T")), "x => x");
        b.program(
            vec![b.in_(&[], vec![b.def_bind("id", id)])],
            b.body(&[], b.paren(&[b.call(b.sym("id"), b.int(1)), b.call(b.sym("id"), b.str("s"))])),
        )
    },
    contains: ["const id = (x => x);\n", "id(1)", "id(\"s\")"],
}

test_case! {
    name: undefined_name,
    program: |b, store| b.program(vec![], b.body(&[], b.sym("ghost"))),
    error: "E100",
    message: "undefined name `ghost`",
}

test_case! {
    name: undefined_path_segment,
    program: |b, store| b.program(
        vec![b.in_(&["A"], vec![b.def_bind("x", b.int(1))])],
        b.body(&[], b.path(&["A", "y"])),
    ),
    error: "E100",
    message: "undefined name `A/y`",
}

test_case! {
    name: redefinition_in_one_space,
    program: |b, store| b.program(
        vec![b.in_(&[], vec![b.def_bind("x", b.int(1)), b.def_bind("x", b.int(2))])],
        b.body(&[], b.sym("x")),
    ),
    error: "E101",
    message: "redefinition of `x`",
}

test_case! {
    name: unannotated_cycle_is_a_forward_reference,
    program: |b, store| b.program(
        vec![b.in_(&[], vec![b.def_bind("a", b.sym("b")), b.def_bind("b", b.sym("a"))])],
        b.body(&[], b.sym("a")),
    ),
    error: "E105",
    message: "`a` is referenced before its definition completes",
}

test_case! {
    name: value_used_as_namespace,
    program: |b, store| b.program(
        vec![b.in_(&[], vec![b.def_bind("x", b.int(1))])],
        b.body(&[], b.path(&["x", "y"])),
    ),
    error: "E102",
    message: "`x` is not a namespace; found a value",
}

#[test]
fn test_self_reference_fails_when_run() {
    let arena = Bump::new();
    let store = TypeStore::new(&arena);
    let b = ExprBuilder::new(&arena);
    let inc = b.host_val(b.sig(b.sym("Int"), b.sym("Int")), "inc");
    let program = b.program(
        vec![b.in_(&[], vec![b.def_bind_ann("knot", b.sym("Int"), b.call(inc, b.sym("knot")))])],
        b.body(&[], b.sym("knot")),
    );

    let options = CompileOptions {
        prelude: "const inc = x => x + 1;".to_string(),
        ..cases::options()
    };
    let out = compile_program(store, program, options).unwrap();
    let Some(run) = cases::run_node("lazy_self_reference", &out) else {
        return;
    };
    assert!(!run.status.success());
    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(
        stderr.contains("PLOY RUNTIME ERROR: recursive reference during lazy initialization"),
        "unexpected failure:\n{}",
        stderr
    );
}

#[test]
fn test_full_program_output() {
    let arena = Bump::new();
    let store = TypeStore::new(&arena);
    let b = ExprBuilder::new(&arena);
    let program = b.program(
        vec![b.in_(&[], vec![b.def_bind("greeting", b.str("hello"))])],
        b.body(&[], b.sym("greeting")),
    );

    let options = CompileOptions {
        prelude: "// prelude".to_string(),
        ..CompileOptions::default()
    };
    let out = compile_program(store, program, options).unwrap();
    let (_, tail) = out.split_once("// prelude\n\n").unwrap();
    assert_eq!(
        tail,
        indoc! {r#"
            // greeting: Str
            const greeting = "hello";

            const _main = function() {
              return greeting;
            };

            _main();

        "#}
    );
}
