//! Shared harness for compiling builder-made programs.
//!
//! `test_case!` takes a closure-like `program: |b| ...` that builds the
//! program with an [`ExprBuilder`](ploy::ExprBuilder), then checks either
//! fragments of the emitted program or the diagnostic of the failure.

use std::process::{Command, Output};

use ploy::CompileOptions;

#[allow(dead_code)]
pub fn options() -> CompileOptions {
    CompileOptions {
        shebang: false,
        type_comments: false,
        ..CompileOptions::default()
    }
}

/// Runs a compiled program with node. Returns `None` when node is not
/// installed.
#[allow(dead_code)]
pub fn run_node(name: &str, js: &str) -> Option<Output> {
    let path = std::env::temp_dir().join(format!("ploy-{}-{}.js", name, std::process::id()));
    std::fs::write(&path, js).unwrap();
    let output = Command::new("node").arg(&path).output().ok();
    let _ = std::fs::remove_file(&path);
    output
}

macro_rules! test_case {
    (
        name: $name:ident,
        program: |$b:ident, $store:ident| $build:expr,
        contains: [$($frag:expr),* $(,)?] $(,)?
    ) => {
        #[test]
        fn $name() {
            let arena = bumpalo::Bump::new();
            let $store = ploy::TypeStore::new(&arena);
            let $b = ploy::ExprBuilder::new(&arena);
            let program = $build;
            let out = match ploy::compile_program($store, program, crate::cases::options()) {
                Ok(out) => out,
                Err(e) => panic!("compilation failed: {}", e),
            };
            $(
                let frag: String = ($frag).into();
                assert!(out.contains(&frag), "missing {:?} in:\n{}", frag, out);
            )*
        }
    };
    (
        name: $name:ident,
        program: |$b:ident, $store:ident| $build:expr,
        error: $code:literal,
        message: $message:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let arena = bumpalo::Bump::new();
            let $store = ploy::TypeStore::new(&arena);
            let $b = ploy::ExprBuilder::new(&arena);
            let program = $build;
            let err = match ploy::compile_program($store, program, crate::cases::options()) {
                Ok(out) => panic!("expected an error, got:\n{}", out),
                Err(e) => e,
            };
            assert!(!err.is_internal(), "internal error: {}", err);
            let diag = err.to_diagnostic();
            pretty_assertions::assert_eq!(diag.code.as_deref(), Some($code));
            pretty_assertions::assert_eq!(diag.message, $message);
        }
    };
}
