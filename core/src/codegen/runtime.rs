/// Support functions every generated program starts with.
pub const RUNTIME: &str = r#"function $lazy_sentinel() {
  throw new Error("PLOY RUNTIME ERROR: recursive reference during lazy initialization");
}

function $dispatch_failed(family, tag) {
  throw new Error("PLOY RUNTIME ERROR: no morph of " + family + " accepts " + tag);
}"#;
