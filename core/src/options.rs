//! Configuration options for compilation.

/// Options controlling the generated program text.
///
/// # Example
///
/// ```
/// use ploy_core::CompileOptions;
///
/// let options = CompileOptions {
///     shebang: false,
///     ..CompileOptions::default()
/// };
/// assert!(options.type_comments);
/// ```
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Emit `#!/usr/bin/env node` as the first line.
    ///
    /// Default: true
    pub shebang: bool,

    /// Precede each definition with a comment naming its type.
    ///
    /// Default: true
    pub type_comments: bool,

    /// Host runtime text placed after the built-in runtime support.
    ///
    /// Default: empty
    pub prelude: String,

    /// Name of the function wrapping the main body.
    ///
    /// Default: `_main`
    pub main_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            shebang: true,
            type_comments: true,
            prelude: String::new(),
            main_name: "_main".to_string(),
        }
    }
}
