use crate::poly::FamilyId;
use crate::syntax::Span;
use crate::types::TypeId;

use super::ScopeId;

/// What a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// The definition is being compiled; referencing it is an error.
    Fwd,
    /// Value computed on first access through `name__acc()`.
    Lazy(TypeId),
    Val(TypeId),
    Poly(FamilyId),
    Space(ScopeId),
    Type(TypeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingRecord {
    /// Name in the generated program.
    pub host_name: String,
    pub kind: RecordKind,
    /// Where the name was bound.
    pub span: Span,
}

impl BindingRecord {
    pub fn new(host_name: impl Into<String>, kind: RecordKind, span: Span) -> Self {
        Self {
            host_name: host_name.into(),
            kind,
            span,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            RecordKind::Fwd => "a definition in progress",
            RecordKind::Lazy(_) | RecordKind::Val(_) => "a value",
            RecordKind::Poly(_) => "a polymorphic family",
            RecordKind::Space(_) => "a namespace",
            RecordKind::Type(_) => "a type",
        }
    }

    /// Type of the value, for value-like records.
    pub fn value_type(&self) -> Option<TypeId> {
        match self.kind {
            RecordKind::Lazy(ty) | RecordKind::Val(ty) => Some(ty),
            _ => None,
        }
    }
}

const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield",
];

/// Turns a source name into a valid target identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`. Reserved words get a
/// trailing `_` and a leading digit gets a leading `_`.
pub fn mangle(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RESERVED.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mangle() {
        assert_eq!(mangle("foo"), "foo");
        assert_eq!(mangle("is-empty?"), "is_empty_");
        assert_eq!(mangle("new"), "new_");
        assert_eq!(mangle("2nd"), "_2nd");
        assert_eq!(mangle(""), "_");
    }
}
