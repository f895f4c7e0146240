use super::RelatedInfo;
use crate::syntax::Span;

/// Context information attached to an error.
///
/// Each entry points at a second source site that explains the first one,
/// and renders as a secondary label.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// The expression that supplied the expected type.
    ExpectedHere { what: String, span: Span },
    /// A previous definition of the same thing.
    PreviouslyDefined { name: String, span: Span },
    /// The definition being compiled when the error occurred.
    InDefinition { name: String, span: Span },
}

impl Context {
    /// Convert to a RelatedInfo for diagnostic display
    pub fn to_related_info(&self) -> RelatedInfo {
        match self {
            Context::ExpectedHere { what, span } => RelatedInfo {
                span: span.clone(),
                message: format!("expected type comes from {}", what),
            },
            Context::PreviouslyDefined { name, span } => RelatedInfo {
                span: span.clone(),
                message: format!("`{}` first defined here", name),
            },
            Context::InDefinition { name, span } => RelatedInfo {
                span: span.clone(),
                message: format!("in definition of `{}`", name),
            },
        }
    }
}
