//! Error taxonomy of the compiler core.
//!
//! Scope and type errors are user diagnostics and carry source locations.
//! Internal errors report broken invariants of the compiler itself and are
//! kept in their own variant so they are never confused with user mistakes.

use crate::check::Incompatibility;
use crate::diagnostics::context::Context;
use crate::diagnostics::{Diagnostic, Severity};
use crate::syntax::Span;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::Scope(e) => e.to_diagnostic(),
            Error::Type(e) => e.to_diagnostic(),
            Error::Internal(e) => Diagnostic {
                severity: Severity::Error,
                message: format!("internal compiler error: {}", e),
                span: e.span().unwrap_or_default(),
                related: Vec::new(),
                help: Vec::new(),
                code: Some("E900".to_string()),
            },
        }
    }
}

// ============================================================================
// Scope errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct ScopeError {
    pub kind: ScopeErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScopeErrorKind {
    #[error("undefined name `{name}`")]
    Undefined { name: String },
    #[error("redefinition of `{name}`")]
    Redefinition { name: String, previous: Span },
    #[error("`{name}` is not a namespace; found {found}")]
    ExpectedNamespace { name: String, found: &'static str },
    #[error("expected a value for `{name}`; found {found}")]
    ExpectedValue { name: String, found: &'static str },
    #[error("expected a type for `{name}`; found {found}")]
    ExpectedType { name: String, found: &'static str },
    #[error("`{name}` is referenced before its definition completes")]
    ForwardReference { name: String },
}

impl ScopeError {
    pub fn new(kind: ScopeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help, related) = match &self.kind {
            ScopeErrorKind::Undefined { .. } => (
                "E100",
                Some("Make sure the name is defined in this scope or an enclosing space"),
                Vec::new(),
            ),
            ScopeErrorKind::Redefinition { name, previous } => (
                "E101",
                None,
                vec![
                    Context::PreviouslyDefined {
                        name: name.clone(),
                        span: previous.clone(),
                    }
                    .to_related_info(),
                ],
            ),
            ScopeErrorKind::ExpectedNamespace { .. } => ("E102", None, Vec::new()),
            ScopeErrorKind::ExpectedValue { .. } => ("E103", None, Vec::new()),
            ScopeErrorKind::ExpectedType { .. } => ("E104", None, Vec::new()),
            ScopeErrorKind::ForwardReference { .. } => (
                "E105",
                Some("Add a type annotation to the referenced definition"),
                Vec::new(),
            ),
        };
        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span: self.span.clone(),
            related,
            help: help.into_iter().map(String::from).collect(),
            code: Some(code.to_string()),
        }
    }
}

// ============================================================================
// Type errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("{desc}: {kind}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    /// The expression whose type was being checked.
    pub span: Span,
    /// What was being checked, e.g. "call argument".
    pub desc: String,
    pub context: Vec<Context>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeErrorKind {
    #[error("{incompatibility}; actual type {actual}, expected {expected}")]
    Incompatible {
        incompatibility: Incompatibility,
        actual: String,
        expected: String,
    },
    #[error("conditional without a default requires unit branches; found {}", .branches.join(", "))]
    InconsistentBranches { branches: Vec<String> },
    #[error("morph of `{family}` over domain {domain} is defined twice")]
    DuplicateMorph {
        family: String,
        domain: String,
        first: Span,
    },
    #[error("morph of `{family}` has non-function type {ty}")]
    MorphNotAFunction { family: String, ty: String },
    #[error("no morph of `{family}` accepts {domain}")]
    NoMatchingMorph { family: String, domain: String },
    #[error("cannot determine which morph of `{family}` is referenced")]
    AmbiguousPolyReference { family: String },
    #[error("morphs of `{family}` selected for dispatch return different types: {}", .results.join(", "))]
    DispatchResultsDiffer { family: String, results: Vec<String> },
    #[error("type {ty} has no field `{accessor}`")]
    NoSuchField { accessor: String, ty: String },
    #[error("cannot access `{accessor}` on non-struct type {ty}")]
    PropertyOfNonStruct { accessor: String, ty: String },
    #[error("cannot determine the type accessed by `{accessor}`")]
    UndeterminedProperty { accessor: String },
    #[error("struct element follows tagged element `-{tag}`")]
    StructTagNotLast { tag: String },
    #[error("struct contains multiple tagged elements")]
    StructMultipleTags { first: Span },
    #[error("positional element follows a labeled element")]
    StructPositionalAfterLabeled,
    #[error("repeated label `{label}`")]
    StructRepeatedLabel { label: String, first: Span },
    #[error("{form} cannot be used as a value")]
    NotAValue { form: &'static str },
    #[error("{form} cannot be used as a type")]
    NotAType { form: &'static str },
    #[error("function type must be a signature; found {ty}")]
    NotASignature { ty: String },
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span, desc: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            desc: desc.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context.push(context);
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            TypeErrorKind::Incompatible { .. } => ("E200", None),
            TypeErrorKind::InconsistentBranches { .. } => (
                "E201",
                Some("Add a default branch"),
            ),
            TypeErrorKind::DuplicateMorph { .. } => ("E202", None),
            TypeErrorKind::MorphNotAFunction { .. } => ("E203", None),
            TypeErrorKind::NoMatchingMorph { .. } => ("E204", None),
            TypeErrorKind::AmbiguousPolyReference { .. } => (
                "E205",
                Some("Call the family directly or annotate the reference"),
            ),
            TypeErrorKind::DispatchResultsDiffer { .. } => ("E206", None),
            TypeErrorKind::NoSuchField { .. } => ("E207", None),
            TypeErrorKind::PropertyOfNonStruct { .. } => ("E208", None),
            TypeErrorKind::UndeterminedProperty { .. } => {
                ("E209", Some("Annotate the accessed expression"))
            }
            TypeErrorKind::StructTagNotLast { .. } => ("E210", None),
            TypeErrorKind::StructMultipleTags { .. } => ("E211", None),
            TypeErrorKind::StructPositionalAfterLabeled => ("E212", None),
            TypeErrorKind::StructRepeatedLabel { .. } => ("E213", None),
            TypeErrorKind::NotAValue { .. } => ("E214", None),
            TypeErrorKind::NotAType { .. } => ("E215", None),
            TypeErrorKind::NotASignature { .. } => ("E216", None),
        };

        let mut related: Vec<_> = self.context.iter().map(|c| c.to_related_info()).collect();
        match &self.kind {
            TypeErrorKind::DuplicateMorph { family, first, .. } => related.push(
                Context::PreviouslyDefined {
                    name: family.clone(),
                    span: first.clone(),
                }
                .to_related_info(),
            ),
            TypeErrorKind::StructMultipleTags { first } => related.push(
                Context::PreviouslyDefined {
                    name: "tag".to_string(),
                    span: first.clone(),
                }
                .to_related_info(),
            ),
            TypeErrorKind::StructRepeatedLabel { label, first } => related.push(
                Context::PreviouslyDefined {
                    name: label.clone(),
                    span: first.clone(),
                }
                .to_related_info(),
            ),
            _ => {}
        }

        Diagnostic {
            severity: Severity::Error,
            message: self.to_string(),
            span: self.span.clone(),
            related,
            help: help.into_iter().map(String::from).collect(),
            code: Some(code.to_string()),
        }
    }
}

// ============================================================================
// Internal errors
// ============================================================================

/// Broken compiler invariant. Never caused by user input alone.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InternalError {
    #[error("expression at {span} has no recorded type")]
    UntrackedExpr { span: Span },
    #[error("expression at {span} was typed twice")]
    DoubleTracked { span: Span },
    #[error("descriptor `{descriptor}` registered with two different structures")]
    DuplicateDescriptor { descriptor: String },
    #[error("expression at {span} still has unresolved type {ty}")]
    UnresolvedType { span: Span, ty: String },
    #[error("forward placeholder for `{name}` reached emission")]
    ForwardPlaceholderEmitted { name: String },
    #[error("unreachable: {what}")]
    Unreachable { what: String },
}

impl InternalError {
    pub fn span(&self) -> Option<Span> {
        match self {
            InternalError::UntrackedExpr { span }
            | InternalError::DoubleTracked { span }
            | InternalError::UnresolvedType { span, .. } => Some(span.clone()),
            _ => None,
        }
    }

    pub fn unreachable(what: impl Into<String>) -> Self {
        InternalError::Unreachable { what: what.into() }
    }
}
