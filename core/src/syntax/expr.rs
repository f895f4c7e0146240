use super::Span;

/// A symbol occurrence: a name plus where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Sym<'a> {
    pub span: Span,
    pub name: &'a str,
}

/// Field selector used by accessor expressions and property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor<'a> {
    /// Positional field, `x.0`.
    Index(usize),
    /// Labeled field, `x.name`.
    Name(&'a str),
}

impl core::fmt::Display for Accessor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Accessor::Index(i) => write!(f, "{}", i),
            Accessor::Name(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Expr<'a> {
    pub span: Span,
    pub kind: ExprKind<'a>,
}

impl<'a> Expr<'a> {
    pub fn as_ptr(&self) -> *const Self {
        self as *const _
    }
}

/// Left-hand side of a binding.
#[derive(Debug, PartialEq)]
pub struct Place<'a> {
    pub sym: Sym<'a>,
    /// `-tag = value` inside a struct literal.
    pub is_tag: bool,
    pub ann: Option<&'a Expr<'a>>,
}

/// One `cond ? cons` arm of a conditional.
#[derive(Debug, PartialEq)]
pub struct Case<'a> {
    pub cond: &'a Expr<'a>,
    pub cons: &'a Expr<'a>,
}

/// Statement sequence with a trailing expression.
#[derive(Debug, PartialEq)]
pub struct Body<'a> {
    pub span: Span,
    pub stmts: &'a [&'a Expr<'a>],
    pub expr: &'a Expr<'a>,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind<'a> {
    Acc {
        accessor: Accessor<'a>,
        accessee: &'a Expr<'a>,
    },
    Ann {
        expr: &'a Expr<'a>,
        ty: &'a Expr<'a>,
    },
    Bind {
        place: Place<'a>,
        val: &'a Expr<'a>,
    },
    Call {
        callee: &'a Expr<'a>,
        arg: &'a Expr<'a>,
    },
    Do(Body<'a>),
    Fn {
        sig: &'a Expr<'a>,
        body: Body<'a>,
    },
    /// Verbatim target code with a declared type.
    HostVal {
        ty: &'a Expr<'a>,
        code: &'a str,
    },
    If {
        cases: &'a [Case<'a>],
        dflt: Option<&'a Expr<'a>>,
    },
    And(&'a [&'a Expr<'a>]),
    Or(&'a [&'a Expr<'a>]),
    LitNum(i64),
    LitStr(&'a str),
    /// Struct literal, scalar grouping, or (in type position) struct type.
    Paren(&'a [&'a Expr<'a>]),
    Path(&'a [Sym<'a>]),
    Sym(Sym<'a>),
    /// Bare `-tag` constructor.
    Tag(Sym<'a>),
    TagTest {
        tag: Sym<'a>,
        expr: &'a Expr<'a>,
    },
    Sig {
        dom: &'a Expr<'a>,
        ret: &'a Expr<'a>,
    },
    Union(&'a [&'a Expr<'a>]),
    TypeVar(Sym<'a>),
}

impl ExprKind<'_> {
    /// Short human-readable name of the form, used in diagnostics.
    pub fn form_name(&self) -> &'static str {
        match self {
            ExprKind::Acc { .. } => "accessor",
            ExprKind::Ann { .. } => "annotation",
            ExprKind::Bind { .. } => "binding",
            ExprKind::Call { .. } => "call",
            ExprKind::Do(_) => "do block",
            ExprKind::Fn { .. } => "function",
            ExprKind::HostVal { .. } => "host value",
            ExprKind::If { .. } => "if",
            ExprKind::And(_) => "and",
            ExprKind::Or(_) => "or",
            ExprKind::LitNum(_) => "number literal",
            ExprKind::LitStr(_) => "string literal",
            ExprKind::Paren(_) => "parenthesized expression",
            ExprKind::Path(_) => "path",
            ExprKind::Sym(_) => "symbol",
            ExprKind::Tag(_) => "tag",
            ExprKind::TagTest { .. } => "tag test",
            ExprKind::Sig { .. } => "signature",
            ExprKind::Union(_) => "union",
            ExprKind::TypeVar(_) => "type variable",
        }
    }
}

/// A top-level definition inside an `in` block.
#[derive(Debug, PartialEq)]
pub enum Def<'a> {
    Bind {
        place: Place<'a>,
        val: &'a Expr<'a>,
    },
    /// One member of a polymorphic family; `val` must be a function.
    Morph { sym: Sym<'a>, val: &'a Expr<'a> },
    HostType { sym: Sym<'a> },
    Alias { sym: Sym<'a>, ty: &'a Expr<'a> },
}

impl<'a> Def<'a> {
    pub fn sym(&self) -> &Sym<'a> {
        match self {
            Def::Bind { place, .. } => &place.sym,
            Def::Morph { sym, .. } | Def::HostType { sym } | Def::Alias { sym, .. } => sym,
        }
    }
}

/// Definitions attached to a space path, e.g. `in A/B`.
#[derive(Debug, PartialEq)]
pub struct In<'a> {
    pub path: &'a [Sym<'a>],
    pub defs: &'a [Def<'a>],
}

#[derive(Debug, PartialEq)]
pub struct Program<'a> {
    pub ins: &'a [In<'a>],
    pub main: Body<'a>,
}
