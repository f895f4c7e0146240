//! Arena builder for syntax trees.
//!
//! The parser is an external collaborator, so embedders and tests construct
//! trees directly. Every node receives a fresh span so that diagnostics can
//! tell nodes apart even without source text.

use core::cell::Cell;

use bumpalo::Bump;

use super::{Accessor, Body, Case, Def, Expr, ExprKind, In, Place, Program, Span, Sym};

pub struct ExprBuilder<'a> {
    arena: &'a Bump,
    next_pos: Cell<usize>,
}

impl<'a> ExprBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            next_pos: Cell::new(0),
        }
    }

    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    fn span(&self) -> Span {
        let pos = self.next_pos.get();
        self.next_pos.set(pos + 1);
        Span::new(pos, pos + 1)
    }

    fn alloc(&self, kind: ExprKind<'a>) -> &'a Expr<'a> {
        self.arena.alloc(Expr {
            span: self.span(),
            kind,
        })
    }

    fn exprs(&self, items: &[&'a Expr<'a>]) -> &'a [&'a Expr<'a>] {
        self.arena.alloc_slice_copy(items)
    }

    pub fn name(&self, name: &str) -> Sym<'a> {
        Sym {
            span: self.span(),
            name: self.arena.alloc_str(name),
        }
    }

    // Values.

    pub fn int(&self, n: i64) -> &'a Expr<'a> {
        self.alloc(ExprKind::LitNum(n))
    }

    pub fn str(&self, s: &str) -> &'a Expr<'a> {
        let s = self.arena.alloc_str(s);
        self.alloc(ExprKind::LitStr(s))
    }

    pub fn unit(&self) -> &'a Expr<'a> {
        self.alloc(ExprKind::Paren(&[]))
    }

    pub fn sym(&self, name: &str) -> &'a Expr<'a> {
        let sym = self.name(name);
        self.alloc(ExprKind::Sym(sym))
    }

    /// `A/B/x`, given as `["A", "B", "x"]`.
    pub fn path(&self, names: &[&str]) -> &'a Expr<'a> {
        let syms = self
            .arena
            .alloc_slice_fill_iter(names.iter().map(|n| self.name(n)));
        self.alloc(ExprKind::Path(syms))
    }

    pub fn paren(&self, items: &[&'a Expr<'a>]) -> &'a Expr<'a> {
        let items = self.exprs(items);
        self.alloc(ExprKind::Paren(items))
    }

    pub fn bind(&self, name: &str, val: &'a Expr<'a>) -> &'a Expr<'a> {
        let place = Place {
            sym: self.name(name),
            is_tag: false,
            ann: None,
        };
        self.alloc(ExprKind::Bind { place, val })
    }

    pub fn bind_ann(&self, name: &str, ty: &'a Expr<'a>, val: &'a Expr<'a>) -> &'a Expr<'a> {
        let place = Place {
            sym: self.name(name),
            is_tag: false,
            ann: Some(ty),
        };
        self.alloc(ExprKind::Bind { place, val })
    }

    /// `-tag = val`, a tagged element of a struct literal.
    pub fn tag_bind(&self, tag: &str, val: &'a Expr<'a>) -> &'a Expr<'a> {
        let place = Place {
            sym: self.name(tag),
            is_tag: true,
            ann: None,
        };
        self.alloc(ExprKind::Bind { place, val })
    }

    pub fn tag(&self, tag: &str) -> &'a Expr<'a> {
        let sym = self.name(tag);
        self.alloc(ExprKind::Tag(sym))
    }

    pub fn tag_test(&self, expr: &'a Expr<'a>, tag: &str) -> &'a Expr<'a> {
        let tag = self.name(tag);
        self.alloc(ExprKind::TagTest { tag, expr })
    }

    pub fn acc_name(&self, accessee: &'a Expr<'a>, name: &str) -> &'a Expr<'a> {
        let name = self.arena.alloc_str(name);
        self.alloc(ExprKind::Acc {
            accessor: Accessor::Name(name),
            accessee,
        })
    }

    pub fn acc_index(&self, accessee: &'a Expr<'a>, index: usize) -> &'a Expr<'a> {
        self.alloc(ExprKind::Acc {
            accessor: Accessor::Index(index),
            accessee,
        })
    }

    pub fn ann(&self, expr: &'a Expr<'a>, ty: &'a Expr<'a>) -> &'a Expr<'a> {
        self.alloc(ExprKind::Ann { expr, ty })
    }

    pub fn call(&self, callee: &'a Expr<'a>, arg: &'a Expr<'a>) -> &'a Expr<'a> {
        self.alloc(ExprKind::Call { callee, arg })
    }

    pub fn body(&self, stmts: &[&'a Expr<'a>], expr: &'a Expr<'a>) -> Body<'a> {
        Body {
            span: self.span(),
            stmts: self.exprs(stmts),
            expr,
        }
    }

    pub fn do_(&self, stmts: &[&'a Expr<'a>], expr: &'a Expr<'a>) -> &'a Expr<'a> {
        let body = self.body(stmts, expr);
        self.alloc(ExprKind::Do(body))
    }

    /// Function literal; `sig` must be a signature type expression.
    pub fn fn_(&self, sig: &'a Expr<'a>, stmts: &[&'a Expr<'a>], expr: &'a Expr<'a>) -> &'a Expr<'a> {
        let body = self.body(stmts, expr);
        self.alloc(ExprKind::Fn { sig, body })
    }

    pub fn host_val(&self, ty: &'a Expr<'a>, code: &str) -> &'a Expr<'a> {
        let code = self.arena.alloc_str(code);
        self.alloc(ExprKind::HostVal { ty, code })
    }

    pub fn if_(&self, cases: &[(&'a Expr<'a>, &'a Expr<'a>)], dflt: Option<&'a Expr<'a>>) -> &'a Expr<'a> {
        let cases = self
            .arena
            .alloc_slice_fill_iter(cases.iter().map(|&(cond, cons)| Case { cond, cons }));
        self.alloc(ExprKind::If { cases, dflt })
    }

    pub fn and(&self, terms: &[&'a Expr<'a>]) -> &'a Expr<'a> {
        let terms = self.exprs(terms);
        self.alloc(ExprKind::And(terms))
    }

    pub fn or(&self, terms: &[&'a Expr<'a>]) -> &'a Expr<'a> {
        let terms = self.exprs(terms);
        self.alloc(ExprKind::Or(terms))
    }

    // Type expressions.

    pub fn sig(&self, dom: &'a Expr<'a>, ret: &'a Expr<'a>) -> &'a Expr<'a> {
        self.alloc(ExprKind::Sig { dom, ret })
    }

    pub fn union(&self, members: &[&'a Expr<'a>]) -> &'a Expr<'a> {
        let members = self.exprs(members);
        self.alloc(ExprKind::Union(members))
    }

    pub fn type_var(&self, name: &str) -> &'a Expr<'a> {
        let sym = self.name(name);
        self.alloc(ExprKind::TypeVar(sym))
    }

    /// `label:T` inside a struct type.
    pub fn field_ty(&self, label: &str, ty: &'a Expr<'a>) -> &'a Expr<'a> {
        let label = self.sym(label);
        self.ann(label, ty)
    }

    /// `-tag:T` inside a struct type.
    pub fn variant_ty(&self, tag: &str, ty: &'a Expr<'a>) -> &'a Expr<'a> {
        let tag = self.tag(tag);
        self.ann(tag, ty)
    }

    // Definitions.

    pub fn def_bind(&self, name: &str, val: &'a Expr<'a>) -> Def<'a> {
        Def::Bind {
            place: Place {
                sym: self.name(name),
                is_tag: false,
                ann: None,
            },
            val,
        }
    }

    pub fn def_bind_ann(&self, name: &str, ty: &'a Expr<'a>, val: &'a Expr<'a>) -> Def<'a> {
        Def::Bind {
            place: Place {
                sym: self.name(name),
                is_tag: false,
                ann: Some(ty),
            },
            val,
        }
    }

    pub fn def_morph(&self, name: &str, val: &'a Expr<'a>) -> Def<'a> {
        Def::Morph {
            sym: self.name(name),
            val,
        }
    }

    pub fn def_host_type(&self, name: &str) -> Def<'a> {
        Def::HostType {
            sym: self.name(name),
        }
    }

    pub fn def_alias(&self, name: &str, ty: &'a Expr<'a>) -> Def<'a> {
        Def::Alias {
            sym: self.name(name),
            ty,
        }
    }

    /// `in A/B` block; an empty path means the root space.
    pub fn in_(&self, path: &[&str], defs: Vec<Def<'a>>) -> In<'a> {
        In {
            path: self
                .arena
                .alloc_slice_fill_iter(path.iter().map(|n| self.name(n))),
            defs: self.arena.alloc_slice_fill_iter(defs),
        }
    }

    pub fn program(&self, ins: Vec<In<'a>>, main: Body<'a>) -> &'a Program<'a> {
        self.arena.alloc(Program {
            ins: self.arena.alloc_slice_fill_iter(ins),
            main,
        })
    }
}
