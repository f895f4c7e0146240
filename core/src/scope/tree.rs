use hashbrown::HashMap;

use super::record::{BindingRecord, RecordKind, mangle};
use crate::errors::{ScopeError, ScopeErrorKind};
use crate::syntax::{Def, Span, Sym};
use crate::types::TypeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Space,
    Local,
    Fn,
}

/// Definitions waiting for their first reference.
#[derive(Debug)]
pub enum PendingDef<'a> {
    Single(&'a Def<'a>),
    /// Every morph of one family declared in the space.
    Family(Vec<&'a Def<'a>>),
}

struct Scope<'a> {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: HashMap<&'a str, BindingRecord>,
    pending: HashMap<&'a str, PendingDef<'a>>,
    // `A__B__` for space `A/B`; locals inherit their space's prefix.
    host_prefix: String,
    // `A/B`, empty for ROOT.
    path: String,
}

pub struct ScopeTree<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> ScopeTree<'a> {
    /// Creates the tree with a populated root space.
    pub fn new(store: &TypeStore<'a>) -> Self {
        let mut tree = Self {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Space,
                bindings: HashMap::new(),
                pending: HashMap::new(),
                host_prefix: String::new(),
                path: String::new(),
            }],
        };
        let root = &mut tree.scopes[0].bindings;
        let builtin = |kind| BindingRecord::new("", kind, Span::default());
        root.insert("ROOT", builtin(RecordKind::Space(ScopeId::ROOT)));
        for (name, ty) in [
            ("Bool", store.bool()),
            ("Int", store.int()),
            ("Str", store.str()),
            ("Never", store.never()),
            ("Any", store.any()),
            ("Namespace", store.namespace()),
            ("Type", store.type_()),
        ] {
            root.insert(name, builtin(RecordKind::Type(ty)));
        }
        for name in ["true", "false"] {
            root.insert(
                name,
                BindingRecord::new(name, RecordKind::Val(store.bool()), Span::default()),
            );
        }
        tree
    }

    pub fn child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let host_prefix = self.scopes[parent.0].host_prefix.clone();
        let path = self.scopes[parent.0].path.clone();
        self.push(Scope {
            parent: Some(parent),
            kind,
            bindings: HashMap::new(),
            pending: HashMap::new(),
            host_prefix,
            path,
        })
    }

    fn push(&mut self, scope: Scope<'a>) -> ScopeId {
        self.scopes.push(scope);
        ScopeId(self.scopes.len() - 1)
    }

    /// Returns the space at `path`, creating missing spaces along the way.
    pub fn space_path(&mut self, path: &'a [Sym<'a>]) -> Result<ScopeId, ScopeError> {
        let mut current = ScopeId::ROOT;
        for seg in path {
            current = match self.scopes[current.0].bindings.get(seg.name) {
                Some(BindingRecord {
                    kind: RecordKind::Space(id),
                    ..
                }) => *id,
                Some(other) => {
                    return Err(ScopeError::new(
                        ScopeErrorKind::ExpectedNamespace {
                            name: seg.name.to_string(),
                            found: other.kind_name(),
                        },
                        seg.span.clone(),
                    ));
                }
                None => self.new_space(current, seg)?,
            };
        }
        Ok(current)
    }

    fn new_space(&mut self, parent: ScopeId, seg: &'a Sym<'a>) -> Result<ScopeId, ScopeError> {
        if let Some(def) = self.scopes[parent.0].pending.get(seg.name) {
            return Err(redefinition(seg, pending_span(def)));
        }
        let parent_scope = &self.scopes[parent.0];
        let host_prefix = format!("{}{}__", parent_scope.host_prefix, mangle(seg.name));
        let path = if parent_scope.path.is_empty() {
            seg.name.to_string()
        } else {
            format!("{}/{}", parent_scope.path, seg.name)
        };
        let id = self.push(Scope {
            parent: Some(parent),
            kind: ScopeKind::Space,
            bindings: HashMap::new(),
            pending: HashMap::new(),
            host_prefix,
            path,
        });
        self.scopes[parent.0].bindings.insert(
            seg.name,
            BindingRecord::new("", RecordKind::Space(id), seg.span.clone()),
        );
        Ok(id)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }

    pub fn host_prefix(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].host_prefix
    }

    /// `/`-separated path of the enclosing space, empty for ROOT.
    pub fn path(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].path
    }

    pub fn get_local(&self, scope: ScopeId, name: &str) -> Option<&BindingRecord> {
        self.scopes[scope.0].bindings.get(name)
    }

    pub fn has_pending(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].pending.contains_key(name)
    }

    /// Binds `name` in `scope`. Only a forward placeholder may be overwritten.
    pub fn add_record(
        &mut self,
        scope: ScopeId,
        name: &'a str,
        record: BindingRecord,
    ) -> Result<(), ScopeError> {
        let bindings = &mut self.scopes[scope.0].bindings;
        if let Some(existing) = bindings.get(name).filter(|r| r.kind != RecordKind::Fwd) {
            return Err(ScopeError::new(
                ScopeErrorKind::Redefinition {
                    name: name.to_string(),
                    previous: existing.span.clone(),
                },
                record.span,
            ));
        }
        bindings.insert(name, record);
        Ok(())
    }

    pub fn replace_record(&mut self, scope: ScopeId, name: &'a str, record: BindingRecord) {
        self.scopes[scope.0].bindings.insert(name, record);
    }

    /// Queues a definition of a space for compilation on first reference.
    ///
    /// Morphs sharing a name are collected into one family; any other
    /// repeated name is a redefinition.
    pub fn add_pending(&mut self, scope: ScopeId, def: &'a Def<'a>) -> Result<(), ScopeError> {
        let sym = def.sym();
        let space = &mut self.scopes[scope.0];
        if let Some(existing) = space.bindings.get(sym.name) {
            return Err(redefinition(sym, existing.span.clone()));
        }
        match (space.pending.get_mut(sym.name), def) {
            (None, Def::Morph { .. }) => {
                space.pending.insert(sym.name, PendingDef::Family(vec![def]));
            }
            (None, _) => {
                space.pending.insert(sym.name, PendingDef::Single(def));
            }
            (Some(PendingDef::Family(morphs)), Def::Morph { .. }) => morphs.push(def),
            (Some(existing), _) => return Err(redefinition(sym, pending_span(existing))),
        }
        Ok(())
    }

    pub fn take_pending(&mut self, scope: ScopeId, name: &str) -> Option<PendingDef<'a>> {
        self.scopes[scope.0].pending.remove(name)
    }
}

fn pending_span(def: &PendingDef<'_>) -> Span {
    match def {
        PendingDef::Single(def) => def.sym().span.clone(),
        PendingDef::Family(defs) => defs
            .first()
            .map(|d| d.sym().span.clone())
            .unwrap_or_default(),
    }
}

fn redefinition(sym: &Sym<'_>, previous: Span) -> ScopeError {
    ScopeError::new(
        ScopeErrorKind::Redefinition {
            name: sym.name.to_string(),
            previous,
        },
        sym.span.clone(),
    )
}
