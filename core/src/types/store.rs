use core::cell::RefCell;
use core::fmt::Write;

use bumpalo::Bump;
use hashbrown::{DefaultHashBuilder, HashMap};

use super::ty::{Field, TypeId, TypeKind, TypeRecord};
use crate::errors::InternalError;
use crate::syntax::Accessor;

/// Interner for structural types.
///
/// Every type is identified by a canonical descriptor string. Asking for a
/// type whose descriptor is already known returns the existing [`TypeId`],
/// so identity comparison is all the rest of the compiler ever needs.
/// Free types are the exception: each call to [`TypeStore::free`] creates a
/// new record that is never looked up by descriptor.
pub struct TypeStore<'a> {
    // Arena holding every record and slice owned by this store.
    arena: &'a Bump,
    interned_strs: RefCell<HashMap<&'a str, &'a str, DefaultHashBuilder, &'a Bump>>,
    interned: RefCell<HashMap<&'a str, TypeId, DefaultHashBuilder, &'a Bump>>,
    records: RefCell<Vec<&'a TypeRecord<'a>>>,
}

impl<'a> TypeStore<'a> {
    pub fn new(arena: &'a Bump) -> &'a Self {
        arena.alloc(Self {
            arena,
            interned_strs: RefCell::new(HashMap::new_in(arena)),
            interned: RefCell::new(HashMap::new_in(arena)),
            records: RefCell::new(Vec::new()),
        })
    }

    pub fn intern_str(&self, s: &str) -> &'a str {
        if let Some(&interned_str) = self.interned_strs.borrow().get(s) {
            return interned_str;
        }
        let arena_str = self.arena.alloc_str(s);
        self.interned_strs.borrow_mut().insert(arena_str, arena_str);
        arena_str
    }

    pub fn get(&self, id: TypeId) -> &'a TypeRecord<'a> {
        self.records.borrow()[id.0 as usize]
    }

    pub fn kind(&self, id: TypeId) -> &'a TypeKind<'a> {
        &self.get(id).kind
    }

    pub fn descriptor(&self, id: TypeId) -> &'a str {
        self.get(id).descriptor
    }

    pub fn is_concrete(&self, id: TypeId) -> bool {
        self.get(id).is_concrete
    }

    /// Number of records created so far, free types included.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, descriptor: &str) -> Option<TypeId> {
        self.interned.borrow().get(descriptor).copied()
    }

    /// Returns the type registered under `descriptor`, building and
    /// registering it on first use.
    ///
    /// `build` runs only for unknown descriptors. If building registers the
    /// same descriptor with a different structure (or it was already bound to
    /// another structure), that is an invariant violation.
    pub fn intern(
        &self,
        descriptor: &str,
        build: impl FnOnce(&Self) -> TypeKind<'a>,
    ) -> Result<TypeId, InternalError> {
        if let Some(id) = self.lookup(descriptor) {
            return Ok(id);
        }
        let kind = build(self);
        if let Some(id) = self.lookup(descriptor) {
            if *self.kind(id) != kind {
                return Err(InternalError::DuplicateDescriptor {
                    descriptor: descriptor.to_string(),
                });
            }
            return Ok(id);
        }
        Ok(self.insert(descriptor, kind))
    }

    fn insert(&self, descriptor: &str, kind: TypeKind<'a>) -> TypeId {
        let descriptor = self.arena.alloc_str(descriptor);
        let id = self.push(descriptor, kind);
        self.interned.borrow_mut().insert(descriptor, id);
        id
    }

    fn push(&self, descriptor: &'a str, kind: TypeKind<'a>) -> TypeId {
        let is_concrete = match kind {
            TypeKind::Free(_) | TypeKind::Var(_) | TypeKind::Prop { .. } => false,
            _ => kind.children().into_iter().all(|c| self.is_concrete(c)),
        };
        let mut records = self.records.borrow_mut();
        let id = TypeId(u32::try_from(records.len()).unwrap_or(u32::MAX));
        records.push(self.arena.alloc(TypeRecord {
            id,
            descriptor,
            kind,
            is_concrete,
        }));
        id
    }

    // Descriptor-derived factories; they cannot collide, so they are infallible.
    fn get_or_insert(&self, descriptor: String, kind: TypeKind<'a>) -> TypeId {
        match self.lookup(&descriptor) {
            Some(id) => id,
            None => self.insert(&descriptor, kind),
        }
    }

    pub fn prim(&self, name: &str) -> TypeId {
        let name = self.intern_str(name);
        self.get_or_insert(name.to_string(), TypeKind::Prim(name))
    }

    pub fn bool(&self) -> TypeId {
        self.prim("Bool")
    }

    pub fn int(&self) -> TypeId {
        self.prim("Int")
    }

    pub fn str(&self) -> TypeId {
        self.prim("Str")
    }

    pub fn namespace(&self) -> TypeId {
        self.prim("Namespace")
    }

    pub fn type_(&self) -> TypeId {
        self.prim("Type")
    }

    /// Bottom: the type of expressions that never return.
    pub fn never(&self) -> TypeId {
        self.prim("Never")
    }

    /// Top: accepts any value.
    pub fn any(&self) -> TypeId {
        self.prim("Any")
    }

    /// The unit type, an empty struct.
    pub fn void(&self) -> TypeId {
        self.struct_type(&[], &[], &[])
    }

    pub fn free(&self, index: u32) -> TypeId {
        let next = self.len();
        let descriptor = self.arena.alloc_str(&format!("*{}", next));
        self.push(descriptor, TypeKind::Free(index))
    }

    pub fn host(&self, name: &str) -> TypeId {
        let name = self.intern_str(name);
        self.get_or_insert(format!("Host[{}]", name), TypeKind::Host(name))
    }

    pub fn type_var(&self, name: &str) -> TypeId {
        let name = self.intern_str(name);
        self.get_or_insert(format!("'{}", name), TypeKind::Var(name))
    }

    pub fn sig(&self, dom: TypeId, ret: TypeId) -> TypeId {
        let mut descriptor = String::new();
        if matches!(self.kind(dom), TypeKind::Sig { .. }) {
            let _ = write!(descriptor, "<{}>", self.descriptor(dom));
        } else {
            descriptor.push_str(self.descriptor(dom));
        }
        let _ = write!(descriptor, "%{}", self.descriptor(ret));
        self.get_or_insert(descriptor, TypeKind::Sig { dom, ret })
    }

    /// Struct with positional fields, then labeled fields, then variants.
    ///
    /// Variants form a set and are stored sorted by label; field order is
    /// significant and kept as given.
    pub fn struct_type(
        &self,
        pos: &[TypeId],
        labs: &[(&str, TypeId)],
        variants: &[(&str, TypeId)],
    ) -> TypeId {
        let labs: Vec<Field<'a>> = labs
            .iter()
            .map(|&(label, ty)| self.field(label, ty))
            .collect();
        let mut variants: Vec<Field<'a>> = variants
            .iter()
            .map(|&(label, ty)| self.field(label, ty))
            .collect();
        variants.sort_by_key(|f| f.label);

        let mut parts: Vec<String> = pos.iter().map(|&t| self.descriptor(t).to_string()).collect();
        parts.extend(
            labs.iter()
                .map(|f| format!("{}:{}", f.label, self.descriptor(f.ty))),
        );
        parts.extend(
            variants
                .iter()
                .map(|f| format!("-{}:{}", f.label, self.descriptor(f.ty))),
        );
        let descriptor = format!("({})", parts.join(" "));
        if let Some(id) = self.lookup(&descriptor) {
            return id;
        }
        let kind = TypeKind::Struct {
            pos: self.arena.alloc_slice_copy(pos),
            labs: self.arena.alloc_slice_copy(&labs),
            variants: self.arena.alloc_slice_copy(&variants),
        };
        self.insert(&descriptor, kind)
    }

    /// Union of `members`; nested unions are flattened and a single
    /// surviving member is returned as-is.
    pub fn union(&self, members: &[TypeId]) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::with_capacity(members.len());
        for &m in members {
            match self.kind(m) {
                TypeKind::Union(inner) => flat.extend_from_slice(inner),
                _ => flat.push(m),
            }
        }
        flat.sort_by_key(|&t| self.descriptor(t));
        flat.dedup();
        match flat.as_slice() {
            [] => return self.never(),
            [single] => return *single,
            _ => {}
        }
        let descriptor = self.bracketed("Union", &flat);
        if let Some(id) = self.lookup(&descriptor) {
            return id;
        }
        let kind = TypeKind::Union(self.arena.alloc_slice_copy(&flat));
        self.insert(&descriptor, kind)
    }

    pub fn prop(&self, accessor: Accessor<'_>, base: TypeId) -> TypeId {
        let accessor = match accessor {
            Accessor::Index(i) => Accessor::Index(i),
            Accessor::Name(n) => Accessor::Name(self.intern_str(n)),
        };
        let descriptor = format!("<{}>.{}", self.descriptor(base), accessor);
        self.get_or_insert(descriptor, TypeKind::Prop { accessor, base })
    }

    pub fn variant_member(&self, label: &str, ty: TypeId) -> TypeId {
        let field = self.field(label, ty);
        let descriptor = format!("Variant[-{}:{}]", field.label, self.descriptor(ty));
        self.get_or_insert(descriptor, TypeKind::VariantMember(field))
    }

    pub fn poly(&self, sigs: &[TypeId]) -> TypeId {
        let mut sigs = sigs.to_vec();
        sigs.sort_by_key(|&t| self.descriptor(t));
        sigs.dedup();
        let descriptor = self.bracketed("Poly", &sigs);
        if let Some(id) = self.lookup(&descriptor) {
            return id;
        }
        let kind = TypeKind::Poly(self.arena.alloc_slice_copy(&sigs));
        self.insert(&descriptor, kind)
    }

    fn field(&self, label: &str, ty: TypeId) -> Field<'a> {
        Field {
            label: self.intern_str(label),
            ty,
        }
    }

    fn bracketed(&self, head: &str, members: &[TypeId]) -> String {
        let inner: Vec<&str> = members.iter().map(|&m| self.descriptor(m)).collect();
        format!("{}[{}]", head, inner.join(" "))
    }
}
