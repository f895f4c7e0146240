use crate::syntax::Accessor;

/// Handle to a canonical type record in a [`TypeStore`](super::TypeStore).
///
/// Equality is identity: two handles are equal iff they denote the same
/// interned record. The index is creation-ordered and doubles as a stable
/// ordering key for emitted names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A labeled struct member: either a labeled field or a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field<'a> {
    pub label: &'a str,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind<'a> {
    Prim(&'a str),
    /// Unification placeholder, numbered within one inference session.
    Free(u32),
    Struct {
        pos: &'a [TypeId],
        labs: &'a [Field<'a>],
        variants: &'a [Field<'a>],
    },
    /// Members are flattened, deduplicated and sorted by descriptor.
    Union(&'a [TypeId]),
    Sig {
        dom: TypeId,
        ret: TypeId,
    },
    Host(&'a str),
    Var(&'a str),
    Prop {
        accessor: Accessor<'a>,
        base: TypeId,
    },
    /// Expectation that a struct carries the given variant.
    VariantMember(Field<'a>),
    /// Type of a reference to a polymorphic family; members are morph signatures.
    Poly(&'a [TypeId]),
}

impl<'a> TypeKind<'a> {
    pub fn is_free(&self) -> bool {
        matches!(self, TypeKind::Free(_))
    }

    pub fn as_sig(&self) -> Option<(TypeId, TypeId)> {
        match *self {
            TypeKind::Sig { dom, ret } => Some((dom, ret)),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&'a [TypeId]> {
        match *self {
            TypeKind::Union(members) => Some(members),
            _ => None,
        }
    }

    /// Field types in storage order: positional, labeled, then variants.
    pub fn children(&self) -> Vec<TypeId> {
        match *self {
            TypeKind::Prim(_) | TypeKind::Free(_) | TypeKind::Host(_) | TypeKind::Var(_) => {
                Vec::new()
            }
            TypeKind::Struct {
                pos,
                labs,
                variants,
            } => pos
                .iter()
                .copied()
                .chain(labs.iter().map(|f| f.ty))
                .chain(variants.iter().map(|f| f.ty))
                .collect(),
            TypeKind::Union(members) | TypeKind::Poly(members) => members.to_vec(),
            TypeKind::Sig { dom, ret } => vec![dom, ret],
            TypeKind::Prop { base, .. } => vec![base],
            TypeKind::VariantMember(field) => vec![field.ty],
        }
    }
}

/// Interned record behind a [`TypeId`].
#[derive(Debug)]
pub struct TypeRecord<'a> {
    pub id: TypeId,
    pub descriptor: &'a str,
    pub kind: TypeKind<'a>,
    /// No free, property or type-variable component anywhere inside.
    pub is_concrete: bool,
}
