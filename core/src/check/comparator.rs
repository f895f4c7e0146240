//! Structural comparison of an actual type against an expected one.

use super::unify::Unifier;
use super::verdict::{Incompatibility, Verdict};
use crate::syntax::Accessor;
use crate::types::{Field, TypeId, TypeKind, TypeStore};

impl<'a> Unifier<'a> {
    /// Compares `actual` against `expected`, binding free placeholders on
    /// either side as a side effect.
    pub fn compare(&mut self, actual: TypeId, expected: TypeId) -> Verdict {
        let act = self.resolve(actual);
        let exp = self.resolve(expected);
        if act == exp {
            return Verdict::Exact;
        }
        let store = self.store;
        let never = store.never();

        match (*store.kind(act), *store.kind(exp)) {
            // A divergent branch must not decide another branch's type.
            (_, TypeKind::Free(e)) if act == never => {
                self.defer_never(e);
                Verdict::FreeBound
            }
            (TypeKind::Free(a), TypeKind::Free(e)) => {
                if a > e {
                    self.bind(a, exp);
                } else {
                    self.bind(e, act);
                }
                Verdict::FreeBound
            }
            (TypeKind::Free(a), _) => {
                self.bind(a, exp);
                Verdict::FreeBound
            }
            (_, TypeKind::Free(e)) => {
                self.bind(e, act);
                Verdict::FreeBound
            }
            _ if act == never => Verdict::Subtype,
            (TypeKind::Union(members), _) => {
                let mut verdict = Verdict::Subtype;
                for &member in members {
                    match self.compare(member, exp) {
                        Verdict::Incompatible(_) => {
                            return Verdict::Incompatible(Incompatibility::UnionMemberMissing);
                        }
                        v => verdict = verdict.combine(v),
                    }
                }
                verdict
            }
            (_, TypeKind::Union(members)) => {
                if members.contains(&act) {
                    Verdict::Subtype
                } else {
                    Verdict::Incompatible(Incompatibility::NotInUnion)
                }
            }
            _ if exp == store.any() => Verdict::Subtype,
            _ if exp == store.void() => Verdict::Incompatible(Incompatibility::UnitRequiresExact),
            (TypeKind::Struct { .. }, TypeKind::Struct { .. }) => self.compare_structs(act, exp),
            (TypeKind::Sig { dom: ad, ret: ar }, TypeKind::Sig { dom: ed, ret: er }) => {
                // Domain first, reversed.
                let dom = self.compare(ed, ad);
                if !dom.is_compatible() {
                    return dom;
                }
                let ret = self.compare(ar, er);
                if !ret.is_compatible() {
                    return ret;
                }
                dom.combine(ret)
            }
            (TypeKind::Struct { variants, .. }, TypeKind::VariantMember(field)) => {
                match variants.iter().find(|v| v.label == field.label) {
                    Some(variant) => self.compare(variant.ty, field.ty),
                    None => Verdict::Incompatible(Incompatibility::StructMissingMatchingVariant {
                        tag: field.label.to_string(),
                    }),
                }
            }
            _ => Verdict::Incompatible(Incompatibility::Incomparable),
        }
    }

    fn compare_structs(&mut self, act: TypeId, exp: TypeId) -> Verdict {
        let store = self.store;
        let (a_pos, a_labs, a_vars) = struct_parts(store, act);
        let (e_pos, e_labs, e_vars) = struct_parts(store, exp);
        let mut verdict = Verdict::Exact;
        // Any difference in layout means the value must be rebuilt.
        let reshaped = a_pos.len() != e_pos.len()
            || a_labs.len() != e_labs.len()
            || a_labs.iter().zip(e_labs).any(|(a, e)| a.label != e.label)
            || a_vars.len() != e_vars.len();

        if e_pos.len() > a_pos.len() {
            return Verdict::Incompatible(Incompatibility::StructMissingPositionalField {
                index: a_pos.len(),
            });
        }
        for (&a, &e) in a_pos.iter().zip(e_pos) {
            match self.compare(a, e) {
                v @ Verdict::Incompatible(_) => return v,
                v => verdict = verdict.combine(v),
            }
        }

        let mut next_pos = e_pos.len();
        let mut used = vec![false; a_labs.len()];
        for e_field in e_labs {
            let source = if next_pos < a_pos.len() {
                next_pos += 1;
                a_pos[next_pos - 1]
            } else if let Some(j) = a_labs
                .iter()
                .enumerate()
                .position(|(j, f)| !used[j] && f.label == e_field.label)
            {
                used[j] = true;
                a_labs[j].ty
            } else {
                return Verdict::Incompatible(match a_labs.iter().enumerate().find(|(j, _)| !used[*j]) {
                    Some((_, found)) => Incompatibility::StructLabelMismatch {
                        expected: e_field.label.to_string(),
                        found: found.label.to_string(),
                    },
                    None => Incompatibility::StructMissingLabeledField {
                        label: e_field.label.to_string(),
                    },
                });
            };
            match self.compare(source, e_field.ty) {
                v @ Verdict::Incompatible(_) => return v,
                v => verdict = verdict.combine(v),
            }
        }

        if next_pos < a_pos.len() {
            return Verdict::Incompatible(Incompatibility::StructExtraneousPositionalField {
                index: next_pos,
            });
        }
        if let Some((_, extra)) = a_labs.iter().enumerate().find(|(j, _)| !used[*j]) {
            return Verdict::Incompatible(Incompatibility::StructExtraneousLabeledField {
                label: extra.label.to_string(),
            });
        }

        for a_var in a_vars {
            let Some(e_var) = e_vars.iter().find(|v| v.label == a_var.label) else {
                return Verdict::Incompatible(Incompatibility::StructTagNotInDestinationVariants {
                    tag: a_var.label.to_string(),
                });
            };
            match self.compare(a_var.ty, e_var.ty) {
                v @ Verdict::Incompatible(_) => return v,
                v => verdict = verdict.combine(v),
            }
        }

        if reshaped {
            verdict.combine(Verdict::Subtype)
        } else {
            verdict
        }
    }
}

fn struct_parts<'a>(
    store: &TypeStore<'a>,
    ty: TypeId,
) -> (&'a [TypeId], &'a [Field<'a>], &'a [Field<'a>]) {
    match *store.kind(ty) {
        TypeKind::Struct {
            pos,
            labs,
            variants,
        } => (pos, labs, variants),
        _ => (&[], &[], &[]),
    }
}

/// Where a destination field of a struct conversion reads its value from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSource<'a> {
    pub source: Accessor<'a>,
    pub src_ty: TypeId,
    pub dst_ty: TypeId,
}

/// Pairs every positional and labeled field of `dst` with the field of `src`
/// it is read from, in destination order.
///
/// Both types must already have compared compatible.
pub fn align_fields<'a>(store: &TypeStore<'a>, src: TypeId, dst: TypeId) -> Vec<FieldSource<'a>> {
    let (s_pos, s_labs, _) = struct_parts(store, src);
    let (d_pos, d_labs, _) = struct_parts(store, dst);
    let mut sources = Vec::with_capacity(d_pos.len() + d_labs.len());
    for (i, &dst_ty) in d_pos.iter().enumerate() {
        if let Some(&src_ty) = s_pos.get(i) {
            sources.push(FieldSource {
                source: Accessor::Index(i),
                src_ty,
                dst_ty,
            });
        }
    }
    let mut next_pos = d_pos.len();
    for field in d_labs {
        if next_pos < s_pos.len() {
            sources.push(FieldSource {
                source: Accessor::Index(next_pos),
                src_ty: s_pos[next_pos],
                dst_ty: field.ty,
            });
            next_pos += 1;
        } else if let Some(src_field) = s_labs.iter().find(|f| f.label == field.label) {
            sources.push(FieldSource {
                source: Accessor::Name(src_field.label),
                src_ty: src_field.ty,
                dst_ty: field.ty,
            });
        }
    }
    sources
}
