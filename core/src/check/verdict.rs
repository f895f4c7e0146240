/// Outcome of comparing an actual type against an expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Exact,
    /// A free placeholder on one side was bound.
    FreeBound,
    /// Compatible but structurally different; the value needs a conversion.
    Subtype,
    Incompatible(Incompatibility),
}

impl Verdict {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Verdict::Incompatible(_))
    }

    fn rank(&self) -> u8 {
        match self {
            Verdict::Exact => 0,
            Verdict::FreeBound => 1,
            Verdict::Subtype => 2,
            Verdict::Incompatible(_) => 3,
        }
    }

    /// The strictly worse of two compatible verdicts.
    pub fn combine(self, other: Verdict) -> Verdict {
        if other.rank() > self.rank() { other } else { self }
    }
}

/// Named reasons two types cannot be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Incompatibility {
    #[error("a member of the actual union is not accepted by the expected type")]
    UnionMemberMissing,
    #[error("actual type is not a member of the expected union")]
    NotInUnion,
    #[error("missing positional field {index}")]
    StructMissingPositionalField { index: usize },
    #[error("missing labeled field `{label}`")]
    StructMissingLabeledField { label: String },
    #[error("expected label `{expected}`, found `{found}`")]
    StructLabelMismatch { expected: String, found: String },
    #[error("extraneous positional field {index}")]
    StructExtraneousPositionalField { index: usize },
    #[error("extraneous labeled field `{label}`")]
    StructExtraneousLabeledField { label: String },
    #[error("tag `-{tag}` is not among the expected variants")]
    StructTagNotInDestinationVariants { tag: String },
    #[error("no variant `-{tag}` in the actual type")]
    StructMissingMatchingVariant { tag: String },
    #[error("the unit type only accepts an exact match")]
    UnitRequiresExact,
    #[error("types are not comparable")]
    Incomparable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_combine_takes_the_worse_verdict() {
        assert_eq!(Verdict::Exact.combine(Verdict::FreeBound), Verdict::FreeBound);
        assert_eq!(Verdict::Subtype.combine(Verdict::FreeBound), Verdict::Subtype);
        assert_eq!(Verdict::Exact.combine(Verdict::Exact), Verdict::Exact);
    }
}
