//! # Relation Sets
//!
//! A `RelationSet` records which base relations of a query have been combined into
//! a (sub-)join result. Bit *i* is set iff the relation assigned index *i* by the
//! ground-truth header participates. The same encoding keys the ground-truth
//! cardinality records, so a set computed while walking a join tree can be looked
//! up directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Highest number of relations a single query instance may name.
pub const MAX_RELATIONS: usize = u64::BITS as usize;

/// Bitmask of base relations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RelationSet(u64);

impl RelationSet {
    pub const EMPTY: RelationSet = RelationSet(0);

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The singleton set for the relation with the given index.
    ///
    /// Returns `None` when the index does not fit in the mask.
    pub fn single(index: u32) -> Option<Self> {
        1u64.checked_shl(index).map(Self)
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl BitOr for RelationSet {
    type Output = RelationSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for RelationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_union() {
        let a = RelationSet::single(0).unwrap();
        let b = RelationSet::single(1).unwrap();
        assert_eq!(a.bits(), 1);
        assert_eq!(b.bits(), 2);
        assert_eq!((a | b).bits(), 3);
        assert_eq!((a | a).bits(), 1);
        assert_eq!((RelationSet::EMPTY | b).bits(), 2);
    }

    #[test]
    fn test_single_out_of_range() {
        assert!(RelationSet::single(63).is_some());
        assert!(RelationSet::single(64).is_none());
    }
}
