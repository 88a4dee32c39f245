//! The design philosophy underlying `isn_sharing` is pedagogical, yet mathematically rigorous.
//! Each module encapsulates one discrete concept of secret sharing over monotone access
//! structures, illustrating how modest abstractions compose into a cohesive sharing engine.
//!
//! This crate aspires to bridge gaps between theoretical exposition and practical engineering,
//! serving both as a didactic resource and a foundation for threshold cryptography research.
//! Compact sets of party identifiers.
//!
//! Party identifiers live in `[1, 64]` and a set of them fits in a single
//! 64-bit word: identifier `i` occupies bit `i - 1`.  Two flavours share the
//! same read-only API:
//!
//! * [`BitSet`] is the mutable builder used for in-place construction.
//! * [`ImmutableBitSet`] is a frozen `Copy` value, hashable and ordered, used
//!   as a clause key and as a coalition description.
//!
//! [`BitSet::freeze`] and [`ImmutableBitSet::unfreeze`] convert between the
//! two without aliasing, since both are plain words.

use crate::errors::SharingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;

/// Identifier of a shareholder.  Valid identifiers are `1..=64`.
pub type PartyId = u64;

/// Largest identifier a bitset can hold.
pub const MAX_PARTY_ID: PartyId = 64;

/// A clause of an access structure (a maximal unqualified or minimal
/// qualified set).
pub type Clause = ImmutableBitSet;

#[inline]
fn bit(id: PartyId) -> u64 {
    assert!(
        (1..=MAX_PARTY_ID).contains(&id),
        "party id {id} outside [1, {MAX_PARTY_ID}]"
    );
    1u64 << (id - 1)
}

#[inline]
fn try_bit(id: PartyId) -> Result<u64, SharingError> {
    if (1..=MAX_PARTY_ID).contains(&id) {
        Ok(1u64 << (id - 1))
    } else {
        Err(SharingError::Membership(format!(
            "party id {id} outside [1, {MAX_PARTY_ID}]"
        )))
    }
}

macro_rules! set_queries {
    ($ty:ident) => {
        impl $ty {
            /// Returns the backing word.
            #[inline]
            pub fn bits(&self) -> u64 {
                self.0
            }

            /// Returns true if `id` is a member.  Identifiers outside
            /// `[1, 64]` are never members.
            #[inline]
            pub fn contains(&self, id: PartyId) -> bool {
                (1..=MAX_PARTY_ID).contains(&id) && self.0 & (1u64 << (id - 1)) != 0
            }

            /// Number of members.
            #[inline]
            pub fn size(&self) -> usize {
                self.0.count_ones() as usize
            }

            /// Returns true if the set has no members.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Iterates over the members in ascending order.
            pub fn iter(&self) -> Iter {
                Iter { word: self.0 }
            }

            /// Members in ascending order.
            pub fn to_vec(&self) -> Vec<PartyId> {
                self.iter().collect()
            }

            /// Lowest member, if any.
            #[inline]
            pub fn first(&self) -> Option<PartyId> {
                if self.0 == 0 {
                    None
                } else {
                    Some(self.0.trailing_zeros() as PartyId + 1)
                }
            }

            /// `self ∪ other`.
            #[inline]
            pub fn union(&self, other: &Self) -> Self {
                Self(self.0 | other.0)
            }

            /// `self ∩ other`.
            #[inline]
            pub fn intersection(&self, other: &Self) -> Self {
                Self(self.0 & other.0)
            }

            /// `self \ other`.
            #[inline]
            pub fn difference(&self, other: &Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Members of exactly one of the two sets.
            #[inline]
            pub fn symmetric_difference(&self, other: &Self) -> Self {
                Self(self.0 ^ other.0)
            }

            /// Returns true if every member of `self` is in `other`.
            #[inline]
            pub fn is_subset(&self, other: &Self) -> bool {
                self.0 & !other.0 == 0
            }

            /// Subset and not equal.
            #[inline]
            pub fn is_proper_subset(&self, other: &Self) -> bool {
                self.is_subset(other) && self.0 != other.0
            }

            /// Returns true if every member of `other` is in `self`.
            #[inline]
            pub fn is_superset(&self, other: &Self) -> bool {
                other.is_subset(self)
            }

            /// Superset and not equal.
            #[inline]
            pub fn is_proper_superset(&self, other: &Self) -> bool {
                other.is_proper_subset(self)
            }

            /// Enumerates all `2^size` subsets, ending with the empty set.
            pub fn iter_subsets(&self) -> SubSets {
                SubSets {
                    full: self.0,
                    next: Some(self.0),
                }
            }

            /// Collects the power set.
            pub fn subsets(&self) -> Vec<ImmutableBitSet> {
                self.iter_subsets().collect()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("{")?;
                for (i, id) in self.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("}")
            }
        }

        impl<'a> IntoIterator for &'a $ty {
            type Item = PartyId;
            type IntoIter = Iter;

            fn into_iter(self) -> Iter {
                self.iter()
            }
        }
    };
}

/// Mutable set of party identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitSet(u64);

/// Frozen set of party identifiers, usable as a map key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImmutableBitSet(u64);

set_queries!(BitSet);
set_queries!(ImmutableBitSet);

impl BitSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(0)
    }

    /// Creates a set holding `ids`.
    ///
    /// # Panics
    ///
    /// Panics if any identifier is outside `[1, 64]`.
    pub fn from_ids(ids: &[PartyId]) -> Self {
        let mut set = Self::new();
        set.add_all(ids);
        set
    }

    /// Inserts `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside `[1, 64]`.
    #[inline]
    pub fn add(&mut self, id: PartyId) {
        self.0 |= bit(id);
    }

    /// Inserts every identifier in `ids`.
    pub fn add_all(&mut self, ids: &[PartyId]) {
        for &id in ids {
            self.add(id);
        }
    }

    /// Removes `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside `[1, 64]`.
    #[inline]
    pub fn remove(&mut self, id: PartyId) {
        self.0 &= !bit(id);
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Returns the immutable snapshot of this set.
    #[inline]
    pub fn freeze(&self) -> ImmutableBitSet {
        ImmutableBitSet(self.0)
    }
}

impl ImmutableBitSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw word: bit `i` stands for party `i + 1`.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a set holding `ids`.
    ///
    /// # Panics
    ///
    /// Panics if any identifier is outside `[1, 64]`.
    pub fn from_ids(ids: &[PartyId]) -> Self {
        BitSet::from_ids(ids).freeze()
    }

    /// Creates a set from untrusted identifiers, rejecting any outside
    /// `[1, 64]`.
    pub fn try_from_ids<I>(ids: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = PartyId>,
    {
        ids.into_iter()
            .try_fold(0u64, |acc, id| Ok(acc | try_bit(id)?))
            .map(Self)
    }

    /// Returns `self ∪ {id}`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside `[1, 64]`.
    #[inline]
    pub fn with(&self, id: PartyId) -> Self {
        Self(self.0 | bit(id))
    }

    /// Returns `self \ {id}`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside `[1, 64]`.
    #[inline]
    pub fn without(&self, id: PartyId) -> Self {
        Self(self.0 & !bit(id))
    }

    /// Returns a mutable copy.
    #[inline]
    pub fn unfreeze(&self) -> BitSet {
        BitSet(self.0)
    }
}

impl From<BitSet> for ImmutableBitSet {
    fn from(set: BitSet) -> Self {
        set.freeze()
    }
}

impl From<ImmutableBitSet> for BitSet {
    fn from(set: ImmutableBitSet) -> Self {
        set.unfreeze()
    }
}

impl FromIterator<PartyId> for BitSet {
    /// # Panics
    ///
    /// Panics if any identifier is outside `[1, 64]`.
    fn from_iter<I: IntoIterator<Item = PartyId>>(iter: I) -> Self {
        let mut set = BitSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<PartyId> for BitSet {
    fn extend<I: IntoIterator<Item = PartyId>>(&mut self, iter: I) {
        for id in iter {
            self.add(id);
        }
    }
}

impl FromIterator<PartyId> for ImmutableBitSet {
    /// # Panics
    ///
    /// Panics if any identifier is outside `[1, 64]`.
    fn from_iter<I: IntoIterator<Item = PartyId>>(iter: I) -> Self {
        iter.into_iter().collect::<BitSet>().freeze()
    }
}

/// Ascending iterator over the members of a set.
#[derive(Debug, Clone)]
pub struct Iter {
    word: u64,
}

impl Iterator for Iter {
    type Item = PartyId;

    fn next(&mut self) -> Option<PartyId> {
        if self.word == 0 {
            return None;
        }
        let id = self.word.trailing_zeros() as PartyId + 1;
        self.word &= self.word - 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.word.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Iter {}
impl FusedIterator for Iter {}

/// Power-set enumeration by submask descent.
///
/// Starts at the full set and steps `sub = (sub - 1) & full` until the empty
/// set has been yielded, visiting every subset exactly once.
#[derive(Debug, Clone)]
pub struct SubSets {
    full: u64,
    next: Option<u64>,
}

impl Iterator for SubSets {
    type Item = ImmutableBitSet;

    fn next(&mut self) -> Option<ImmutableBitSet> {
        let sub = self.next?;
        self.next = if sub == 0 {
            None
        } else {
            Some((sub - 1) & self.full)
        };
        Some(ImmutableBitSet(sub))
    }
}

impl FusedIterator for SubSets {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_add_and_contains() {
        let mut s = BitSet::new();
        assert!(s.is_empty());
        assert!(!s.contains(1));
        s.add(1);
        s.add(5);
        s.add(10);
        s.add(5);
        assert!(s.contains(1) && s.contains(5) && s.contains(10));
        assert!(!s.contains(2));
        assert_eq!(s.size(), 3);
        assert!(!s.contains(0));
        assert!(!s.contains(65));
    }

    #[test]
    fn test_boundaries_accept_one_through_sixty_four() {
        let mut s = BitSet::new();
        for id in 1..=64 {
            s.add(id);
        }
        assert_eq!(s.size(), 64);
        assert_eq!(s.bits(), u64::MAX);
        assert_eq!(s.first(), Some(1));
    }

    #[test]
    fn test_first_on_owned_difference() {
        let all = ImmutableBitSet::from_ids(&[2, 5, 9]);
        assert_eq!(all.difference(&ImmutableBitSet::from_ids(&[2])).first(), Some(5));
        assert_eq!(all.difference(&all).first(), None);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_add_zero_panics() {
        BitSet::new().add(0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_add_sixty_five_panics() {
        BitSet::new().add(65);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_remove_out_of_range_panics() {
        BitSet::from_ids(&[1]).remove(0);
    }

    #[test]
    fn test_try_from_ids_rejects_out_of_range() {
        assert_eq!(
            ImmutableBitSet::try_from_ids([1, 2, 3]).unwrap(),
            ImmutableBitSet::from_bits(0b111)
        );
        assert!(matches!(
            ImmutableBitSet::try_from_ids([1, 0]),
            Err(SharingError::Membership(_))
        ));
        assert!(matches!(
            ImmutableBitSet::try_from_ids([65]),
            Err(SharingError::Membership(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut s = BitSet::from_ids(&[1, 2, 3]);
        s.remove(2);
        s.remove(40);
        assert_eq!(s.to_vec(), vec![1, 3]);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn test_iter_is_ascending() {
        let s = BitSet::from_ids(&[64, 10, 1, 33]);
        assert_eq!(s.to_vec(), vec![1, 10, 33, 64]);
        assert_eq!(s.iter().len(), 4);
    }

    #[test]
    fn test_set_algebra() {
        let a = ImmutableBitSet::from_ids(&[1, 2, 3]);
        let b = ImmutableBitSet::from_ids(&[3, 4]);
        assert_eq!(a.union(&b).to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(a.intersection(&b).to_vec(), vec![3]);
        assert_eq!(a.difference(&b).to_vec(), vec![1, 2]);
        assert_eq!(a.symmetric_difference(&b).to_vec(), vec![1, 2, 4]);
        // operands are untouched values
        assert_eq!(a.size(), 3);
        assert_eq!(b.size(), 2);
    }

    #[test]
    fn test_subset_relations() {
        let small = ImmutableBitSet::from_ids(&[1, 2]);
        let big = ImmutableBitSet::from_ids(&[1, 2, 3]);
        assert!(small.is_subset(&big));
        assert!(small.is_proper_subset(&big));
        assert!(big.is_superset(&small));
        assert!(big.is_proper_superset(&small));
        assert!(big.is_subset(&big));
        assert!(!big.is_proper_subset(&big));
        assert!(ImmutableBitSet::EMPTY.is_subset(&small));
        assert!(!big.is_subset(&small));
    }

    #[test]
    fn test_freeze_unfreeze() {
        let mut s = BitSet::from_ids(&[1, 2, 3]);
        let frozen = s.freeze();
        s.add(4);
        assert_eq!(frozen.size(), 3);
        let mut thawed = frozen.unfreeze();
        thawed.remove(1);
        assert_eq!(frozen.to_vec(), vec![1, 2, 3]);
        assert_eq!(thawed.to_vec(), vec![2, 3]);
        assert_eq!(ImmutableBitSet::from_bits(0b111), frozen);
    }

    #[test]
    fn test_display() {
        assert_eq!(ImmutableBitSet::from_ids(&[3, 1]).to_string(), "{1,3}");
        assert_eq!(ImmutableBitSet::EMPTY.to_string(), "{}");
    }

    #[test]
    fn test_empty_set_has_one_subset() {
        let subsets = ImmutableBitSet::EMPTY.subsets();
        assert_eq!(subsets, vec![ImmutableBitSet::EMPTY]);
    }

    #[test]
    fn test_iter_subsets_order() {
        let s = ImmutableBitSet::from_ids(&[1, 2]);
        let subsets: Vec<Vec<PartyId>> = s.iter_subsets().map(|x| x.to_vec()).collect();
        assert_eq!(subsets, vec![vec![1, 2], vec![2], vec![1], vec![]]);
    }

    #[test]
    fn test_power_set_sizes() {
        for n in 0..7u64 {
            let s: ImmutableBitSet = (1..=n).collect();
            assert_eq!(s.iter_subsets().count(), 1 << n);
        }
    }

    #[test]
    fn test_serde_is_transparent_word() {
        let s = ImmutableBitSet::from_ids(&[1, 3]);
        assert_eq!(serde_json::to_string(&s).unwrap(), "5");
        let back: ImmutableBitSet = serde_json::from_str("5").unwrap();
        assert_eq!(back, s);
    }

    proptest! {
        #[test]
        fn prop_power_set_law(ids in proptest::collection::btree_set(1u64..=64, 0..=10)) {
            let ids: Vec<PartyId> = ids.into_iter().collect();
            let full = ImmutableBitSet::from_ids(&ids);
            let mut seen = HashSet::new();
            for sub in full.iter_subsets() {
                prop_assert!(sub.is_subset(&full));
                prop_assert!(seen.insert(sub));
            }
            prop_assert_eq!(seen.len(), 1usize << ids.len());
            prop_assert!(seen.contains(&ImmutableBitSet::EMPTY));
        }

        #[test]
        fn prop_mutable_and_frozen_agree(ids in proptest::collection::vec(1u64..=64, 0..20), candidate in 1u64..=64) {
            let m = BitSet::from_ids(&ids);
            let f = m.freeze();
            prop_assert_eq!(m.contains(candidate), f.contains(candidate));
            prop_assert_eq!(m.size(), f.size());
            prop_assert_eq!(m.to_vec(), f.to_vec());
        }
    }
}
