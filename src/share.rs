//! The design philosophy underlying `isn_sharing` is pedagogical, yet mathematically rigorous.
//! Each module encapsulates one discrete concept of secret sharing over monotone access
//! structures, illustrating how modest abstractions compose into a cohesive sharing engine.
//!
//! This crate aspires to bridge gaps between theoretical exposition and practical engineering,
//! serving both as a didactic resource and a foundation for threshold cryptography research.
//! Secrets, shares and what the dealer knows.
//!
//! A [`Share`] is sparse: it maps clauses to group elements, and a clause
//! that is absent stands for the identity.  Which clauses a party holds is
//! fixed by the [`ClauseKind`] of the access structure it was dealt under.
//! [`DealerOutput`] is what gets handed out; [`DealerFunc`] is the dealer's
//! full table and reveals strictly more.

use crate::access::ClauseKind;
use crate::bitset::{Clause, ImmutableBitSet, PartyId};
use crate::errors::SharingError;
use crate::group::{FiniteGroup, GroupElement};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};

/// A secret group element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret<E>(E);

impl<E> Secret<E> {
    /// Wraps `value`.
    pub fn new(value: E) -> Self {
        Self(value)
    }

    /// Borrows the element.
    pub fn value(&self) -> &E {
        &self.0
    }

    /// Unwraps the element.
    pub fn into_value(self) -> E {
        self.0
    }
}

/// One party's share: a sparse map from clause to piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawShare<E>",
    bound(deserialize = "E: Deserialize<'de>")
)]
pub struct Share<E> {
    id: PartyId,
    pieces: BTreeMap<Clause, E>,
}

#[derive(Deserialize)]
struct RawShare<E> {
    id: PartyId,
    pieces: BTreeMap<Clause, E>,
}

impl<E> TryFrom<RawShare<E>> for Share<E> {
    type Error = SharingError;

    fn try_from(raw: RawShare<E>) -> Result<Self, SharingError> {
        Share::new(raw.id, raw.pieces)
    }
}

impl<E> Share<E> {
    /// Builds a share, rejecting identifiers outside `[1, 64]`.
    pub fn new(id: PartyId, pieces: BTreeMap<Clause, E>) -> Result<Self, SharingError> {
        ImmutableBitSet::try_from_ids([id])?;
        Ok(Self { id, pieces })
    }

    pub(crate) fn empty(id: PartyId) -> Self {
        Self {
            id,
            pieces: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, clause: Clause, piece: E) {
        self.pieces.insert(clause, piece);
    }

    /// The holder.
    #[inline]
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// Piece stored under `clause`, if any.
    pub fn piece(&self, clause: &Clause) -> Option<&E> {
        self.pieces.get(clause)
    }

    /// All explicit pieces, ordered by clause word.
    pub fn pieces(&self) -> &BTreeMap<Clause, E> {
        &self.pieces
    }

    /// Clauses with an explicit piece.
    pub fn clauses(&self) -> impl Iterator<Item = Clause> + '_ {
        self.pieces.keys().copied()
    }

    /// Number of explicit pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// True if the share carries no explicit piece.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

impl<E: GroupElement> Share<E> {
    /// Combines two shares of the same party clause by clause.
    ///
    /// A clause missing from one side counts as the identity, so the result
    /// holds the union of both key sets.  Reconstructing over combined shares
    /// yields the combined secrets.
    pub fn op(&self, other: &Self) -> Result<Self, SharingError> {
        if self.id != other.id {
            return Err(SharingError::Membership(format!(
                "cannot combine shares of parties {} and {}",
                self.id, other.id
            )));
        }
        let mut pieces = self.pieces.clone();
        for (clause, piece) in &other.pieces {
            match pieces.entry(*clause) {
                Entry::Occupied(mut slot) => {
                    let combined = slot.get().op(piece);
                    slot.insert(combined);
                }
                Entry::Vacant(slot) => {
                    slot.insert(piece.clone());
                }
            }
        }
        Ok(Self { id: self.id, pieces })
    }
}

/// Every share produced by one dealing, keyed by holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Share<E>>",
    into = "Vec<Share<E>>",
    bound(
        serialize = "E: Serialize + Clone",
        deserialize = "E: Deserialize<'de>"
    )
)]
pub struct DealerOutput<E> {
    shares: BTreeMap<PartyId, Share<E>>,
}

impl<E> DealerOutput<E> {
    pub(crate) fn from_map(shares: BTreeMap<PartyId, Share<E>>) -> Self {
        Self { shares }
    }

    /// Collects shares, rejecting two shares for the same party.
    pub fn from_shares<I>(shares: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = Share<E>>,
    {
        let mut map = BTreeMap::new();
        for share in shares {
            let id = share.id;
            if map.insert(id, share).is_some() {
                return Err(SharingError::Membership(format!(
                    "duplicate share for party {id}"
                )));
            }
        }
        Ok(Self { shares: map })
    }

    /// Share of party `id`.
    pub fn share(&self, id: PartyId) -> Option<&Share<E>> {
        self.shares.get(&id)
    }

    /// Shares in ascending party order.
    pub fn iter(&self) -> impl Iterator<Item = &Share<E>> + '_ {
        self.shares.values()
    }

    /// Shares held by the parties in `coalition`, in ascending order.
    pub fn select(&self, coalition: &ImmutableBitSet) -> Vec<&Share<E>> {
        self.shares
            .values()
            .filter(|share| coalition.contains(share.id))
            .collect()
    }

    /// Like [`DealerOutput::select`], but every member of `coalition` must
    /// hold a share.
    pub fn select_exact(
        &self,
        coalition: &ImmutableBitSet,
    ) -> Result<Vec<&Share<E>>, SharingError> {
        let absent = coalition.difference(&self.ids());
        if !absent.is_empty() {
            return Err(SharingError::Membership(format!(
                "no share for parties {absent}"
            )));
        }
        Ok(self.select(coalition))
    }

    /// Holders as a set.
    pub fn ids(&self) -> ImmutableBitSet {
        self.shares.keys().copied().collect()
    }

    /// Number of shares.
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// True if nothing was dealt.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Consumes the output, yielding shares in ascending party order.
    pub fn into_shares(self) -> Vec<Share<E>> {
        self.shares.into_values().collect()
    }
}

impl<E> TryFrom<Vec<Share<E>>> for DealerOutput<E> {
    type Error = SharingError;

    fn try_from(shares: Vec<Share<E>>) -> Result<Self, SharingError> {
        Self::from_shares(shares)
    }
}

impl<E> From<DealerOutput<E>> for Vec<Share<E>> {
    fn from(output: DealerOutput<E>) -> Self {
        output.into_shares()
    }
}

/// The dealer's complete table of pieces.
///
/// A CNF clause has a single piece shared by everyone outside it; a DNF
/// clause has one piece per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealerFunc<E> {
    /// Pieces keyed by maximal unqualified set.
    Cnf(BTreeMap<Clause, E>),
    /// Per-member pieces keyed by minimal qualified set.
    Dnf(BTreeMap<Clause, BTreeMap<PartyId, E>>),
}

impl<E: Clone> DealerFunc<E> {
    /// Clause convention of the table.
    pub fn kind(&self) -> ClauseKind {
        match self {
            DealerFunc::Cnf(_) => ClauseKind::MaximalUnqualified,
            DealerFunc::Dnf(_) => ClauseKind::MinimalQualified,
        }
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        match self {
            DealerFunc::Cnf(table) => table.len(),
            DealerFunc::Dnf(table) => table.len(),
        }
    }

    /// True if the table has no clause.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derives the share party `id` would have been dealt.
    pub fn share_of(&self, id: PartyId) -> Result<Share<E>, SharingError> {
        let mut share = Share::new(id, BTreeMap::new())?;
        match self {
            DealerFunc::Cnf(table) => {
                for (clause, piece) in table {
                    if !clause.contains(id) {
                        share.insert(*clause, piece.clone());
                    }
                }
            }
            DealerFunc::Dnf(table) => {
                for (clause, members) in table {
                    if let Some(piece) = members.get(&id) {
                        share.insert(*clause, piece.clone());
                    }
                }
            }
        }
        Ok(share)
    }
}

impl<E: GroupElement> DealerFunc<E> {
    /// Recomputes the dealt secret from the table.
    ///
    /// For DNF every clause encodes the secret on its own; the first one is
    /// used.
    pub fn secret<G>(&self, group: &G) -> Option<Secret<E>>
    where
        G: FiniteGroup<Element = E>,
    {
        match self {
            DealerFunc::Cnf(table) if !table.is_empty() => {
                Some(Secret::new(group.sum(table.values())))
            }
            DealerFunc::Dnf(table) => table
                .values()
                .next()
                .map(|members| Secret::new(group.sum(members.values()))),
            DealerFunc::Cnf(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldElement};

    fn set(ids: &[PartyId]) -> ImmutableBitSet {
        ImmutableBitSet::from_ids(ids)
    }

    fn share(id: PartyId, pieces: &[(Clause, u64)]) -> Share<FieldElement> {
        let field = Field::new(101);
        let map = pieces
            .iter()
            .map(|(clause, v)| (*clause, field.element(*v)))
            .collect();
        Share::new(id, map).unwrap()
    }

    #[test]
    fn test_op_takes_union_of_clauses() {
        let a = share(3, &[(set(&[1, 2]), 10), (set(&[4]), 5)]);
        let b = share(3, &[(set(&[1, 2]), 95), (set(&[2]), 7)]);
        let c = a.op(&b).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.piece(&set(&[1, 2])).unwrap().value(), 4);
        assert_eq!(c.piece(&set(&[4])).unwrap().value(), 5);
        assert_eq!(c.piece(&set(&[2])).unwrap().value(), 7);
    }

    #[test]
    fn test_op_rejects_different_holders() {
        let a = share(1, &[]);
        let b = share(2, &[]);
        assert!(matches!(a.op(&b), Err(SharingError::Membership(_))));
    }

    #[test]
    fn test_new_rejects_bad_ids() {
        assert!(Share::<FieldElement>::new(0, BTreeMap::new()).is_err());
        assert!(Share::<FieldElement>::new(65, BTreeMap::new()).is_err());
    }

    #[test]
    fn test_share_json_shape() {
        let s = share(2, &[(set(&[1, 3]), 42)]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["pieces"]["5"]["value"], 42);
        let back: Share<FieldElement> = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
        let bad = r#"{"id":0,"pieces":{}}"#;
        assert!(serde_json::from_str::<Share<FieldElement>>(bad).is_err());
    }

    #[test]
    fn test_dealer_output_rejects_duplicates() {
        let err = DealerOutput::from_shares([share(1, &[]), share(1, &[])]).unwrap_err();
        assert!(matches!(err, SharingError::Membership(_)));
        let out = DealerOutput::from_shares([share(2, &[]), share(1, &[])]).unwrap();
        assert_eq!(out.ids(), set(&[1, 2]));
        assert_eq!(out.iter().map(Share::id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(out.select(&set(&[2])).len(), 1);
    }

    #[test]
    fn test_select_exact_requires_every_member() {
        let out = DealerOutput::from_shares([share(1, &[]), share(3, &[])]).unwrap();
        assert_eq!(out.select_exact(&set(&[1, 3])).unwrap().len(), 2);
        assert_eq!(out.select(&set(&[1, 2])).len(), 1);
        assert!(matches!(
            out.select_exact(&set(&[1, 2])),
            Err(SharingError::Membership(_))
        ));
    }

    #[test]
    fn test_dealer_output_serialises_as_list() {
        let out = DealerOutput::from_shares([share(1, &[(set(&[2]), 3)]), share(2, &[])]).unwrap();
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.starts_with('['));
        let back: DealerOutput<FieldElement> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, out);
    }

    #[test]
    fn test_dealer_func_share_of() {
        let field = Field::new(101);
        let mut cnf = BTreeMap::new();
        cnf.insert(set(&[1, 2]), field.element(30));
        cnf.insert(set(&[3, 4]), field.element(12));
        let func = DealerFunc::Cnf(cnf);
        let s1 = func.share_of(1).unwrap();
        assert_eq!(s1.clauses().collect::<Vec<_>>(), vec![set(&[3, 4])]);
        assert_eq!(func.secret(&field), Some(Secret::new(field.element(42))));
        assert!(func.share_of(0).is_err());

        let mut members = BTreeMap::new();
        members.insert(1, field.element(3));
        members.insert(2, field.element(4));
        let mut dnf = BTreeMap::new();
        dnf.insert(set(&[1, 2]), members);
        let func = DealerFunc::Dnf(dnf);
        assert_eq!(func.kind(), ClauseKind::MinimalQualified);
        assert_eq!(func.share_of(2).unwrap().piece(&set(&[1, 2])), Some(&field.element(4)));
        assert!(func.share_of(3).unwrap().is_empty());
        assert_eq!(func.secret(&field), Some(Secret::new(field.element(7))));
    }
}
