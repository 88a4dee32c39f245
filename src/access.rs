//! Monotone access structures and their clause encodings.
//!
//! An access structure decides which coalitions may reconstruct.  The ISN
//! scheme only needs three things from it: the shareholders, a qualification
//! predicate, and an enumeration of clauses.  Clauses come in two flavours,
//! recorded by [`ClauseKind`]:
//!
//! * **CNF**: maximal unqualified sets `T`.  A coalition is authorised iff it
//!   is not contained in any `T`.
//! * **DNF**: minimal qualified sets `B`.  A coalition is authorised iff it
//!   contains some `B`.
//!
//! The scheme trusts monotonicity rather than re-verifying it.

use crate::bitset::{Clause, ImmutableBitSet, PartyId};
use crate::errors::SharingError;
use serde::{Deserialize, Serialize};

/// Largest shareholder set for which clause conversion enumerates the power
/// set.
pub const MAX_ENUMERATION_PARTIES: usize = 24;

/// Which family of sets an access structure's clauses describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    /// Maximal unqualified sets (CNF).
    MaximalUnqualified,
    /// Minimal qualified sets (DNF).
    MinimalQualified,
}

impl ClauseKind {
    /// Returns true if party `id` holds a piece for `clause`.
    ///
    /// CNF pieces go to parties outside the clause, DNF pieces to parties
    /// inside it.
    #[inline]
    pub fn holds(self, clause: &Clause, id: PartyId) -> bool {
        match self {
            ClauseKind::MaximalUnqualified => !clause.contains(id),
            ClauseKind::MinimalQualified => clause.contains(id),
        }
    }

    /// Short label used in scheme names and logs.
    pub fn label(self) -> &'static str {
        match self {
            ClauseKind::MaximalUnqualified => "CNF",
            ClauseKind::MinimalQualified => "DNF",
        }
    }
}

/// A monotone access structure over party identifiers.
pub trait AccessStructure {
    /// Every party that receives a share.
    fn shareholders(&self) -> ImmutableBitSet;

    /// Returns true if `ids` is an authorised coalition.
    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool;

    /// Convention the clauses follow.
    fn clause_kind(&self) -> ClauseKind;

    /// Enumerates the clauses in a fixed order.
    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_>;
}

fn check_antichain(sets: &[Clause]) -> Result<(), SharingError> {
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            if a == b {
                return Err(SharingError::InvalidStructure(format!(
                    "duplicate clause {a}"
                )));
            }
            if a.is_subset(b) || b.is_subset(a) {
                let (small, big) = if a.is_subset(b) { (a, b) } else { (b, a) };
                return Err(SharingError::InvalidStructure(format!(
                    "clause {small} is contained in clause {big}"
                )));
            }
        }
    }
    Ok(())
}

fn check_within(sets: &[Clause], shareholders: &ImmutableBitSet) -> Result<(), SharingError> {
    match sets.iter().find(|set| !set.is_subset(shareholders)) {
        Some(set) => Err(SharingError::InvalidStructure(format!(
            "clause {set} mentions parties outside the shareholders {shareholders}"
        ))),
        None => Ok(()),
    }
}

fn check_enumerable(shareholders: &ImmutableBitSet) -> Result<(), SharingError> {
    if shareholders.size() > MAX_ENUMERATION_PARTIES {
        return Err(SharingError::InvalidArgument(format!(
            "clause conversion enumerates 2^{} coalitions; at most {MAX_ENUMERATION_PARTIES} parties are supported",
            shareholders.size()
        )));
    }
    Ok(())
}

/// Computes the maximal unqualified sets of `ac` by walking the power set of
/// its shareholders.
pub fn maximal_unqualified_sets<A>(ac: &A) -> Result<Vec<Clause>, SharingError>
where
    A: AccessStructure + ?Sized,
{
    let all = ac.shareholders();
    check_enumerable(&all)?;
    Ok(all
        .iter_subsets()
        .filter(|set| {
            !ac.is_qualified(set)
                && all
                    .difference(set)
                    .iter()
                    .all(|id| ac.is_qualified(&set.with(id)))
        })
        .collect())
}

/// Computes the minimal qualified sets of `ac` by walking the power set of
/// its shareholders.
pub fn minimal_qualified_sets<A>(ac: &A) -> Result<Vec<Clause>, SharingError>
where
    A: AccessStructure + ?Sized,
{
    let all = ac.shareholders();
    check_enumerable(&all)?;
    Ok(all
        .iter_subsets()
        .filter(|set| ac.is_qualified(set) && set.iter().all(|id| !ac.is_qualified(&set.without(id))))
        .collect())
}

/// Access structure given by its maximal unqualified sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnfAccessStructure {
    clauses: Vec<Clause>,
    shareholders: ImmutableBitSet,
}

impl CnfAccessStructure {
    /// Builds a structure whose shareholders are the union of `sets`.
    pub fn new<I>(sets: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = Clause>,
    {
        let clauses: Vec<Clause> = sets.into_iter().collect();
        let shareholders = clauses
            .iter()
            .fold(ImmutableBitSet::EMPTY, |acc, c| acc.union(c));
        Self::over(shareholders, clauses)
    }

    /// Builds a structure over an explicit shareholder set, which may include
    /// parties that appear in no clause.
    pub fn over<I>(shareholders: ImmutableBitSet, sets: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = Clause>,
    {
        let clauses: Vec<Clause> = sets.into_iter().collect();
        if clauses.is_empty() {
            return Err(SharingError::InvalidStructure(
                "no maximal unqualified sets".to_string(),
            ));
        }
        if shareholders.is_empty() {
            return Err(SharingError::InvalidStructure("no shareholders".to_string()));
        }
        check_within(&clauses, &shareholders)?;
        check_antichain(&clauses)?;
        if clauses.contains(&shareholders) {
            return Err(SharingError::InvalidStructure(format!(
                "clause {shareholders} covers every shareholder, so no coalition could reconstruct"
            )));
        }
        Ok(Self {
            clauses,
            shareholders,
        })
    }

    /// Rewrites any access structure in CNF.
    pub fn from_access_structure<A>(ac: &A) -> Result<Self, SharingError>
    where
        A: AccessStructure + ?Sized,
    {
        Self::over(ac.shareholders(), maximal_unqualified_sets(ac)?)
    }

    /// The maximal unqualified sets, in construction order.
    pub fn sets(&self) -> &[Clause] {
        &self.clauses
    }
}

impl AccessStructure for CnfAccessStructure {
    fn shareholders(&self) -> ImmutableBitSet {
        self.shareholders
    }

    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool {
        !ids.is_empty()
            && ids.is_subset(&self.shareholders)
            && self.clauses.iter().all(|t| !ids.is_subset(t))
    }

    fn clause_kind(&self) -> ClauseKind {
        ClauseKind::MaximalUnqualified
    }

    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_> {
        Box::new(self.clauses.iter().copied())
    }
}

/// Access structure given by its minimal qualified sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnfAccessStructure {
    clauses: Vec<Clause>,
    shareholders: ImmutableBitSet,
}

impl DnfAccessStructure {
    /// Builds a structure whose shareholders are the union of `sets`.
    pub fn new<I>(sets: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = Clause>,
    {
        let clauses: Vec<Clause> = sets.into_iter().collect();
        let shareholders = clauses
            .iter()
            .fold(ImmutableBitSet::EMPTY, |acc, c| acc.union(c));
        Self::over(shareholders, clauses)
    }

    /// Builds a structure over an explicit shareholder set.
    pub fn over<I>(shareholders: ImmutableBitSet, sets: I) -> Result<Self, SharingError>
    where
        I: IntoIterator<Item = Clause>,
    {
        let clauses: Vec<Clause> = sets.into_iter().collect();
        if clauses.is_empty() {
            return Err(SharingError::InvalidStructure(
                "no minimal qualified sets".to_string(),
            ));
        }
        if clauses.iter().any(|b| b.is_empty()) {
            return Err(SharingError::InvalidStructure(
                "empty minimal qualified set".to_string(),
            ));
        }
        check_within(&clauses, &shareholders)?;
        check_antichain(&clauses)?;
        Ok(Self {
            clauses,
            shareholders,
        })
    }

    /// Rewrites any access structure in DNF.
    pub fn from_access_structure<A>(ac: &A) -> Result<Self, SharingError>
    where
        A: AccessStructure + ?Sized,
    {
        Self::over(ac.shareholders(), minimal_qualified_sets(ac)?)
    }

    /// The minimal qualified sets, in construction order.
    pub fn sets(&self) -> &[Clause] {
        &self.clauses
    }
}

impl AccessStructure for DnfAccessStructure {
    fn shareholders(&self) -> ImmutableBitSet {
        self.shareholders
    }

    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool {
        !ids.is_empty()
            && ids.is_subset(&self.shareholders)
            && self.clauses.iter().any(|b| b.is_subset(ids))
    }

    fn clause_kind(&self) -> ClauseKind {
        ClauseKind::MinimalQualified
    }

    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_> {
        Box::new(self.clauses.iter().copied())
    }
}

/// `t`-of-`n` threshold structure.
///
/// Its CNF clauses are all `(t - 1)`-subsets of the shareholders, so ISN over
/// it is replicated secret sharing.  There are `C(n, t - 1)` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdAccessStructure {
    threshold: usize,
    shareholders: ImmutableBitSet,
}

impl ThresholdAccessStructure {
    /// Requires `1 <= threshold <= |shareholders|`.
    pub fn new(threshold: usize, shareholders: ImmutableBitSet) -> Result<Self, SharingError> {
        if threshold == 0 || threshold > shareholders.size() {
            return Err(SharingError::InvalidStructure(format!(
                "threshold {threshold} outside [1, {}]",
                shareholders.size()
            )));
        }
        Ok(Self {
            threshold,
            shareholders,
        })
    }

    /// Minimum coalition size.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl AccessStructure for ThresholdAccessStructure {
    fn shareholders(&self) -> ImmutableBitSet {
        self.shareholders
    }

    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool {
        ids.is_subset(&self.shareholders) && ids.size() >= self.threshold
    }

    fn clause_kind(&self) -> ClauseKind {
        ClauseKind::MaximalUnqualified
    }

    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_> {
        Box::new(Combinations::new(
            self.shareholders.to_vec(),
            self.threshold - 1,
        ))
    }
}

/// Lexicographic `k`-subsets of a member list.
struct Combinations {
    members: Vec<PartyId>,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(members: Vec<PartyId>, k: usize) -> Self {
        let done = k > members.len();
        Self {
            members,
            indices: (0..k).collect(),
            done,
        }
    }
}

impl Iterator for Combinations {
    type Item = Clause;

    fn next(&mut self) -> Option<Clause> {
        if self.done {
            return None;
        }
        let out = self.indices.iter().map(|&i| self.members[i]).collect();
        let n = self.members.len();
        let k = self.indices.len();
        // advance the rightmost index that still has room
        match (0..k).rev().find(|&i| self.indices[i] < n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(out)
    }
}

/// A quorum whose members must all take part.
///
/// This is the target structure for converting ISN shares into additive
/// shares.  Its CNF clauses are `quorum \ {i}` for every member `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnanimityAccessStructure {
    quorum: ImmutableBitSet,
}

impl UnanimityAccessStructure {
    /// Requires a non-empty quorum.
    pub fn new(quorum: ImmutableBitSet) -> Result<Self, SharingError> {
        if quorum.is_empty() {
            return Err(SharingError::InvalidStructure("empty quorum".to_string()));
        }
        Ok(Self { quorum })
    }

    /// The members.
    pub fn quorum(&self) -> ImmutableBitSet {
        self.quorum
    }

    /// Lowest quorum member outside `clause`, the party that contributes the
    /// clause's piece in an additive conversion.
    pub fn pivot(&self, clause: &Clause) -> Option<PartyId> {
        self.quorum.difference(clause).first()
    }
}

impl AccessStructure for UnanimityAccessStructure {
    fn shareholders(&self) -> ImmutableBitSet {
        self.quorum
    }

    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool {
        *ids == self.quorum
    }

    fn clause_kind(&self) -> ClauseKind {
        ClauseKind::MaximalUnqualified
    }

    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_> {
        let quorum = self.quorum;
        Box::new(quorum.iter().map(move |id| quorum.without(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[PartyId]) -> ImmutableBitSet {
        ImmutableBitSet::from_ids(ids)
    }

    #[test]
    fn test_cnf_qualification() {
        let ac = CnfAccessStructure::new([set(&[1, 2]), set(&[3, 4])]).unwrap();
        assert_eq!(ac.shareholders(), set(&[1, 2, 3, 4]));
        for ok in [&[1, 3][..], &[1, 4], &[2, 3], &[2, 4], &[1, 2, 3], &[1, 2, 3, 4]] {
            assert!(ac.is_qualified(&set(ok)), "{ok:?} should qualify");
        }
        for bad in [&[1, 2][..], &[3, 4], &[1], &[4], &[]] {
            assert!(!ac.is_qualified(&set(bad)), "{bad:?} should not qualify");
        }
        assert!(!ac.is_qualified(&set(&[1, 5])));
    }

    #[test]
    fn test_cnf_rejects_degenerate_sets() {
        assert!(matches!(
            CnfAccessStructure::new(Vec::new()),
            Err(SharingError::InvalidStructure(_))
        ));
        assert!(CnfAccessStructure::new([set(&[1, 2]), set(&[1])]).is_err());
        assert!(CnfAccessStructure::new([set(&[1, 2]), set(&[1, 2])]).is_err());
        // a single clause naming everyone leaves nobody authorised
        assert!(CnfAccessStructure::new([set(&[1, 2])]).is_err());
        assert!(CnfAccessStructure::over(set(&[1, 2]), [set(&[3])]).is_err());
    }

    #[test]
    fn test_cnf_extra_shareholder_is_qualified_alone() {
        let ac = CnfAccessStructure::over(set(&[1, 2, 3]), [set(&[1, 2])]).unwrap();
        assert!(ac.is_qualified(&set(&[3])));
        assert!(!ac.is_qualified(&set(&[1, 2])));
    }

    #[test]
    fn test_dnf_qualification() {
        let ac = DnfAccessStructure::new([set(&[1, 2]), set(&[2, 3, 4])]).unwrap();
        for ok in [&[1, 2][..], &[2, 3, 4], &[1, 2, 3], &[1, 2, 3, 4]] {
            assert!(ac.is_qualified(&set(ok)));
        }
        for bad in [&[1][..], &[2], &[1, 3], &[3, 4], &[1, 3, 4]] {
            assert!(!ac.is_qualified(&set(bad)));
        }
    }

    #[test]
    fn test_dnf_rejects_empty_and_non_minimal_sets() {
        assert!(matches!(
            DnfAccessStructure::new([set(&[])]),
            Err(SharingError::InvalidStructure(_))
        ));
        assert!(DnfAccessStructure::new(Vec::new()).is_err());
        assert!(DnfAccessStructure::new([set(&[1, 2]), set(&[1, 2, 3])]).is_err());
    }

    #[test]
    fn test_dnf_to_cnf_conversion() {
        let dnf = DnfAccessStructure::new([set(&[1, 2]), set(&[2, 3, 4])]).unwrap();
        let cnf = CnfAccessStructure::from_access_structure(&dnf).unwrap();
        let mut sets = cnf.sets().to_vec();
        sets.sort();
        let mut expected = vec![set(&[1, 3, 4]), set(&[2, 3]), set(&[2, 4])];
        expected.sort();
        assert_eq!(sets, expected);
        for coalition in dnf.shareholders().iter_subsets() {
            assert_eq!(dnf.is_qualified(&coalition), cnf.is_qualified(&coalition));
        }
    }

    #[test]
    fn test_cnf_to_dnf_conversion() {
        let cnf = CnfAccessStructure::new([set(&[1, 2]), set(&[3, 4])]).unwrap();
        let dnf = DnfAccessStructure::from_access_structure(&cnf).unwrap();
        let mut sets = dnf.sets().to_vec();
        sets.sort();
        let mut expected = vec![set(&[1, 3]), set(&[1, 4]), set(&[2, 3]), set(&[2, 4])];
        expected.sort();
        assert_eq!(sets, expected);
    }

    #[test]
    fn test_threshold_clauses() {
        let ac = ThresholdAccessStructure::new(2, set(&[1, 2, 3])).unwrap();
        let clauses: Vec<Clause> = ac.clauses().collect();
        assert_eq!(clauses, vec![set(&[1]), set(&[2]), set(&[3])]);
        assert!(ac.is_qualified(&set(&[1, 3])));
        assert!(!ac.is_qualified(&set(&[2])));

        let ac = ThresholdAccessStructure::new(3, set(&[1, 2, 3, 4])).unwrap();
        assert_eq!(ac.clauses().count(), 6);
        assert!(ac.clauses().all(|c| c.size() == 2));

        let one = ThresholdAccessStructure::new(1, set(&[1, 2])).unwrap();
        assert_eq!(one.clauses().collect::<Vec<_>>(), vec![ImmutableBitSet::EMPTY]);
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(ThresholdAccessStructure::new(0, set(&[1, 2])).is_err());
        assert!(ThresholdAccessStructure::new(3, set(&[1, 2])).is_err());
    }

    #[test]
    fn test_threshold_matches_its_cnf() {
        let ac = ThresholdAccessStructure::new(3, set(&[1, 2, 3, 4, 5])).unwrap();
        let mut derived = maximal_unqualified_sets(&ac).unwrap();
        derived.sort();
        let mut listed: Vec<Clause> = ac.clauses().collect();
        listed.sort();
        assert_eq!(derived, listed);
    }

    #[test]
    fn test_unanimity() {
        let ac = UnanimityAccessStructure::new(set(&[2, 5, 7])).unwrap();
        assert!(ac.is_qualified(&set(&[2, 5, 7])));
        assert!(!ac.is_qualified(&set(&[2, 5])));
        let clauses: Vec<Clause> = ac.clauses().collect();
        assert_eq!(clauses, vec![set(&[5, 7]), set(&[2, 7]), set(&[2, 5])]);
        assert_eq!(ac.pivot(&set(&[2, 3])), Some(5));
        assert_eq!(ac.pivot(&set(&[2, 5, 7])), None);
        assert!(UnanimityAccessStructure::new(ImmutableBitSet::EMPTY).is_err());
    }

    #[test]
    fn test_clause_kind_holds() {
        let clause = set(&[1, 2]);
        assert!(ClauseKind::MaximalUnqualified.holds(&clause, 3));
        assert!(!ClauseKind::MaximalUnqualified.holds(&clause, 1));
        assert!(ClauseKind::MinimalQualified.holds(&clause, 1));
        assert!(!ClauseKind::MinimalQualified.holds(&clause, 3));
    }

    #[test]
    fn test_enumeration_limit() {
        let wide: ImmutableBitSet = (1..=30).collect();
        let ac = ThresholdAccessStructure::new(2, wide).unwrap();
        assert!(matches!(
            maximal_unqualified_sets(&ac),
            Err(SharingError::InvalidArgument(_))
        ));
    }
}
