//! The design philosophy underlying `isn_sharing` is pedagogical, yet mathematically rigorous.
//! Each module encapsulates one discrete concept of secret sharing over monotone access
//! structures, illustrating how modest abstractions compose into a cohesive sharing engine.
//!
//! This crate aspires to bridge gaps between theoretical exposition and practical engineering,
//! serving both as a didactic resource and a foundation for threshold cryptography research.
//! The Ito–Saito–Nishizeki scheme.
//!
//! [`Scheme`] binds a finite group to a monotone access structure and deals
//! one additive piece per clause:
//!
//! * under a CNF (maximal unqualified sets `T_1..T_l`) the secret is split
//!   into `l` pieces and piece `j` goes to every shareholder outside `T_j`;
//! * under a DNF (minimal qualified sets `B_1..B_l`) the secret is split
//!   again for every `B_j`, one piece per member.
//!
//! A qualified coalition can recover every clause it needs; an unqualified one
//! misses at least one uniformly random piece and learns nothing.
//! Reconstruction refuses unqualified coalitions before touching any piece and
//! then cross-checks every piece that is supplied more than once.

use crate::access::{AccessStructure, ClauseKind, UnanimityAccessStructure};
use crate::additive::{sum_to_secret, AdditiveShare};
use crate::bitset::{Clause, ImmutableBitSet, PartyId};
use crate::errors::SharingError;
use crate::group::{FiniteGroup, GroupElement};
use crate::sampler::Sampler;
use crate::share::{DealerFunc, DealerOutput, Secret, Share};
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Name recorded by protocols that use this scheme.
pub const NAME: &str = "ISN secret sharing scheme";
/// Name of the scheme over maximal unqualified sets.
pub const CNF_NAME: &str = "ISN secret sharing scheme (CNF)";
/// Name of the scheme over minimal qualified sets.
pub const DNF_NAME: &str = "ISN secret sharing scheme (DNF)";

type Element<G> = <G as FiniteGroup>::Element;

/// ISN secret sharing over group `G` and access structure `A`.
#[derive(Debug, Clone)]
pub struct Scheme<G: FiniteGroup, A: AccessStructure> {
    group: G,
    access: A,
    sampler: Sampler<G>,
}

impl<G: FiniteGroup, A: AccessStructure> Scheme<G, A> {
    /// Creates a scheme with uniform sampling.
    ///
    /// Fails with [`SharingError::InvalidStructure`] if the structure has no
    /// shareholders or no clauses, or if even the full shareholder set is
    /// unqualified.
    pub fn new(group: G, access: A) -> Result<Self, SharingError> {
        Self::with_sampler(group, access, Sampler::uniform())
    }

    /// Creates a scheme with custom sampling hooks.
    pub fn with_sampler(group: G, access: A, sampler: Sampler<G>) -> Result<Self, SharingError> {
        let shareholders = access.shareholders();
        if shareholders.is_empty() {
            return Err(SharingError::InvalidStructure("no shareholders".to_string()));
        }
        if access.clauses().next().is_none() {
            return Err(SharingError::InvalidStructure(
                "access structure has no clauses".to_string(),
            ));
        }
        if !access.is_qualified(&shareholders) {
            return Err(SharingError::InvalidStructure(format!(
                "shareholder set {shareholders} is not qualified"
            )));
        }
        Ok(Self {
            group,
            access,
            sampler,
        })
    }

    /// Generic scheme name.
    pub fn name(&self) -> &'static str {
        NAME
    }

    /// Name including the clause convention in use.
    pub fn variant_name(&self) -> &'static str {
        match self.access.clause_kind() {
            ClauseKind::MaximalUnqualified => CNF_NAME,
            ClauseKind::MinimalQualified => DNF_NAME,
        }
    }

    /// The group secrets live in.
    pub fn group(&self) -> &G {
        &self.group
    }

    /// The access structure shares are dealt under.
    pub fn access_structure(&self) -> &A {
        &self.access
    }

    /// Deals `secret` to every shareholder.
    pub fn deal<R: RngCore>(
        &self,
        secret: &Secret<Element<G>>,
        rng: &mut R,
    ) -> Result<DealerOutput<Element<G>>, SharingError> {
        self.deal_and_reveal_dealer_func(secret, rng)
            .map(|(output, _)| output)
    }

    /// Deals `secret` and also returns the dealer's full table.
    #[instrument(level = "debug", skip_all, fields(kind = self.access.clause_kind().label()))]
    pub fn deal_and_reveal_dealer_func<R: RngCore>(
        &self,
        secret: &Secret<Element<G>>,
        rng: &mut R,
    ) -> Result<(DealerOutput<Element<G>>, DealerFunc<Element<G>>), SharingError> {
        let kind = self.access.clause_kind();
        let shareholders = self.access.shareholders();
        let clauses = self.checked_clauses()?;
        let mut shares: BTreeMap<PartyId, Share<Element<G>>> = shareholders
            .iter()
            .map(|id| (id, Share::empty(id)))
            .collect();

        let func = match kind {
            ClauseKind::MaximalUnqualified => {
                let pieces = sum_to_secret(
                    secret.value(),
                    |r| self.sampler.share(&self.group, r),
                    &mut *rng,
                    clauses.len(),
                )?;
                let mut table = BTreeMap::new();
                for (clause, piece) in clauses.iter().zip(pieces) {
                    for id in shareholders.difference(clause).iter() {
                        if let Some(share) = shares.get_mut(&id) {
                            share.insert(*clause, piece.clone());
                        }
                    }
                    table.insert(*clause, piece);
                }
                DealerFunc::Cnf(table)
            }
            ClauseKind::MinimalQualified => {
                let mut table = BTreeMap::new();
                for clause in &clauses {
                    let pieces = sum_to_secret(
                        secret.value(),
                        |r| self.sampler.share(&self.group, r),
                        &mut *rng,
                        clause.size(),
                    )?;
                    let members: BTreeMap<PartyId, Element<G>> =
                        clause.iter().zip(pieces).collect();
                    for (id, piece) in &members {
                        if let Some(share) = shares.get_mut(id) {
                            share.insert(*clause, piece.clone());
                        }
                    }
                    table.insert(*clause, members);
                }
                DealerFunc::Dnf(table)
            }
        };

        debug!(
            scheme = self.variant_name(),
            clauses = clauses.len(),
            shareholders = %shareholders,
            "dealt secret"
        );
        Ok((DealerOutput::from_map(shares), func))
    }

    /// Samples a secret and deals it.
    pub fn deal_random<R: RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<(Secret<Element<G>>, DealerOutput<Element<G>>), SharingError> {
        let (secret, output, _) = self.deal_random_and_reveal_dealer_func(rng)?;
        Ok((secret, output))
    }

    /// Samples a secret, deals it, and returns the dealer's full table.
    #[allow(clippy::type_complexity)]
    pub fn deal_random_and_reveal_dealer_func<R: RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<
        (
            Secret<Element<G>>,
            DealerOutput<Element<G>>,
            DealerFunc<Element<G>>,
        ),
        SharingError,
    > {
        let secret = Secret::new(self.sampler.secret(&self.group, rng)?);
        let (output, func) = self.deal_and_reveal_dealer_func(&secret, rng)?;
        Ok((secret, output, func))
    }

    /// Recovers the secret from the shares of a qualified coalition.
    ///
    /// Every share must come from a distinct shareholder.  Pieces are only
    /// read once the coalition passes [`AccessStructure::is_qualified`].  A
    /// piece held by several members must agree across all of them.
    #[instrument(level = "debug", skip_all, fields(kind = self.access.clause_kind().label()))]
    pub fn reconstruct<'a, I>(&self, shares: I) -> Result<Secret<Element<G>>, SharingError>
    where
        I: IntoIterator<Item = &'a Share<Element<G>>>,
        Element<G>: 'a,
    {
        let shareholders = self.access.shareholders();
        let mut by_id: BTreeMap<PartyId, &Share<Element<G>>> = BTreeMap::new();
        for share in shares {
            let id = share.id();
            if !shareholders.contains(id) {
                return Err(SharingError::Membership(format!(
                    "party {id} is not a shareholder of {shareholders}"
                )));
            }
            if by_id.insert(id, share).is_some() {
                return Err(SharingError::Membership(format!(
                    "party {id} supplied more than one share"
                )));
            }
        }
        if by_id.is_empty() {
            return Err(SharingError::Missing("shares"));
        }
        let coalition: ImmutableBitSet = by_id.keys().copied().collect();
        if !self.access.is_qualified(&coalition) {
            debug!(coalition = %coalition, "rejected unqualified coalition");
            return Err(SharingError::Unauthorized(coalition));
        }

        let kind = self.access.clause_kind();
        let clauses: Vec<Clause> = self.access.clauses().collect();
        let known: BTreeSet<Clause> = clauses.iter().copied().collect();
        for share in by_id.values() {
            for clause in share.clauses() {
                if !known.contains(&clause) {
                    return Err(SharingError::Inconsistent(format!(
                        "party {} holds a piece for {clause}, which is not a clause",
                        share.id()
                    )));
                }
                if !kind.holds(&clause, share.id()) {
                    return Err(SharingError::Inconsistent(format!(
                        "party {} must not hold a piece for clause {clause}",
                        share.id()
                    )));
                }
            }
            self.check_pieces(share)?;
        }

        let value = match kind {
            ClauseKind::MaximalUnqualified => self.reconstruct_cnf(&clauses, &by_id)?,
            ClauseKind::MinimalQualified => self.reconstruct_dnf(&clauses, &coalition, &by_id)?,
        };
        debug!(coalition = %coalition, clauses = clauses.len(), "reconstructed secret");
        Ok(Secret::new(value))
    }

    fn reconstruct_cnf(
        &self,
        clauses: &[Clause],
        by_id: &BTreeMap<PartyId, &Share<Element<G>>>,
    ) -> Result<Element<G>, SharingError> {
        let mut total = self.group.op_identity();
        for clause in clauses {
            let mut recovered: Option<&Element<G>> = None;
            for (id, share) in by_id.iter().filter(|(id, _)| !clause.contains(**id)) {
                let piece = share.piece(clause).ok_or_else(|| {
                    SharingError::Inconsistent(format!(
                        "party {id} lacks its piece for clause {clause}"
                    ))
                })?;
                match recovered {
                    None => recovered = Some(piece),
                    Some(seen) if seen != piece => {
                        warn!(clause = %clause, party = id, "conflicting pieces");
                        return Err(SharingError::Inconsistent(format!(
                            "parties disagree on the piece for clause {clause}"
                        )));
                    }
                    Some(_) => {}
                }
            }
            let piece = recovered.ok_or_else(|| {
                SharingError::Inconsistent(format!("no supplied share covers clause {clause}"))
            })?;
            total = total.op(piece);
        }
        Ok(total)
    }

    fn reconstruct_dnf(
        &self,
        clauses: &[Clause],
        coalition: &ImmutableBitSet,
        by_id: &BTreeMap<PartyId, &Share<Element<G>>>,
    ) -> Result<Element<G>, SharingError> {
        let mut recovered: Option<Element<G>> = None;
        for clause in clauses.iter().filter(|b| b.is_subset(coalition)) {
            let mut value = self.group.op_identity();
            for id in clause.iter() {
                let piece = by_id
                    .get(&id)
                    .and_then(|share| share.piece(clause))
                    .ok_or_else(|| {
                        SharingError::Inconsistent(format!(
                            "party {id} lacks its piece for clause {clause}"
                        ))
                    })?;
                value = value.op(piece);
            }
            match &recovered {
                None => recovered = Some(value),
                Some(seen) if *seen != value => {
                    warn!(clause = %clause, "minimal qualified sets disagree");
                    return Err(SharingError::Inconsistent(format!(
                        "clause {clause} reconstructs a different secret"
                    )));
                }
                Some(_) => {}
            }
        }
        recovered.ok_or_else(|| {
            SharingError::Inconsistent(format!(
                "no minimal qualified set lies inside {coalition}"
            ))
        })
    }

    /// Converts a share into an additive share for the unanimity structure
    /// `target`.
    ///
    /// Summing the converted shares of every quorum member yields the secret.
    /// For CNF each clause is contributed by its pivot, the lowest quorum
    /// member outside it.  For DNF the first clause inside the quorum is
    /// contributed by its members and everyone else contributes the identity.
    #[instrument(level = "debug", skip_all, fields(party = share.id(), quorum = %target.quorum()))]
    pub fn share_to_additive(
        &self,
        share: &Share<Element<G>>,
        target: &UnanimityAccessStructure,
    ) -> Result<AdditiveShare<Element<G>>, SharingError> {
        let id = share.id();
        let quorum = target.quorum();
        if !quorum.contains(id) {
            return Err(SharingError::Membership(format!(
                "party {id} is not in quorum {quorum}"
            )));
        }
        if !self.access.is_qualified(&quorum) {
            return Err(SharingError::Unauthorized(quorum));
        }
        self.check_pieces(share)?;

        let missing = |clause: &Clause| {
            SharingError::Inconsistent(format!("party {id} lacks its piece for clause {clause}"))
        };
        let mut value = self.group.op_identity();
        match self.access.clause_kind() {
            ClauseKind::MaximalUnqualified => {
                for clause in self.access.clauses() {
                    if target.pivot(&clause) == Some(id) {
                        let piece = share.piece(&clause).ok_or_else(|| missing(&clause))?;
                        value = value.op(piece);
                    }
                }
            }
            ClauseKind::MinimalQualified => {
                let pivot = self
                    .access
                    .clauses()
                    .find(|b| b.is_subset(&quorum))
                    .ok_or_else(|| {
                        SharingError::InvalidStructure(format!(
                            "no minimal qualified set inside qualified quorum {quorum}"
                        ))
                    })?;
                if pivot.contains(id) {
                    let piece = share.piece(&pivot).ok_or_else(|| missing(&pivot))?;
                    value = value.op(piece);
                }
            }
        }
        Ok(AdditiveShare::new(id, value))
    }

    fn check_pieces(&self, share: &Share<Element<G>>) -> Result<(), SharingError> {
        match share.pieces().iter().find(|(_, piece)| !self.group.contains(piece)) {
            Some((clause, _)) => Err(SharingError::Inconsistent(format!(
                "party {} holds a piece for {clause} outside {}",
                share.id(),
                self.group.name()
            ))),
            None => Ok(()),
        }
    }

    fn checked_clauses(&self) -> Result<Vec<Clause>, SharingError> {
        let shareholders = self.access.shareholders();
        let kind = self.access.clause_kind();
        let mut seen = BTreeSet::new();
        let mut clauses = Vec::new();
        for clause in self.access.clauses() {
            if !clause.is_subset(&shareholders) {
                return Err(SharingError::InvalidStructure(format!(
                    "clause {clause} names parties outside {shareholders}"
                )));
            }
            match kind {
                ClauseKind::MaximalUnqualified if clause == shareholders => {
                    return Err(SharingError::InvalidStructure(format!(
                        "clause {clause} leaves no shareholder to hold its piece"
                    )));
                }
                ClauseKind::MinimalQualified if clause.is_empty() => {
                    return Err(SharingError::InvalidStructure(
                        "empty minimal qualified set".to_string(),
                    ));
                }
                _ => {}
            }
            if !seen.insert(clause) {
                return Err(SharingError::InvalidStructure(format!(
                    "clause {clause} is listed twice"
                )));
            }
            clauses.push(clause);
        }
        if clauses.is_empty() {
            return Err(SharingError::InvalidStructure(
                "access structure has no clauses".to_string(),
            ));
        }
        Ok(clauses)
    }
}
