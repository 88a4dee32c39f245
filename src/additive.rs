//! Additive secret sharing, the building block of every ISN piece.
//!
//! [`sum_to_secret`] splits a secret into `l` pieces whose ordered group sum
//! is the secret.  Any `l - 1` of the pieces are uniform and independent of
//! it.  [`AdditiveShare`] is the output of converting ISN shares for a
//! unanimity quorum: one element per member, summed by [`reconstruct`].

use crate::bitset::{ImmutableBitSet, PartyId};
use crate::errors::SharingError;
use crate::group::{FiniteGroup, GroupElement};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Splits `secret` into `count` pieces summing to it.
///
/// The first `count - 1` pieces come from `sample`; the last one is
/// `secret · (r_1 · … · r_{count-1})⁻¹`.  A single piece is the secret
/// itself.  Sampler failures abort the split.
pub fn sum_to_secret<E, R, F>(
    secret: &E,
    mut sample: F,
    rng: &mut R,
    count: usize,
) -> Result<Vec<E>, SharingError>
where
    E: GroupElement,
    R: RngCore + ?Sized,
    F: FnMut(&mut R) -> Result<E, SharingError>,
{
    if count == 0 {
        return Err(SharingError::InvalidArgument(
            "cannot split a secret into zero pieces".to_string(),
        ));
    }
    let mut pieces = Vec::with_capacity(count);
    let mut acc: Option<E> = None;
    for _ in 1..count {
        let r = sample(rng)?;
        acc = Some(match acc {
            Some(a) => a.op(&r),
            None => r.clone(),
        });
        pieces.push(r);
    }
    let last = match acc {
        Some(a) => secret.op(&a.op_inverse()),
        None => secret.clone(),
    };
    pieces.push(last);
    Ok(pieces)
}

/// One member's contribution to an additive sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditiveShare<E> {
    /// Owner of the contribution.
    pub id: PartyId,
    /// The contribution itself.
    pub value: E,
}

impl<E: GroupElement> AdditiveShare<E> {
    /// Wraps a value for party `id`.
    pub fn new(id: PartyId, value: E) -> Self {
        Self { id, value }
    }

    /// Applies the group law to the values.
    ///
    /// Both shares must belong to the same party.
    pub fn op(&self, other: &Self) -> Result<Self, SharingError> {
        if self.id != other.id {
            return Err(SharingError::Membership(format!(
                "cannot combine additive shares of parties {} and {}",
                self.id, other.id
            )));
        }
        Ok(Self::new(self.id, self.value.op(&other.value)))
    }
}

/// Sums additive shares from distinct parties.
///
/// The caller is responsible for supplying every member of the quorum;
/// only duplicates, foreign elements and empty input are detected here.
pub fn reconstruct<'a, G, I>(group: &G, shares: I) -> Result<G::Element, SharingError>
where
    G: FiniteGroup,
    G::Element: 'a,
    I: IntoIterator<Item = &'a AdditiveShare<G::Element>>,
{
    let mut seen = ImmutableBitSet::EMPTY;
    let mut total: Option<G::Element> = None;
    for share in shares {
        let id = ImmutableBitSet::try_from_ids([share.id])?;
        if seen.is_superset(&id) {
            return Err(SharingError::Membership(format!(
                "duplicate additive share for party {}",
                share.id
            )));
        }
        if !group.contains(&share.value) {
            return Err(SharingError::Inconsistent(format!(
                "additive share of party {} is not an element of {}",
                share.id,
                group.name()
            )));
        }
        seen = seen.union(&id);
        total = Some(match total {
            Some(t) => t.op(&share.value),
            None => group.op_identity().op(&share.value),
        });
    }
    total.ok_or(SharingError::Missing("additive shares"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldElement};
    use crate::prng::{ExhaustedRng, SimplePrng};
    use proptest::prelude::*;

    fn split(field: Field, secret: u64, count: usize, seed: u64) -> Vec<FieldElement> {
        let mut rng = SimplePrng::new(seed);
        sum_to_secret(
            &field.element(secret),
            |r: &mut SimplePrng| field.random(r),
            &mut rng,
            count,
        )
        .unwrap()
    }

    #[test]
    fn test_single_piece_is_secret() {
        let field = Field::new(101);
        assert_eq!(split(field, 42, 1, 0), vec![field.element(42)]);
    }

    #[test]
    fn test_zero_pieces_rejected() {
        let field = Field::new(101);
        let mut rng = SimplePrng::new(0);
        let err = sum_to_secret(
            &field.element(1),
            |r: &mut SimplePrng| field.random(r),
            &mut rng,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, SharingError::InvalidArgument(_)));
    }

    #[test]
    fn test_sampler_failure_propagates() {
        let field = Field::new(101);
        let mut rng = ExhaustedRng::new(8);
        let err = sum_to_secret(
            &field.element(5),
            |r: &mut ExhaustedRng| field.random(r),
            &mut rng,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, SharingError::Randomness(_)));
    }

    #[test]
    fn test_reconstruct_rejects_duplicates_and_empty() {
        let field = Field::new(101);
        let a = AdditiveShare::new(1, field.element(3));
        let b = AdditiveShare::new(1, field.element(4));
        assert!(matches!(
            reconstruct(&field, [&a, &b]),
            Err(SharingError::Membership(_))
        ));
        let none: [&AdditiveShare<FieldElement>; 0] = [];
        assert_eq!(
            reconstruct(&field, none),
            Err(SharingError::Missing("additive shares"))
        );
    }

    #[test]
    fn test_reconstruct_rejects_foreign_elements() {
        let field = Field::new(101);
        let a = AdditiveShare::new(1, field.element(3));
        let b = AdditiveShare::new(2, Field::new(103).element(4));
        assert!(matches!(
            reconstruct(&field, [&a, &b]),
            Err(SharingError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_share_op() {
        let field = Field::new(101);
        let a = AdditiveShare::new(2, field.element(60));
        let b = AdditiveShare::new(2, field.element(50));
        assert_eq!(a.op(&b).unwrap().value, field.element(9));
        assert!(a.op(&AdditiveShare::new(3, field.element(1))).is_err());
    }

    proptest! {
        #[test]
        fn prop_pieces_sum_to_secret(secret in 0u64..101, count in 1usize..12, seed in any::<u64>()) {
            let field = Field::new(101);
            let pieces = split(field, secret, count, seed);
            prop_assert_eq!(pieces.len(), count);
            prop_assert_eq!(field.sum(&pieces), field.element(secret));
        }
    }
}
