//! The additive group of the BN254 scalar field.
//!
//! Secrets shared over this group are ordinary `ark_bn254::Fr` scalars, the
//! natural home for threshold keys on the BN254 curve.  [`Bn254Scalar`] wraps
//! the arkworks type so it can travel through `serde` as a hex string of its
//! canonical compressed encoding.

use crate::errors::SharingError;
use crate::group::{FiniteGroup, GroupElement};
use ark_bn254::Fr;
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Bytes drawn per sample; twice the field size keeps the modular bias
/// below 2^-250.
const WIDE_BYTES: usize = 64;

/// The group `(Fr, +)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bn254ScalarGroup;

/// A BN254 scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bn254Scalar(pub Fr);

impl Bn254Scalar {
    /// Embeds a small integer.
    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Canonical compressed encoding, hex encoded.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(32);
        self.0
            .serialize_compressed(&mut bytes)
            .expect("serialising a scalar into a Vec cannot fail");
        hex::encode(bytes)
    }

    /// Parses the output of [`Bn254Scalar::to_hex`].
    pub fn from_hex(input: &str) -> Result<Self, SharingError> {
        let bytes = hex::decode(input.trim_start_matches("0x"))
            .map_err(|err| SharingError::Codec(format!("invalid scalar hex: {err}")))?;
        Fr::deserialize_compressed(bytes.as_slice())
            .map(Self)
            .map_err(|err| SharingError::Codec(format!("invalid scalar encoding: {err}")))
    }
}

impl GroupElement for Bn254Scalar {
    fn op(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    fn op_inverse(&self) -> Self {
        Self(-self.0)
    }
}

impl FiniteGroup for Bn254ScalarGroup {
    type Element = Bn254Scalar;

    fn op_identity(&self) -> Bn254Scalar {
        Bn254Scalar(Fr::zero())
    }

    fn random<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<Bn254Scalar, SharingError> {
        let mut wide = [0u8; WIDE_BYTES];
        rng.try_fill_bytes(&mut wide)?;
        Ok(Bn254Scalar(Fr::from_le_bytes_mod_order(&wide)))
    }

    fn contains(&self, _element: &Bn254Scalar) -> bool {
        true
    }

    fn name(&self) -> String {
        "BN254 scalar field".to_string()
    }
}

impl fmt::Display for Bn254Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Bn254Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Bn254Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Bn254Scalar::from_hex(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::{ExhaustedRng, SimplePrng};

    #[test]
    fn test_group_law() {
        let g = Bn254ScalarGroup;
        let a = Bn254Scalar::from_u64(5);
        let b = Bn254Scalar::from_u64(7);
        assert_eq!(a.op(&b), Bn254Scalar::from_u64(12));
        assert_eq!(a.op(&a.op_inverse()), g.op_identity());
    }

    #[test]
    fn test_random_samples_differ() {
        let g = Bn254ScalarGroup;
        let mut rng = SimplePrng::new(3);
        let a = g.random(&mut rng).unwrap();
        let b = g.random(&mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_propagates_exhaustion() {
        let mut rng = ExhaustedRng::new(WIDE_BYTES - 1);
        assert!(matches!(
            Bn254ScalarGroup.random(&mut rng),
            Err(SharingError::Randomness(_))
        ));
    }

    #[test]
    fn test_hex_serde() {
        let a = Bn254Scalar::from_u64(999);
        let json = serde_json::to_string(&a).unwrap();
        let back: Bn254Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
        assert!(Bn254Scalar::from_hex("zz").is_err());
        assert_eq!(Bn254Scalar::from_hex(&a.to_hex()).unwrap(), a);
        assert_eq!(a.to_hex().len(), 64);
    }
}
