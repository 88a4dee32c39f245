//! The design philosophy underlying `isn_sharing` is pedagogical, yet mathematically rigorous.
//! Each module encapsulates one discrete concept of secret sharing over monotone access
//! structures, illustrating how modest abstractions compose into a cohesive sharing engine.
//!
//! This crate aspires to bridge gaps between theoretical exposition and practical engineering,
//! serving both as a didactic resource and a foundation for threshold cryptography research.
//! Prime field arithmetic, viewed as an additive group.
//!
//! The [`Field`] type encapsulates a prime modulus and exposes addition,
//! subtraction and negation modulo that prime.  It implements
//! [`FiniteGroup`] with addition as the group law, so it can carry secrets
//! for every sharing in this crate.  Elements are [`FieldElement`] values
//! that remember their modulus.

use crate::errors::SharingError;
use crate::group::{FiniteGroup, GroupElement};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A finite field defined by an odd prime modulus.
///
/// The `Field` type stores the modulus `p` and provides the additive
/// operations over the integers modulo `p`.  It does not perform primality
/// testing; it is the user's responsibility to supply an odd prime.  The
/// additive group is cyclic for any modulus, so sharing stays correct even
/// for a composite `p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    p: u64,
}

impl Field {
    /// Creates a new finite field with the given modulus.
    ///
    /// # Panics
    ///
    /// Panics if the modulus is less than 3 or even.  Only odd primes are
    /// supported.
    pub fn new(p: u64) -> Self {
        assert!(p >= 3 && p % 2 == 1, "p must be an odd prime >= 3");
        Field { p }
    }

    /// Fallible constructor for moduli read from configuration.
    pub fn try_new(p: u64) -> Result<Self, SharingError> {
        if p >= 3 && p % 2 == 1 {
            Ok(Field { p })
        } else {
            Err(SharingError::InvalidArgument(format!(
                "field modulus {p} must be an odd prime >= 3"
            )))
        }
    }

    /// Returns the modulus of the field.
    #[inline]
    pub fn modulus(&self) -> u64 {
        self.p
    }

    /// Reduces `value` into the field.
    #[inline]
    pub fn element(&self, value: u64) -> FieldElement {
        FieldElement {
            value: value % self.p,
            modulus: self.p,
        }
    }

    /// Adds two field elements.
    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        let a = a % self.p;
        let b = b % self.p;
        // a + b can exceed u64::MAX when p is close to 2^64
        ((a as u128 + b as u128) % self.p as u128) as u64
    }

    /// Subtracts `b` from `a`.
    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        let a = a % self.p;
        let b = b % self.p;
        if a >= b {
            a - b
        } else {
            self.p - (b - a)
        }
    }

    /// Additive inverse of `a`.
    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        self.sub(0, a)
    }
}

impl FiniteGroup for Field {
    type Element = FieldElement;

    fn op_identity(&self) -> FieldElement {
        self.element(0)
    }

    /// Rejection-samples a 64-bit word below the largest multiple of `p`.
    fn random<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<FieldElement, SharingError> {
        let zone = u64::MAX - (u64::MAX % self.p);
        loop {
            let mut buf = [0u8; 8];
            rng.try_fill_bytes(&mut buf)?;
            let x = u64::from_le_bytes(buf);
            if x < zone {
                return Ok(self.element(x));
            }
        }
    }

    fn contains(&self, element: &FieldElement) -> bool {
        element.modulus == self.p && element.value < self.p
    }

    fn name(&self) -> String {
        format!("Z/{}Z", self.p)
    }
}

/// An element of a [`Field`], tagged with its modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFieldElement")]
pub struct FieldElement {
    value: u64,
    modulus: u64,
}

impl FieldElement {
    /// Canonical representative in `[0, p)`.
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Modulus of the owning field.
    #[inline]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// The owning field.
    #[inline]
    pub fn field(&self) -> Field {
        Field { p: self.modulus }
    }
}

impl GroupElement for FieldElement {
    /// # Panics
    ///
    /// Panics if the operands belong to different fields.
    fn op(&self, other: &Self) -> Self {
        assert_eq!(self.modulus, other.modulus, "field modulus mismatch");
        let field = self.field();
        field.element(field.add(self.value, other.value))
    }

    fn op_inverse(&self) -> Self {
        let field = self.field();
        field.element(field.neg(self.value))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Deserialize)]
struct RawFieldElement {
    value: u64,
    modulus: u64,
}

impl TryFrom<RawFieldElement> for FieldElement {
    type Error = SharingError;

    fn try_from(raw: RawFieldElement) -> Result<Self, SharingError> {
        let field = Field::try_new(raw.modulus)?;
        if raw.value >= field.modulus() {
            return Err(SharingError::Codec(format!(
                "value {} is not reduced modulo {}",
                raw.value, raw.modulus
            )));
        }
        Ok(field.element(raw.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::{ExhaustedRng, SimplePrng};

    #[test]
    fn test_group_law() {
        let field = Field::new(101);
        let a = field.element(60);
        let b = field.element(50);
        assert_eq!(a.op(&b).value(), 9);
        assert_eq!(a.op(&a.op_inverse()), field.op_identity());
        assert_eq!(field.op_identity().op(&b), b);
        assert_eq!(field.element(202).value(), 0);
    }

    #[test]
    fn test_sub_and_neg() {
        let field = Field::new(101);
        assert_eq!(field.sub(3, 5), 99);
        assert_eq!(field.neg(0), 0);
        assert_eq!(field.neg(1), 100);
        assert_eq!(field.add(100, 100), 99);
    }

    #[test]
    fn test_large_modulus_addition_does_not_overflow() {
        let p = 18_446_744_073_709_551_557; // largest 64-bit prime
        let field = Field::new(p);
        assert_eq!(field.add(p - 1, p - 1), p - 2);
    }

    #[test]
    #[should_panic(expected = "modulus mismatch")]
    fn test_mixed_moduli_panic() {
        let _ = Field::new(101).element(1).op(&Field::new(103).element(1));
    }

    #[test]
    fn test_contains_checks_modulus() {
        let field = Field::new(101);
        assert!(field.contains(&field.element(100)));
        assert!(!field.contains(&Field::new(103).element(1)));
    }

    #[test]
    fn test_try_new_rejects_even() {
        assert!(Field::try_new(100).is_err());
        assert!(Field::try_new(1).is_err());
        assert!(Field::try_new(7).is_ok());
    }

    #[test]
    fn test_random_stays_in_range() {
        let field = Field::new(101);
        let mut rng = SimplePrng::new(7);
        for _ in 0..500 {
            assert!(field.random(&mut rng).unwrap().value() < 101);
        }
    }

    #[test]
    fn test_random_propagates_exhaustion() {
        let field = Field::new(101);
        let mut rng = ExhaustedRng::new(1);
        assert!(matches!(
            field.random(&mut rng),
            Err(SharingError::Randomness(_))
        ));
    }

    #[test]
    fn test_serde_validates_range() {
        let field = Field::new(101);
        let json = serde_json::to_string(&field.element(42)).unwrap();
        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field.element(42));
        assert!(serde_json::from_str::<FieldElement>(r#"{"value":101,"modulus":101}"#).is_err());
        assert!(serde_json::from_str::<FieldElement>(r#"{"value":1,"modulus":100}"#).is_err());
    }
}
