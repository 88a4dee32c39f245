//! Capability traits for the finite groups secrets are drawn from.
//!
//! Shares and secrets only ever need the group law, inverses, the identity
//! and uniform sampling.  Concrete groups implement [`FiniteGroup`] and the
//! sharing code is monomorphised over them.

use crate::errors::SharingError;
use rand::RngCore;
use std::fmt::Debug;
use std::hash::Hash;

/// An element of a group, written multiplicatively in the abstract but
/// additive for every group shipped with this crate.
pub trait GroupElement: Clone + PartialEq + Eq + Hash + Debug {
    /// Applies the group law.
    fn op(&self, other: &Self) -> Self;

    /// Returns the inverse under the group law.
    fn op_inverse(&self) -> Self;
}

/// A finite group with a uniform sampler.
pub trait FiniteGroup: Clone + Debug {
    /// Element type.
    type Element: GroupElement;

    /// Identity under the group law.
    fn op_identity(&self) -> Self::Element;

    /// Samples a uniformly random element.
    ///
    /// Randomness is read with [`RngCore::try_fill_bytes`]; an exhausted or
    /// failing source surfaces as [`SharingError::Randomness`].
    fn random<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<Self::Element, SharingError>;

    /// Whether `element` belongs to this group.  Decoded elements can carry
    /// parameters of another group instance and must be checked before the
    /// group law is applied to them.
    fn contains(&self, element: &Self::Element) -> bool;

    /// Human-readable name, e.g. for transcripts and logs.
    fn name(&self) -> String;

    /// Folds `elements` with the group law, starting at the identity.
    fn sum<'a, I>(&self, elements: I) -> Self::Element
    where
        I: IntoIterator<Item = &'a Self::Element>,
        Self::Element: 'a,
    {
        elements
            .into_iter()
            .fold(self.op_identity(), |acc, e| acc.op(e))
    }
}
