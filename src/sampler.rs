//! Named sampling hooks for secrets and share pieces.

use crate::errors::SharingError;
use crate::group::FiniteGroup;
use rand::RngCore;
use std::fmt;

/// Signature of a sampling hook.
pub type SampleFn<G> =
    fn(&G, &mut dyn RngCore) -> Result<<G as FiniteGroup>::Element, SharingError>;

/// Chooses how random secrets and random share pieces are drawn.
///
/// Both hooks default to the group's uniform sampler.  They are kept apart so
/// a caller can bias one without touching the other.
pub struct Sampler<G: FiniteGroup> {
    secrets: SampleFn<G>,
    shares: SampleFn<G>,
}

fn uniform<G: FiniteGroup>(
    group: &G,
    rng: &mut dyn RngCore,
) -> Result<G::Element, SharingError> {
    group.random(rng)
}

impl<G: FiniteGroup> Sampler<G> {
    /// Uniform sampling for both secrets and pieces.
    pub fn uniform() -> Self {
        Self {
            secrets: uniform::<G>,
            shares: uniform::<G>,
        }
    }

    /// Custom hooks.
    pub fn new(secrets: SampleFn<G>, shares: SampleFn<G>) -> Self {
        Self { secrets, shares }
    }

    /// Draws a secret.
    pub fn secret(&self, group: &G, rng: &mut dyn RngCore) -> Result<G::Element, SharingError> {
        (self.secrets)(group, rng)
    }

    /// Draws a share piece.
    pub fn share(&self, group: &G, rng: &mut dyn RngCore) -> Result<G::Element, SharingError> {
        (self.shares)(group, rng)
    }
}

impl<G: FiniteGroup> Default for Sampler<G> {
    fn default() -> Self {
        Self::uniform()
    }
}

impl<G: FiniteGroup> Clone for Sampler<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: FiniteGroup> Copy for Sampler<G> {}

impl<G: FiniteGroup> fmt::Debug for Sampler<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler").finish_non_exhaustive()
    }
}
