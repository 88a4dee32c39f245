//! Error type shared by every sharing operation.

use crate::bitset::ImmutableBitSet;
use thiserror::Error;

/// Errors raised while dealing, reconstructing or converting shares.
///
/// None of these are transient: sharing is a deterministic function of its
/// inputs, so callers should surface the error rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharingError {
    #[error("missing {0}")]
    /// A required input was absent (for example an empty share list).
    Missing(&'static str),
    #[error("invalid access structure: {0}")]
    /// The access structure cannot support a sharing.
    InvalidStructure(String),
    #[error("invalid argument: {0}")]
    /// An argument was outside its documented domain.
    InvalidArgument(String),
    #[error("coalition {0} is not authorised to reconstruct")]
    /// The supplied coalition fails the qualification test.
    Unauthorized(ImmutableBitSet),
    #[error("inconsistent shares: {0}")]
    /// Shares disagree on a piece, or a share lacks a piece it must carry.
    Inconsistent(String),
    #[error("membership error: {0}")]
    /// Duplicate, out-of-range or unknown party identifiers.
    Membership(String),
    #[error("randomness source failed: {0}")]
    /// The PRNG could not produce the requested bytes.
    Randomness(String),
    #[error("decode error: {0}")]
    /// JSON or hex decoding failure.
    Codec(String),
    #[error("io error: {0}")]
    /// Underlying filesystem failure.
    Io(String),
}

impl From<rand::Error> for SharingError {
    fn from(err: rand::Error) -> Self {
        Self::Randomness(err.to_string())
    }
}

impl From<serde_json::Error> for SharingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<std::io::Error> for SharingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
