#![deny(missing_docs)]

//! The design philosophy underlying `isn_sharing` is pedagogical, yet mathematically rigorous.
//! Each module encapsulates one discrete concept of secret sharing over monotone access
//! structures, illustrating how modest abstractions compose into a cohesive sharing engine.
//!
//! This crate aspires to bridge gaps between theoretical exposition and practical engineering,
//! serving both as a didactic resource and a foundation for threshold cryptography research.
//! # isn_sharing
//!
//! **isn_sharing** implements the Ito–Saito–Nishizeki secret sharing scheme
//! for arbitrary monotone access structures.  A dealer splits a secret group
//! element into per-party shares so that exactly the authorised coalitions of
//! a policy can reconstruct it, while every other coalition learns nothing.
//!
//! ## Features
//!
//! * **Party sets** as single 64-bit words: [`BitSet`] and [`ImmutableBitSet`],
//!   with power-set enumeration.
//! * **Access structures** in CNF (maximal unqualified sets) or DNF (minimal
//!   qualified sets), plus threshold and unanimity policies, in the
//!   [`access`](access/index.html) module.
//! * **Groups**: integers modulo an odd prime ([`Field`]) and the BN254
//!   scalar field ([`Bn254ScalarGroup`]), both behind the [`FiniteGroup`]
//!   trait.
//! * **Dealing and reconstruction** with consistency checks, share
//!   homomorphism, and conversion to additive shares for a unanimity quorum,
//!   in the [`scheme`](scheme/index.html) module.
//! * **Policy files** and JSON persistence in [`config`](config/index.html)
//!   and [`io`](io/index.html).
//!
//! ## Usage
//!
//! ```rust
//! use isn_sharing::{
//!     access::CnfAccessStructure, scheme::Scheme, share::Secret, Field, ImmutableBitSet,
//!     SimplePrng,
//! };
//!
//! // Parties {1,2} together and {3,4} together are the largest coalitions
//! // that must learn nothing.
//! let access = CnfAccessStructure::new([
//!     ImmutableBitSet::from_ids(&[1, 2]),
//!     ImmutableBitSet::from_ids(&[3, 4]),
//! ])
//! .unwrap();
//! let field = Field::new(101);
//! let scheme = Scheme::new(field, access).unwrap();
//!
//! let mut rng = SimplePrng::new(7);
//! let shares = scheme.deal(&Secret::new(field.element(42)), &mut rng).unwrap();
//!
//! let coalition = ImmutableBitSet::from_ids(&[1, 3]);
//! let secret = scheme.reconstruct(shares.select(&coalition)).unwrap();
//! assert_eq!(secret.value().value(), 42);
//!
//! let blocked = ImmutableBitSet::from_ids(&[1, 2]);
//! assert!(scheme.reconstruct(shares.select(&blocked)).is_err());
//! ```

pub mod access;
pub mod additive;
mod bitset;
mod bn254;
pub mod config;
mod errors;
mod field;
mod group;
pub mod io;
mod prng;
mod sampler;
pub mod scheme;
pub mod share;

pub use bitset::{BitSet, Clause, ImmutableBitSet, Iter, PartyId, SubSets, MAX_PARTY_ID};
pub use bn254::{Bn254Scalar, Bn254ScalarGroup};
pub use errors::SharingError;
pub use field::{Field, FieldElement};
pub use group::{FiniteGroup, GroupElement};
pub use prng::SimplePrng;
pub use sampler::{SampleFn, Sampler};
