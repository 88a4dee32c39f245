//! Policy files: which group to share over and who may reconstruct.
//!
//! A policy is a small JSON document:
//!
//! ```json
//! {
//!   "group":  { "kind": "field", "modulus": 101 },
//!   "access": { "kind": "cnf", "sets": [[1, 2], [3, 4]] }
//! }
//! ```
//!
//! `group.kind` is `field` or `bn254`.  `access.kind` is `cnf`, `dnf`,
//! `threshold` or `unanimity`.

use crate::access::{
    AccessStructure, ClauseKind, CnfAccessStructure, DnfAccessStructure,
    ThresholdAccessStructure, UnanimityAccessStructure,
};
use crate::bitset::{Clause, ImmutableBitSet, PartyId};
use crate::errors::SharingError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Group selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupConfig {
    /// Integers modulo an odd prime.
    Field {
        /// The prime.
        modulus: u64,
    },
    /// The BN254 scalar field.
    Bn254,
}

/// Access structure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessConfig {
    /// Maximal unqualified sets.
    Cnf {
        /// The sets, as lists of party identifiers.
        sets: Vec<Vec<PartyId>>,
        /// Shareholders beyond the union of `sets`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shareholders: Option<Vec<PartyId>>,
    },
    /// Minimal qualified sets.
    Dnf {
        /// The sets, as lists of party identifiers.
        sets: Vec<Vec<PartyId>>,
        /// Shareholders beyond the union of `sets`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shareholders: Option<Vec<PartyId>>,
    },
    /// `threshold`-of-`n`.
    Threshold {
        /// Minimum coalition size.
        threshold: usize,
        /// All parties.
        shareholders: Vec<PartyId>,
    },
    /// Everyone in `quorum` together.
    Unanimity {
        /// The parties.
        quorum: Vec<PartyId>,
    },
}

/// A parsed policy file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Group secrets are drawn from.
    pub group: GroupConfig,
    /// Who may reconstruct.
    pub access: AccessConfig,
}

fn ids(list: &[PartyId]) -> Result<ImmutableBitSet, SharingError> {
    ImmutableBitSet::try_from_ids(list.iter().copied())
}

fn clause_list(sets: &[Vec<PartyId>]) -> Result<Vec<Clause>, SharingError> {
    sets.iter().map(Vec::as_slice).map(ids).collect()
}

impl PolicyConfig {
    /// Parses a policy from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SharingError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a policy file.
    pub fn from_path(path: &Path) -> Result<Self, SharingError> {
        let bytes = fs::read(path)
            .map_err(|e| SharingError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SharingError::Codec(format!("{}: {e}", path.display())))
    }

    /// Builds the access structure the policy describes.
    pub fn build_access(&self) -> Result<Policy, SharingError> {
        self.access.build()
    }
}

impl AccessConfig {
    /// Validates the description and builds the structure.
    pub fn build(&self) -> Result<Policy, SharingError> {
        match self {
            AccessConfig::Cnf { sets, shareholders } => {
                let clauses = clause_list(sets)?;
                let structure = match shareholders {
                    Some(extra) => {
                        let all = clauses
                            .iter()
                            .fold(ids(extra)?, |acc, c| acc.union(c));
                        CnfAccessStructure::over(all, clauses)?
                    }
                    None => CnfAccessStructure::new(clauses)?,
                };
                Ok(Policy::Cnf(structure))
            }
            AccessConfig::Dnf { sets, shareholders } => {
                let clauses = clause_list(sets)?;
                let structure = match shareholders {
                    Some(extra) => {
                        let all = clauses
                            .iter()
                            .fold(ids(extra)?, |acc, c| acc.union(c));
                        DnfAccessStructure::over(all, clauses)?
                    }
                    None => DnfAccessStructure::new(clauses)?,
                };
                Ok(Policy::Dnf(structure))
            }
            AccessConfig::Threshold {
                threshold,
                shareholders,
            } => Ok(Policy::Threshold(ThresholdAccessStructure::new(
                *threshold,
                ids(shareholders)?,
            )?)),
            AccessConfig::Unanimity { quorum } => Ok(Policy::Unanimity(
                UnanimityAccessStructure::new(ids(quorum)?)?,
            )),
        }
    }
}

/// Any access structure a policy file can describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// See [`CnfAccessStructure`].
    Cnf(CnfAccessStructure),
    /// See [`DnfAccessStructure`].
    Dnf(DnfAccessStructure),
    /// See [`ThresholdAccessStructure`].
    Threshold(ThresholdAccessStructure),
    /// See [`UnanimityAccessStructure`].
    Unanimity(UnanimityAccessStructure),
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            Policy::Cnf($inner) => $body,
            Policy::Dnf($inner) => $body,
            Policy::Threshold($inner) => $body,
            Policy::Unanimity($inner) => $body,
        }
    };
}

impl AccessStructure for Policy {
    fn shareholders(&self) -> ImmutableBitSet {
        delegate!(self, inner => inner.shareholders())
    }

    fn is_qualified(&self, ids: &ImmutableBitSet) -> bool {
        delegate!(self, inner => inner.is_qualified(ids))
    }

    fn clause_kind(&self) -> ClauseKind {
        delegate!(self, inner => inner.clause_kind())
    }

    fn clauses(&self) -> Box<dyn Iterator<Item = Clause> + '_> {
        delegate!(self, inner => inner.clauses())
    }
}
