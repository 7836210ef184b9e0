//! Claim derivation: encrypted boolean predicates over encrypted
//! attributes.
//!
//! A claim consumer is any component that can turn a subject's attributes
//! into a claim. Attribute stores dispatch to consumers through the
//! [`ClaimConsumer`] trait, resolved by address from the directory, so new
//! consumers can be wired in without modifying the stores.

pub mod engine;

pub use engine::{ClaimEngine, ClaimRecord};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Address, ClaimId, SubjectId};

/// Kind of a derived claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Threshold comparison over the birthdate.
    Adult,
    /// Equality check over the degree code.
    Degree,
    /// Conjunction of two prior claims.
    Verified,
}

/// Which derivation an attribute store asks a consumer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimSelector {
    DeriveAdult,
    DeriveDegree,
}

impl fmt::Display for ClaimSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimSelector::DeriveAdult => write!(f, "derive_adult"),
            ClaimSelector::DeriveDegree => write!(f, "derive_degree"),
        }
    }
}

/// A component that derives claims on behalf of attribute stores.
///
/// `store` is the address of the attribute store the consumer should read
/// from; the consumer must already hold capability over the fields it
/// reads, normally granted transiently by the store for this one call.
pub trait ClaimConsumer: Send + Sync {
    fn handle_claim(
        &self,
        selector: ClaimSelector,
        subject: SubjectId,
        store: Address,
    ) -> Result<ClaimId>;
}
