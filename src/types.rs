//! Core identifier types shared across the protocol.
//!
//! All of these are opaque: an [`Address`] names a party (human wallet or
//! deployed component), a [`SubjectId`] names an identity slot in the
//! registry, a [`ClaimId`] names a derived claim, and a [`CtHandle`] names a
//! ciphertext held by the encrypted-computation substrate. None of them
//! carry plaintext meaning on their own.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 32-byte party identifier.
///
/// Human parties derive their address from an ed25519 verifying key;
/// deployed components derive theirs from a label. The all-zero address is
/// reserved as the null address and is rejected everywhere a real party is
/// expected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The reserved null address.
    pub const NULL: Address = Address([0u8; 32]);

    /// Whether this is the reserved null address.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Derive a component address from a stable label, e.g. `"store:passport"`.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        Address(digest.into())
    }

    /// Derive a party address from an ed25519 verifying key.
    pub fn from_verifying_key(key: &ed25519_dalek::VerifyingKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        Address(digest.into())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(&self.0).into_string();
        write!(f, "Address({}…)", &encoded[..8.min(encoded.len())])
    }
}

/// Sequential opaque identity number assigned by the registry.
///
/// `0` is reserved as "no identity" and is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

impl SubjectId {
    /// The reserved "no identity" value.
    pub const NONE: SubjectId = SubjectId(0);

    /// Whether this is the reserved "no identity" value.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential claim identifier, monotonic across all claim kinds.
///
/// `0` is reserved as invalid/unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId(pub u64);

impl ClaimId {
    /// The reserved invalid/unassigned value.
    pub const NONE: ClaimId = ClaimId(0);
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle naming a ciphertext inside the substrate.
///
/// Holding a handle conveys no capability: decryption and computation both
/// require an explicit grant recorded by the substrate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CtHandle(pub u128);

impl fmt::Display for CtHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for CtHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CtHandle({:016x}…)", self.0 >> 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_address() {
        assert!(Address::NULL.is_null());
        assert!(!Address::derive("store:passport").is_null());
    }

    #[test]
    fn test_derived_addresses_are_stable_and_distinct() {
        assert_eq!(Address::derive("a"), Address::derive("a"));
        assert_ne!(Address::derive("a"), Address::derive("b"));
    }

    #[test]
    fn test_reserved_zero_ids() {
        assert!(SubjectId::NONE.is_none());
        assert!(!SubjectId(1).is_none());
        assert_eq!(ClaimId::NONE, ClaimId(0));
    }
}
