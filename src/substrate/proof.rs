//! Sealed inputs: plaintext bound to a receiving contract by commitment.
//!
//! Stands in for the substrate's zero-knowledge input proof: the commitment
//! ties a value to the one contract allowed to admit it, so a sealed input
//! replayed against a different contract is rejected at encrypt time.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Address;

/// A plaintext input sealed for one specific receiving contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedInput {
    value: u64,
    nonce: [u8; 32],
    commitment: [u8; 32],
}

impl SealedInput {
    /// Seal `value` for admission by the contract at `receiver`.
    pub fn seal(value: u64, receiver: Address) -> Self {
        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        let commitment = Self::commit(value, receiver, &nonce);
        Self {
            value,
            nonce,
            commitment,
        }
    }

    /// Check the commitment against the contract admitting this input.
    pub(crate) fn verify(&self, receiver: Address) -> bool {
        self.commitment == Self::commit(self.value, receiver, &self.nonce)
    }

    pub(crate) fn value(&self) -> u64 {
        self.value
    }

    fn commit(value: u64, receiver: Address, nonce: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(value.to_le_bytes());
        hasher.update(receiver.0);
        hasher.update(nonce);
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_input_verifies_for_its_receiver() {
        let store = Address::derive("store:passport");
        let input = SealedInput::seal(42, store);
        assert!(input.verify(store));
        assert_eq!(input.value(), 42);
    }

    #[test]
    fn test_sealed_input_rejected_by_other_receiver() {
        let store = Address::derive("store:passport");
        let other = Address::derive("store:diploma");
        let input = SealedInput::seal(42, store);
        assert!(!input.verify(other));
    }
}
