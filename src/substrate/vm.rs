//! In-memory reference implementation of the encrypted-computation
//! substrate.
//!
//! Ciphertexts live in a handle table; the grant side-table
//! `(handle, grantee) -> scope` is owned here, collectively for all
//! contracts, never embedded in any component's own state. Transient grants
//! are recorded against the innermost open call scope and expired when that
//! scope closes.

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use ed25519_dalek::VerifyingKey;
use tracing::{debug, warn};

use super::{Comparison, DecryptionAuthorization, EncryptedCompute, GrantScope, Operand, SealedInput};
use crate::error::{ProtocolError, Result};
use crate::types::{Address, CtHandle};

struct CtEntry {
    value: u64,
    producer: Address,
}

/// In-memory encrypted-computation substrate.
pub struct CipherVm {
    cts: DashMap<CtHandle, CtEntry>,
    grants: DashMap<(CtHandle, Address), GrantScope>,
    /// Stack of open call scopes, each listing the transient grants it issued.
    scopes: Mutex<Vec<Vec<(CtHandle, Address)>>>,
}

impl CipherVm {
    /// Create an empty substrate.
    pub fn new() -> Self {
        Self {
            cts: DashMap::new(),
            grants: DashMap::new(),
            scopes: Mutex::new(Vec::new()),
        }
    }

    fn insert_ct(&self, value: u64, producer: Address) -> CtHandle {
        loop {
            let handle = CtHandle(rand::random::<u128>());
            if handle.0 == 0 {
                continue;
            }
            match self.cts.entry(handle) {
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(CtEntry { value, producer });
                    return handle;
                }
            }
        }
    }

    /// Read a ciphertext value for a computing caller, enforcing both
    /// existence and capability.
    fn read_for(&self, caller: Address, handle: CtHandle) -> Result<u64> {
        let entry = self
            .cts
            .get(&handle)
            .ok_or(ProtocolError::UnknownHandle(handle))?;
        if !self.is_permitted(handle, caller) {
            warn!(handle = %handle, party = %caller, "compute denied: no capability");
            return Err(ProtocolError::AccessNotPermitted {
                handle,
                party: caller,
            });
        }
        Ok(entry.value)
    }

    fn require_producer(&self, caller: Address, handle: CtHandle) -> Result<()> {
        let entry = self
            .cts
            .get(&handle)
            .ok_or(ProtocolError::UnknownHandle(handle))?;
        if entry.producer != caller {
            return Err(ProtocolError::NotProducer(handle));
        }
        Ok(())
    }
}

impl Default for CipherVm {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptedCompute for CipherVm {
    fn encrypt(&self, producer: Address, input: &SealedInput) -> Result<CtHandle> {
        if !input.verify(producer) {
            return Err(ProtocolError::InvalidProof);
        }
        Ok(self.insert_ct(input.value(), producer))
    }

    fn random_handle(&self, producer: Address) -> CtHandle {
        self.insert_ct(rand::random::<u64>(), producer)
    }

    fn compare(
        &self,
        caller: Address,
        cmp: Comparison,
        lhs: CtHandle,
        rhs: Operand,
    ) -> Result<CtHandle> {
        let left = self.read_for(caller, lhs)?;
        let right = match rhs {
            Operand::Handle(handle) => self.read_for(caller, handle)?,
            Operand::Const(value) => value,
        };
        let result = match cmp {
            Comparison::Le => left <= right,
            Comparison::Ge => left >= right,
            Comparison::Eq => left == right,
        };
        Ok(self.insert_ct(result as u64, caller))
    }

    fn and(&self, caller: Address, lhs: CtHandle, rhs: CtHandle) -> Result<CtHandle> {
        let left = self.read_for(caller, lhs)? != 0;
        let right = self.read_for(caller, rhs)? != 0;
        Ok(self.insert_ct((left && right) as u64, caller))
    }

    fn grant_permanent(&self, caller: Address, handle: CtHandle, grantee: Address) -> Result<()> {
        self.require_producer(caller, handle)?;
        self.grants.insert((handle, grantee), GrantScope::Permanent);
        debug!(handle = %handle, grantee = %grantee, "permanent grant");
        Ok(())
    }

    fn grant_transient(&self, caller: Address, handle: CtHandle, grantee: Address) -> Result<()> {
        self.require_producer(caller, handle)?;
        if let Some(existing) = self.grants.get(&(handle, grantee)) {
            if *existing == GrantScope::Permanent {
                // Never downgrade a permanent grant.
                return Ok(());
            }
        }
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = scopes.last_mut() else {
            return Err(ProtocolError::TransientOutsideCall);
        };
        self.grants.insert((handle, grantee), GrantScope::Transient);
        current.push((handle, grantee));
        debug!(handle = %handle, grantee = %grantee, "transient grant");
        Ok(())
    }

    fn is_permitted(&self, handle: CtHandle, party: Address) -> bool {
        self.grants.contains_key(&(handle, party))
    }

    fn begin_call(&self) {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Vec::new());
    }

    fn end_call(&self) {
        let issued = self
            .scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        for key in issued {
            // A grant upgraded to permanent inside the call survives it.
            self.grants
                .remove_if(&key, |_, scope| *scope == GrantScope::Transient);
        }
    }

    fn decrypt_on_behalf(
        &self,
        handle: CtHandle,
        grantee: &VerifyingKey,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64> {
        if !authorization.verify(handle, grantee) {
            return Err(ProtocolError::BadAuthorization);
        }
        let party = Address::from_verifying_key(grantee);
        let entry = self
            .cts
            .get(&handle)
            .ok_or(ProtocolError::UnknownHandle(handle))?;
        if !self.is_permitted(handle, party) {
            warn!(handle = %handle, party = %party, "decryption denied: no capability");
            return Err(ProtocolError::AccessNotPermitted { handle, party });
        }
        Ok(entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::CallScope;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn vm() -> CipherVm {
        CipherVm::new()
    }

    fn seal_for(value: u64, producer: Address) -> SealedInput {
        SealedInput::seal(value, producer)
    }

    #[test]
    fn test_encrypt_rejects_mismatched_proof() {
        let vm = vm();
        let store = Address::derive("store");
        let other = Address::derive("other");
        let input = seal_for(7, store);

        let err = vm.encrypt(other, &input).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidProof));
    }

    #[test]
    fn test_compute_requires_capability_even_for_producer() {
        let vm = vm();
        let store = Address::derive("store");
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        // Producing a ciphertext grants nothing; self-grants are mandatory.
        let err = vm
            .compare(store, Comparison::Le, handle, Operand::Const(10))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::AccessNotPermitted { .. }));

        vm.grant_permanent(store, handle, store).unwrap();
        vm.compare(store, Comparison::Le, handle, Operand::Const(10))
            .unwrap();
    }

    #[test]
    fn test_only_producer_extends_grants() {
        let vm = vm();
        let store = Address::derive("store");
        let stranger = Address::derive("stranger");
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        let err = vm.grant_permanent(stranger, handle, stranger).unwrap_err();
        assert!(matches!(err, ProtocolError::NotProducer(_)));
    }

    #[test]
    fn test_transient_grant_expires_with_call_scope() {
        let vm = vm();
        let store = Address::derive("store");
        let engine = Address::derive("engine");
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        {
            let _scope = CallScope::open(&vm);
            vm.grant_transient(store, handle, engine).unwrap();
            assert!(vm.is_permitted(handle, engine));
        }
        assert!(!vm.is_permitted(handle, engine));
    }

    #[test]
    fn test_transient_grant_requires_open_scope() {
        let vm = vm();
        let store = Address::derive("store");
        let engine = Address::derive("engine");
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        let err = vm.grant_transient(store, handle, engine).unwrap_err();
        assert!(matches!(err, ProtocolError::TransientOutsideCall));
    }

    #[test]
    fn test_permanent_grant_survives_call_scope() {
        let vm = vm();
        let store = Address::derive("store");
        let engine = Address::derive("engine");
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        {
            let _scope = CallScope::open(&vm);
            vm.grant_transient(store, handle, engine).unwrap();
            vm.grant_permanent(store, handle, engine).unwrap();
        }
        assert!(vm.is_permitted(handle, engine));
    }

    #[test]
    fn test_comparison_directions() {
        let vm = vm();
        let store = Address::derive("store");
        let handle = vm.encrypt(store, &seal_for(100, store)).unwrap();
        vm.grant_permanent(store, handle, store).unwrap();

        let read = |result: CtHandle| {
            vm.grant_permanent(store, result, store).unwrap();
            vm.read_for(store, result).unwrap()
        };

        let le = vm
            .compare(store, Comparison::Le, handle, Operand::Const(100))
            .unwrap();
        assert_eq!(read(le), 1);

        let ge = vm
            .compare(store, Comparison::Ge, handle, Operand::Const(101))
            .unwrap();
        assert_eq!(read(ge), 0);

        let eq = vm
            .compare(store, Comparison::Eq, handle, Operand::Const(100))
            .unwrap();
        assert_eq!(read(eq), 1);
    }

    #[test]
    fn test_decrypt_on_behalf_enforces_grant_and_signature() {
        let vm = vm();
        let store = Address::derive("store");
        let key = SigningKey::generate(&mut OsRng);
        let party = Address::from_verifying_key(&key.verifying_key());
        let handle = vm.encrypt(store, &seal_for(7, store)).unwrap();

        let auth = DecryptionAuthorization::sign(handle, &key);

        // No grant yet: denied despite a valid signature.
        let err = vm
            .decrypt_on_behalf(handle, &key.verifying_key(), &auth)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::AccessNotPermitted { .. }));

        vm.grant_permanent(store, handle, party).unwrap();
        let value = vm
            .decrypt_on_behalf(handle, &key.verifying_key(), &auth)
            .unwrap();
        assert_eq!(value, 7);

        // Someone else's signature never authorizes this grantee's view.
        let other_key = SigningKey::generate(&mut OsRng);
        let forged = DecryptionAuthorization::sign(handle, &other_key);
        let err = vm
            .decrypt_on_behalf(handle, &key.verifying_key(), &forged)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::BadAuthorization));
    }
}
