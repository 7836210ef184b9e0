//! Owner/registrar role table for attribute stores.
//!
//! Each store gets exactly one owner at construction. The owner is always a
//! registrar and can never be removed from the registrar set, so a store
//! cannot lock itself out of registration. Ownership moves via a two-step
//! propose/accept handshake.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::events::{Event, EventLog};
use crate::types::Address;

/// Per-store role relation.
pub struct RoleTable {
    store: &'static str,
    owner: Mutex<Address>,
    pending_owner: Mutex<Option<Address>>,
    registrars: DashMap<Address, ()>,
    events: Arc<EventLog>,
}

impl RoleTable {
    /// Create a role table for `store` with its original owner, who joins
    /// the registrar set immediately.
    pub fn new(store: &'static str, owner: Address, events: Arc<EventLog>) -> Self {
        let registrars = DashMap::new();
        registrars.insert(owner, ());
        Self {
            store,
            owner: Mutex::new(owner),
            pending_owner: Mutex::new(None),
            registrars,
            events,
        }
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `address` holds the registrar role.
    pub fn is_registrar(&self, address: Address) -> bool {
        self.registrars.contains_key(&address)
    }

    /// Reject callers without the registrar role.
    pub fn require_registrar(&self, caller: Address) -> Result<()> {
        if self.is_registrar(caller) {
            Ok(())
        } else {
            Err(ProtocolError::Unauthorized {
                caller,
                role: "registrar",
            })
        }
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller == self.owner() {
            Ok(())
        } else {
            Err(ProtocolError::Unauthorized {
                caller,
                role: "owner",
            })
        }
    }

    /// Grant the registrar role. Owner only.
    pub fn add_registrar(&self, caller: Address, registrar: Address) -> Result<()> {
        self.require_owner(caller)?;
        if registrar.is_null() {
            return Err(ProtocolError::InvalidAddress);
        }
        self.registrars.insert(registrar, ());
        debug!(store = self.store, registrar = %registrar, "registrar added");
        self.events.emit(Event::RegistrarAdded {
            store: self.store.to_string(),
            registrar,
        });
        Ok(())
    }

    /// Revoke the registrar role. Owner only; the owner itself cannot be
    /// removed.
    pub fn remove_registrar(&self, caller: Address, registrar: Address) -> Result<()> {
        self.require_owner(caller)?;
        if registrar == self.owner() {
            return Err(ProtocolError::OwnerLockout);
        }
        self.registrars.remove(&registrar);
        debug!(store = self.store, registrar = %registrar, "registrar removed");
        self.events.emit(Event::RegistrarRemoved {
            store: self.store.to_string(),
            registrar,
        });
        Ok(())
    }

    /// Propose a new owner. Replaces any pending proposal. Owner only.
    pub fn transfer_ownership(&self, caller: Address, to: Address) -> Result<()> {
        self.require_owner(caller)?;
        if to.is_null() {
            return Err(ProtocolError::InvalidAddress);
        }
        *self
            .pending_owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(to);
        Ok(())
    }

    /// Accept a pending ownership proposal. The new owner joins the
    /// registrar set; the old owner stays a registrar until removed.
    pub fn accept_ownership(&self, caller: Address) -> Result<()> {
        let mut pending = self
            .pending_owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *pending != Some(caller) {
            return Err(ProtocolError::NoPendingTransfer(caller));
        }
        *pending = None;
        drop(pending);

        let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *owner;
        *owner = caller;
        drop(owner);
        self.registrars.insert(caller, ());

        self.events.emit(Event::OwnershipTransferred {
            store: self.store.to_string(),
            from: previous,
            to: caller,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (RoleTable, Address) {
        let owner = Address::derive("owner");
        (
            RoleTable::new("passport", owner, Arc::new(EventLog::new())),
            owner,
        )
    }

    #[test]
    fn test_owner_is_registrar_at_construction() {
        let (table, owner) = table();
        assert!(table.is_registrar(owner));
        assert!(table.require_registrar(owner).is_ok());
    }

    #[test]
    fn test_only_owner_manages_registrars() {
        let (table, owner) = table();
        let registrar = Address::derive("registrar");
        let stranger = Address::derive("stranger");

        let err = table.add_registrar(stranger, registrar).unwrap_err();
        assert!(matches!(err, ProtocolError::Unauthorized { .. }));

        table.add_registrar(owner, registrar).unwrap();
        assert!(table.is_registrar(registrar));

        table.remove_registrar(owner, registrar).unwrap();
        assert!(!table.is_registrar(registrar));
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let (table, owner) = table();
        let err = table.remove_registrar(owner, owner).unwrap_err();
        assert!(matches!(err, ProtocolError::OwnerLockout));
        assert!(table.is_registrar(owner));
    }

    #[test]
    fn test_two_step_ownership_transfer() {
        let (table, owner) = table();
        let successor = Address::derive("successor");

        // Accepting without a proposal fails.
        let err = table.accept_ownership(successor).unwrap_err();
        assert!(matches!(err, ProtocolError::NoPendingTransfer(_)));

        table.transfer_ownership(owner, successor).unwrap();
        // The proposal alone changes nothing.
        assert_eq!(table.owner(), owner);

        table.accept_ownership(successor).unwrap();
        assert_eq!(table.owner(), successor);
        assert!(table.is_registrar(successor));
        // Old owner remains a registrar until explicitly removed.
        assert!(table.is_registrar(owner));
        table.remove_registrar(successor, owner).unwrap();
        assert!(!table.is_registrar(owner));
    }
}
