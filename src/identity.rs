//! Identity registry: bijective wallet-address ↔ numeric-identity binding.
//!
//! Each address claims at most one sequential identity, starting at 1.
//! `0` is reserved as "no identity". A privileged reset deletes a binding in
//! both directions, after which the vacated number is retired forever: the
//! address may claim a fresh identity, but the old number never resolves to
//! an owner again.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::events::{Event, EventLog};
use crate::types::{Address, SubjectId};

/// Bijective address ↔ identity registry.
pub struct IdentityRegistry {
    admin: Address,
    by_address: DashMap<Address, SubjectId>,
    /// `Some(addr)` for live bindings, `None` for retired (reset) slots.
    by_subject: DashMap<SubjectId, Option<Address>>,
    /// Next identity to assign. Guarded by a mutex so the increment commits
    /// atomically with the binding writes.
    next: Mutex<u64>,
    events: Arc<EventLog>,
}

impl IdentityRegistry {
    /// Create a registry administered by `admin`.
    pub fn new(admin: Address, events: Arc<EventLog>) -> Self {
        Self {
            admin,
            by_address: DashMap::new(),
            by_subject: DashMap::new(),
            next: Mutex::new(1),
            events,
        }
    }

    /// Assign the next unused identity to `caller` and record the binding
    /// in both directions.
    pub fn claim_identity(&self, caller: Address) -> Result<SubjectId> {
        if caller.is_null() {
            return Err(ProtocolError::InvalidCaller);
        }
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        if self.by_address.contains_key(&caller) {
            return Err(ProtocolError::AlreadyBound(caller));
        }
        if *next == u64::MAX {
            return Err(ProtocolError::CounterExhausted);
        }
        let subject = SubjectId(*next);
        *next += 1;
        self.by_address.insert(caller, subject);
        self.by_subject.insert(subject, Some(caller));
        drop(next);

        debug!(address = %caller, subject = %subject, "identity assigned");
        self.events.emit(Event::IdentityAssigned {
            address: caller,
            subject,
        });
        Ok(subject)
    }

    /// Look up the identity bound to `address`.
    pub fn resolve_id(&self, address: Address) -> Result<SubjectId> {
        if address.is_null() {
            return Err(ProtocolError::InvalidAddress);
        }
        self.by_address
            .get(&address)
            .map(|entry| *entry)
            .ok_or(ProtocolError::NotBound(address))
    }

    /// Look up the address a given identity is bound to.
    pub fn resolve_address(&self, subject: SubjectId) -> Result<Address> {
        let next = *self.next.lock().unwrap_or_else(PoisonError::into_inner);
        if subject.is_none() || subject.0 >= next {
            return Err(ProtocolError::OutOfRange(subject));
        }
        match self.by_subject.get(&subject).map(|entry| *entry) {
            Some(Some(address)) => Ok(address),
            _ => Err(ProtocolError::Orphaned(subject)),
        }
    }

    /// Delete the binding for `address` in both directions, retiring its
    /// identity number permanently. Registry-administrator only.
    pub fn reset_binding(&self, caller: Address, address: Address) -> Result<()> {
        if caller != self.admin {
            return Err(ProtocolError::Unauthorized {
                caller,
                role: "registry administrator",
            });
        }
        let Some((_, subject)) = self.by_address.remove(&address) else {
            return Err(ProtocolError::NotBound(address));
        };
        self.by_subject.insert(subject, None);

        debug!(address = %address, subject = %subject, "identity binding reset");
        self.events.emit(Event::IdentityReset { address });
        Ok(())
    }
}
