//! Address → component directory.
//!
//! Deployed components register here under their address; other components
//! resolve them by address when a caller supplies one. This is the typed
//! replacement for late-bound string-signature dispatch: a claim consumer
//! is any registered implementation of the `ClaimConsumer` trait, wired in
//! without touching the stores that call it.

use std::sync::Arc;

use dashmap::DashMap;

use crate::attributes::{DiplomaStore, PassportStore};
use crate::claims::ClaimConsumer;
use crate::error::{ProtocolError, Result};
use crate::types::Address;

/// Directory of deployed components, keyed by address.
#[derive(Default)]
pub struct Directory {
    passports: DashMap<Address, Arc<PassportStore>>,
    diplomas: DashMap<Address, Arc<DiplomaStore>>,
    consumers: DashMap<Address, Arc<dyn ClaimConsumer>>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a passport store under its address.
    pub fn register_passport_store(&self, store: Arc<PassportStore>) {
        self.passports.insert(store.address(), store);
    }

    /// Register a diploma store under its address.
    pub fn register_diploma_store(&self, store: Arc<DiplomaStore>) {
        self.diplomas.insert(store.address(), store);
    }

    /// Register a claim consumer under an address.
    pub fn register_consumer(&self, address: Address, consumer: Arc<dyn ClaimConsumer>) {
        self.consumers.insert(address, consumer);
    }

    /// Resolve a passport store by address.
    pub fn passport(&self, address: Address) -> Result<Arc<PassportStore>> {
        if address.is_null() {
            return Err(ProtocolError::InvalidContract(address));
        }
        self.passports
            .get(&address)
            .map(|entry| Arc::clone(&entry))
            .ok_or(ProtocolError::InvalidContract(address))
    }

    /// Resolve a diploma store by address.
    pub fn diploma(&self, address: Address) -> Result<Arc<DiplomaStore>> {
        if address.is_null() {
            return Err(ProtocolError::InvalidContract(address));
        }
        self.diplomas
            .get(&address)
            .map(|entry| Arc::clone(&entry))
            .ok_or(ProtocolError::InvalidContract(address))
    }

    /// Resolve a claim consumer by address.
    pub fn consumer(&self, address: Address) -> Result<Arc<dyn ClaimConsumer>> {
        if address.is_null() {
            return Err(ProtocolError::InvalidContract(address));
        }
        self.consumers
            .get(&address)
            .map(|entry| Arc::clone(&entry))
            .ok_or(ProtocolError::InvalidContract(address))
    }
}
