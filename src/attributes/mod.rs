//! Per-identity encrypted attribute stores.
//!
//! Two store variants share one shape: a passport store holding personal
//! attributes and a diploma store holding credential attributes. Both are
//! instances of the generic [`AttributeStore`] over a schema describing the
//! record's encrypted fields.
//!
//! Registration is registrar-gated, one record per subject, fields
//! immutable after creation. At registration time the store grants
//! permanent read capability over every field to the subject's resolved
//! owner address and to itself; the registration event carries only the
//! owner address, never the subject id, so the event log does not link an
//! identity to its attributes.

pub mod diploma;
pub mod passport;

pub use diploma::{DiplomaField, DiplomaInput, DiplomaRecord, DiplomaSchema, DiplomaStore};
pub use passport::{PassportField, PassportInput, PassportRecord, PassportSchema, PassportStore};

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::claims::ClaimSelector;
use crate::directory::Directory;
use crate::error::{ProtocolError, Result};
use crate::events::{Event, EventLog};
use crate::identity::IdentityRegistry;
use crate::roles::RoleTable;
use crate::substrate::{CallScope, EncryptedCompute};
use crate::types::{Address, ClaimId, CtHandle, SubjectId};

/// Shape of one attribute store variant: its encrypted record type, field
/// names, and how a sealed input bundle becomes a record.
pub trait AttributeSchema: Send + Sync + 'static {
    /// Store label used in roles, events, and logs.
    const STORE: &'static str;

    /// Field selector for this variant.
    type Field: Copy + Eq + fmt::Debug + Send + Sync + 'static;
    /// Sealed input bundle supplied by the registrar.
    type Input: Send;
    /// Stored encrypted record.
    type Record: Send + Sync + 'static;

    /// Parse a caller-supplied field name; `None` if unrecognized.
    fn parse_field(name: &str) -> Option<Self::Field>;

    /// Admit a sealed input bundle into the substrate, producing a record
    /// with a fresh random internal identifier.
    fn seal(
        vm: &dyn EncryptedCompute,
        store: Address,
        input: Self::Input,
    ) -> Result<Self::Record>;

    /// Handle of one named field.
    fn handle(record: &Self::Record, field: Self::Field) -> CtHandle;

    /// Every handle in the record, including the internal identifier.
    fn all_handles(record: &Self::Record) -> Vec<CtHandle>;
}

/// Registrar-gated encrypted record store, generic over its schema.
pub struct AttributeStore<S: AttributeSchema> {
    address: Address,
    vm: Arc<dyn EncryptedCompute>,
    registry: Arc<IdentityRegistry>,
    directory: Arc<Directory>,
    roles: RoleTable,
    events: Arc<EventLog>,
    records: DashMap<SubjectId, S::Record>,
}

impl<S: AttributeSchema> AttributeStore<S> {
    /// Deploy a store at `address` with `owner` as its original owner.
    pub fn new(
        address: Address,
        owner: Address,
        vm: Arc<dyn EncryptedCompute>,
        registry: Arc<IdentityRegistry>,
        directory: Arc<Directory>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            address,
            vm,
            registry,
            roles: RoleTable::new(S::STORE, owner, Arc::clone(&events)),
            directory,
            events,
            records: DashMap::new(),
        }
    }

    /// This store's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Role table for registrar administration.
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// Whether `subject` has a registered record.
    pub fn is_registered(&self, subject: SubjectId) -> bool {
        self.records.contains_key(&subject)
    }

    /// Register the encrypted record for `subject`. Registrar only; at most
    /// one record per subject, immutable once written.
    ///
    /// Grants permanent capability over every field to the subject's
    /// resolved owner address and to this store itself.
    pub fn register(&self, caller: Address, subject: SubjectId, input: S::Input) -> Result<()> {
        if subject.is_none() {
            return Err(ProtocolError::InvalidSubject(subject));
        }
        self.roles.require_registrar(caller)?;
        let owner = self.registry.resolve_address(subject)?;

        match self.records.entry(subject) {
            Entry::Occupied(_) => Err(ProtocolError::AlreadyRegistered(subject)),
            Entry::Vacant(slot) => {
                let record = S::seal(self.vm.as_ref(), self.address, input)?;
                for handle in S::all_handles(&record) {
                    self.vm.grant_permanent(self.address, handle, owner)?;
                    self.vm.grant_permanent(self.address, handle, self.address)?;
                }
                slot.insert(record);

                debug!(store = S::STORE, owner = %owner, "attributes registered");
                self.events.emit(Event::AttributesRegistered {
                    store: S::STORE.to_string(),
                    owner,
                });
                Ok(())
            }
        }
    }

    /// Raw encrypted handle of one field. Returning the handle conveys no
    /// capability; the caller must hold or be granted one separately.
    pub fn field_handle(&self, subject: SubjectId, field: S::Field) -> Result<CtHandle> {
        let record = self
            .records
            .get(&subject)
            .ok_or(ProtocolError::NotRegistered(subject))?;
        Ok(S::handle(&record, field))
    }

    /// Derive a claim over this store's fields through an external claim
    /// consumer.
    ///
    /// Resolves the caller's identity, grants the consumer transient
    /// capability over each named field for the duration of the call,
    /// verifies the grants actually took effect, then invokes the consumer.
    /// A consumer failure is surfaced with its own details attached; the
    /// transient grants die with the call either way.
    pub fn generate_claim(
        &self,
        caller: Address,
        consumer_address: Address,
        selector: ClaimSelector,
        fields: &[&str],
    ) -> Result<ClaimId> {
        let subject = self
            .registry
            .resolve_id(caller)
            .map_err(|_| ProtocolError::InvalidSubject(SubjectId::NONE))?;

        let handles = {
            let record = self
                .records
                .get(&subject)
                .ok_or(ProtocolError::NotRegistered(subject))?;
            let mut handles = Vec::with_capacity(fields.len());
            for name in fields {
                let field = S::parse_field(name)
                    .ok_or_else(|| ProtocolError::InvalidField((*name).to_string()))?;
                handles.push(S::handle(&record, field));
            }
            handles
        };

        let consumer = self.directory.consumer(consumer_address)?;

        let _scope = CallScope::open(self.vm.as_ref());
        for handle in &handles {
            self.vm
                .grant_transient(self.address, *handle, consumer_address)?;
            // Never trust a silent grant failure.
            if !self.vm.is_permitted(*handle, consumer_address) {
                return Err(ProtocolError::AccessNotPermitted {
                    handle: *handle,
                    party: consumer_address,
                });
            }
        }

        let claim = consumer
            .handle_claim(selector, subject, self.address)
            .map_err(|err| ProtocolError::ClaimGenerationFailed {
                consumer: consumer_address,
                details: err.to_string(),
            })?;

        debug!(
            store = S::STORE,
            caller = %caller,
            consumer = %consumer_address,
            selector = %selector,
            "claim generated"
        );
        self.events.emit(Event::ClaimRequested {
            caller,
            consumer: consumer_address,
            selector,
        });
        Ok(claim)
    }
}
