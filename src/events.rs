//! Append-only protocol event log.
//!
//! Every state mutation emits one event, mirrored to `tracing` for live
//! observation and retained in memory for audit and test inspection.
//!
//! Privacy note: attribute registration events carry the owner's address,
//! never the subject id, so the log does not link identities to the stores
//! holding their attributes.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::claims::ClaimSelector;
use crate::types::{Address, ClaimId, SubjectId};

/// Protocol events, one per committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    IdentityAssigned { address: Address, subject: SubjectId },
    IdentityReset { address: Address },
    AttributesRegistered { store: String, owner: Address },
    ClaimRequested { caller: Address, consumer: Address, selector: ClaimSelector },
    AdultClaimGenerated { claim: ClaimId },
    DegreeClaimGenerated { claim: ClaimId },
    ClaimsVerified { subject: SubjectId },
    RegistrarAdded { store: String, registrar: Address },
    RegistrarRemoved { store: String, registrar: Address },
    OwnershipTransferred { store: String, from: Address, to: Address },
}

/// Shared append-only event log.
#[derive(Default)]
pub struct EventLog {
    events: RwLock<Vec<Event>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and mirror it to tracing.
    pub fn emit(&self, event: Event) {
        info!(event = ?event, "protocol event");
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Copy of all events emitted so far, in order.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events emitted so far.
    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no events have been emitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
