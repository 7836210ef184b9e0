//! The claim engine: derives, stores, and composes encrypted claims.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use super::{ClaimConsumer, ClaimKind, ClaimSelector};
use crate::config::ProtocolConfig;
use crate::directory::Directory;
use crate::error::{ProtocolError, Result};
use crate::events::{Event, EventLog};
use crate::identity::IdentityRegistry;
use crate::substrate::{Comparison, EncryptedCompute, Operand};
use crate::types::{Address, ClaimId, CtHandle, SubjectId};

/// One derived claim. Never mutated after creation.
#[derive(Debug, Clone, Copy)]
pub struct ClaimRecord {
    pub kind: ClaimKind,
    pub subject: SubjectId,
    pub result: CtHandle,
}

/// Derives encrypted boolean claims and grants decryption capability over
/// each result to itself and to the claim's subject.
pub struct ClaimEngine {
    address: Address,
    config: ProtocolConfig,
    vm: Arc<dyn EncryptedCompute>,
    registry: Arc<IdentityRegistry>,
    directory: Arc<Directory>,
    events: Arc<EventLog>,
    claims: DashMap<ClaimId, ClaimRecord>,
    /// Latest verified (conjunction) claim per subject; last write wins.
    verified: DashMap<SubjectId, CtHandle>,
    /// Next claim id, monotonic across all claim kinds so ids never
    /// collide. Guarded so the increment commits atomically with the claim
    /// write.
    next_claim: Mutex<u64>,
}

impl ClaimEngine {
    /// Deploy an engine at `address`.
    pub fn new(
        address: Address,
        config: ProtocolConfig,
        vm: Arc<dyn EncryptedCompute>,
        registry: Arc<IdentityRegistry>,
        directory: Arc<Directory>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            address,
            config,
            vm,
            registry,
            directory,
            events,
            claims: DashMap::new(),
            verified: DashMap::new(),
            next_claim: Mutex::new(1),
        }
    }

    /// This engine's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Derive an adult claim: the encrypted comparison
    /// `birthdate <= cutoff` (born on or before the cutoff means adult).
    ///
    /// Requires this engine to already hold capability over the birthdate,
    /// normally granted transiently by the store's `generate_claim`.
    pub fn derive_adult_claim(&self, subject: SubjectId, store: Address) -> Result<ClaimId> {
        let store = self.directory.passport(store)?;
        let owner = self.resolve_subject(subject)?;
        let birthdate = store.birthdate(subject)?;

        let result = self.vm.compare(
            self.address,
            Comparison::Le,
            birthdate,
            Operand::Const(self.config.cutoff_secs()),
        )?;
        let claim = self.store_claim(ClaimKind::Adult, subject, result, owner)?;

        debug!(subject = %subject, claim = %claim, "adult claim derived");
        self.events.emit(Event::AdultClaimGenerated { claim });
        Ok(claim)
    }

    /// Derive a degree claim: encrypted equality of the subject's degree
    /// code against the configured required degree.
    pub fn derive_degree_claim(&self, subject: SubjectId, store: Address) -> Result<ClaimId> {
        let store = self.directory.diploma(store)?;
        let owner = self.resolve_subject(subject)?;
        let degree = store.degree(subject)?;

        let result = self.vm.compare(
            self.address,
            Comparison::Eq,
            degree,
            Operand::Const(u64::from(self.config.required_degree)),
        )?;
        let claim = self.store_claim(ClaimKind::Degree, subject, result, owner)?;

        debug!(subject = %subject, claim = %claim, "degree claim derived");
        self.events.emit(Event::DegreeClaimGenerated { claim });
        Ok(claim)
    }

    /// Encrypted result of a claim. Pure lookup; conveys no capability.
    pub fn get_claim(&self, claim: ClaimId) -> Result<CtHandle> {
        Ok(self.claim_record(claim)?.result)
    }

    /// Full record of a claim.
    pub fn claim_record(&self, claim: ClaimId) -> Result<ClaimRecord> {
        let next = *self
            .next_claim
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if claim.0 == 0 || claim.0 >= next {
            return Err(ProtocolError::InvalidClaimId(claim));
        }
        self.claims
            .get(&claim)
            .map(|entry| *entry)
            .ok_or(ProtocolError::InvalidClaimId(claim))
    }

    /// Combine two prior claims into the subject's verified claim: the
    /// encrypted AND of both results, stored under the subject with
    /// last-write-wins semantics. The referenced claims are not mutated.
    pub fn verify_claims(&self, subject: SubjectId, first: ClaimId, second: ClaimId) -> Result<()> {
        let owner = self.resolve_subject(subject)?;
        let lhs = self.claim_record(first)?.result;
        let rhs = self.claim_record(second)?.result;

        let combined = self.vm.and(self.address, lhs, rhs)?;
        self.store_claim(ClaimKind::Verified, subject, combined, owner)?;
        self.verified.insert(subject, combined);

        debug!(subject = %subject, first = %first, second = %second, "claims verified");
        self.events.emit(Event::ClaimsVerified { subject });
        Ok(())
    }

    /// Encrypted result of the subject's latest verified claim.
    pub fn get_verified_claim(&self, subject: SubjectId) -> Result<CtHandle> {
        if subject.is_none() {
            return Err(ProtocolError::InvalidSubject(subject));
        }
        self.verified
            .get(&subject)
            .map(|entry| *entry)
            .ok_or(ProtocolError::ClaimNotFound(subject))
    }

    fn resolve_subject(&self, subject: SubjectId) -> Result<Address> {
        if subject.is_none() {
            return Err(ProtocolError::InvalidSubject(subject));
        }
        self.registry
            .resolve_address(subject)
            .map_err(|_| ProtocolError::InvalidSubject(subject))
    }

    /// Assign the next claim id and store the result, granting permanent
    /// capability over it to this engine and to the subject's owner.
    fn store_claim(
        &self,
        kind: ClaimKind,
        subject: SubjectId,
        result: CtHandle,
        owner: Address,
    ) -> Result<ClaimId> {
        let mut next = self
            .next_claim
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *next == u64::MAX {
            return Err(ProtocolError::CounterExhausted);
        }
        self.vm.grant_permanent(self.address, result, self.address)?;
        self.vm.grant_permanent(self.address, result, owner)?;

        let claim = ClaimId(*next);
        *next += 1;
        self.claims.insert(
            claim,
            ClaimRecord {
                kind,
                subject,
                result,
            },
        );
        Ok(claim)
    }
}

impl ClaimConsumer for ClaimEngine {
    fn handle_claim(
        &self,
        selector: ClaimSelector,
        subject: SubjectId,
        store: Address,
    ) -> Result<ClaimId> {
        match selector {
            ClaimSelector::DeriveAdult => self.derive_adult_claim(subject, store),
            ClaimSelector::DeriveDegree => self.derive_degree_claim(subject, store),
        }
    }
}
