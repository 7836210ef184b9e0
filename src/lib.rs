//! Attestor — capability-gated identity claims over encrypted attributes.
//!
//! Citizens bind a wallet address to an opaque numeric identity, registrars
//! record encrypted attributes against that identity, and verifiers derive
//! encrypted boolean claims ("is over 18", "holds the required degree")
//! directly on the ciphertexts. Decryption rights over a claim result are
//! granted to exactly the intended parties; nobody ever sees the underlying
//! attribute plaintext.
//!
//! # Key components
//!
//! - [`IdentityRegistry`]: one-time, bijective address ↔ identity binding
//! - [`attributes::PassportStore`] / [`attributes::DiplomaStore`]:
//!   registrar-gated encrypted record stores
//! - [`ClaimEngine`]: derives adult/degree claims and AND-composes them
//!   into verified claims
//! - [`substrate::CipherVm`]: in-memory encrypted-computation substrate
//!   owning the capability grant table; any backend implementing
//!   [`substrate::EncryptedCompute`] can replace it
//!
//! # Example
//!
//! ```ignore
//! use attestor::*;
//!
//! let vm: Arc<CipherVm> = Arc::new(CipherVm::new());
//! let events = Arc::new(EventLog::new());
//! let registry = Arc::new(IdentityRegistry::new(admin, events.clone()));
//!
//! let subject = registry.claim_identity(alice)?;
//! diploma_store.register(registrar, subject, diploma_input)?;
//! let claim = diploma_store.generate_claim(
//!     alice,
//!     engine_address,
//!     ClaimSelector::DeriveDegree,
//!     &["degree"],
//! )?;
//! ```

pub mod attributes;
pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod identity;
pub mod roles;
pub mod substrate;
pub mod types;

pub use attributes::{
    AttributeSchema, AttributeStore, DiplomaInput, DiplomaStore, PassportInput, PassportStore,
};
pub use claims::{ClaimConsumer, ClaimEngine, ClaimKind, ClaimSelector};
pub use config::ProtocolConfig;
pub use directory::Directory;
pub use error::{ProtocolError, Result};
pub use events::{Event, EventLog};
pub use identity::IdentityRegistry;
pub use roles::RoleTable;
pub use substrate::{
    CallScope, CipherVm, Comparison, DecryptionAuthorization, EncryptedCompute, Operand,
    SealedInput,
};
pub use types::{Address, ClaimId, CtHandle, SubjectId};
