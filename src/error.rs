//! Error taxonomy for the claims protocol.
//!
//! Errors fall into four families: input validation, state conflicts,
//! authorization failures, and downstream-call failures. Every public
//! operation rejects before mutating, so any error leaves shared state
//! unchanged (the one documented exception being capability grants issued
//! ahead of an outbound call, which are scoped to that call and torn down
//! with it).

use crate::types::{Address, ClaimId, CtHandle, SubjectId};

/// Error type for all protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    // -- input validation --
    #[error("the null address is not a valid caller")]
    InvalidCaller,

    #[error("the null address cannot be resolved")]
    InvalidAddress,

    #[error("identity {0} is out of range")]
    OutOfRange(SubjectId),

    #[error("identity {0} was reset and has no current owner")]
    Orphaned(SubjectId),

    #[error("invalid subject id {0}")]
    InvalidSubject(SubjectId),

    #[error("unrecognized attribute field `{0}`")]
    InvalidField(String),

    #[error("no contract registered at {0}")]
    InvalidContract(Address),

    #[error("invalid claim id {0}")]
    InvalidClaimId(ClaimId),

    #[error("no verified claim stored for subject {0}")]
    ClaimNotFound(SubjectId),

    // -- state conflicts --
    #[error("address {0} is already bound to an identity")]
    AlreadyBound(Address),

    #[error("address {0} has no identity binding")]
    NotBound(Address),

    #[error("subject {0} already has registered attributes")]
    AlreadyRegistered(SubjectId),

    #[error("subject {0} has no registered attributes")]
    NotRegistered(SubjectId),

    #[error("identity counter exhausted")]
    CounterExhausted,

    // -- authorization --
    #[error("{caller} lacks the {role} role")]
    Unauthorized { caller: Address, role: &'static str },

    #[error("{party} holds no capability over ciphertext {handle}")]
    AccessNotPermitted { handle: CtHandle, party: Address },

    #[error("only the producer of {0} may extend grants over it")]
    NotProducer(CtHandle),

    #[error("the owner cannot be removed from the registrar set")]
    OwnerLockout,

    #[error("no ownership transfer is pending for {0}")]
    NoPendingTransfer(Address),

    #[error("decryption authorization signature is invalid")]
    BadAuthorization,

    // -- substrate --
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(CtHandle),

    #[error("input proof does not bind the supplied plaintext to this contract")]
    InvalidProof,

    #[error("transient grants require an open call scope")]
    TransientOutsideCall,

    // -- downstream calls --
    #[error("claim generation via {consumer} failed: {details}")]
    ClaimGenerationFailed { consumer: Address, details: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
