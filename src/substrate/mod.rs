//! Encrypted-computation substrate boundary.
//!
//! The protocol never sees plaintext: it computes on opaque ciphertext
//! handles through the [`EncryptedCompute`] capability set and relies on the
//! substrate's grant side-table for all access control. Key rules the
//! substrate enforces:
//!
//! - No ciphertext is readable or usable in computation without an explicit
//!   grant; results of computations start ungranted, so producers must
//!   self-grant before using their own outputs later.
//! - Only the producer of a ciphertext may extend grants over it; grants
//!   are never transferable by a grantee.
//! - Transient grants live only as long as the call scope they were issued
//!   in; [`CallScope`] brackets an outbound call and tears them down on drop.
//!
//! [`vm::CipherVm`] is the in-memory reference implementation; any backend
//! exposing this capability set can stand in for it.

pub mod proof;
pub mod vm;

pub use proof::SealedInput;
pub use vm::CipherVm;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::error::Result;
use crate::types::{Address, CtHandle};

/// Second operand of an encrypted comparison: another ciphertext, or a
/// public constant (constants need no capability).
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    Handle(CtHandle),
    Const(u64),
}

/// Comparison operators available in the encrypted domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Less-than-or-equal.
    Le,
    /// Greater-than-or-equal.
    Ge,
    /// Equality.
    Eq,
}

/// Scope of a capability grant over a ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantScope {
    /// Never expires; never revoked.
    Permanent,
    /// Valid only for the duration of the call scope it was issued in.
    Transient,
}

/// The capability set every encrypted-computation backend must expose.
pub trait EncryptedCompute: Send + Sync {
    /// Admit an externally sealed input, validating its correctness proof
    /// against the producing contract. The new ciphertext carries no
    /// grants.
    fn encrypt(&self, producer: Address, input: &SealedInput) -> Result<CtHandle>;

    /// Mint a fresh unpredictable encrypted value, used for internal record
    /// identifiers. Carries no grants.
    fn random_handle(&self, producer: Address) -> CtHandle;

    /// Encrypted comparison. The caller must hold a capability over every
    /// ciphertext operand; the encrypted boolean result is produced by the
    /// caller and starts ungranted.
    fn compare(
        &self,
        caller: Address,
        cmp: Comparison,
        lhs: CtHandle,
        rhs: Operand,
    ) -> Result<CtHandle>;

    /// Encrypted logical AND of two encrypted booleans. Same capability and
    /// result rules as [`EncryptedCompute::compare`].
    fn and(&self, caller: Address, lhs: CtHandle, rhs: CtHandle) -> Result<CtHandle>;

    /// Record a permanent capability grant. Fails unless `caller` produced
    /// the ciphertext.
    fn grant_permanent(&self, caller: Address, handle: CtHandle, grantee: Address) -> Result<()>;

    /// Record a transient capability grant scoped to the innermost open
    /// call scope. Fails unless `caller` produced the ciphertext and a call
    /// scope is open.
    fn grant_transient(&self, caller: Address, handle: CtHandle, grantee: Address) -> Result<()>;

    /// Whether `party` currently holds any capability over `handle`.
    fn is_permitted(&self, handle: CtHandle, party: Address) -> bool;

    /// Open a call scope for transient grants. Prefer [`CallScope::open`].
    fn begin_call(&self);

    /// Close the innermost call scope, expiring its transient grants.
    fn end_call(&self);

    /// Decrypt a ciphertext on behalf of a granted party, off the protocol
    /// path. The signed authorization proves the grantee requested this
    /// exact ciphertext.
    fn decrypt_on_behalf(
        &self,
        handle: CtHandle,
        grantee: &VerifyingKey,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64>;
}

/// RAII bracket around an outbound call that needs transient grants.
///
/// Dropping the scope expires every transient grant issued inside it,
/// whether the call succeeded or failed.
pub struct CallScope<'a> {
    vm: &'a dyn EncryptedCompute,
}

impl<'a> CallScope<'a> {
    /// Open a new call scope on the substrate.
    pub fn open(vm: &'a dyn EncryptedCompute) -> Self {
        vm.begin_call();
        Self { vm }
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.vm.end_call();
    }
}

/// Signed authorization accompanying a decrypt-on-behalf request.
#[derive(Debug, Clone)]
pub struct DecryptionAuthorization {
    signature: Signature,
}

impl DecryptionAuthorization {
    const DOMAIN: &'static [u8; 16] = b"attestor.decrypt";

    /// Sign an authorization for decrypting `handle` with the grantee's key.
    pub fn sign(handle: CtHandle, key: &SigningKey) -> Self {
        Self {
            signature: key.sign(&Self::message(handle)),
        }
    }

    /// Verify the authorization against a verifying key.
    pub(crate) fn verify(&self, handle: CtHandle, key: &VerifyingKey) -> bool {
        key.verify_strict(&Self::message(handle), &self.signature)
            .is_ok()
    }

    fn message(handle: CtHandle) -> [u8; 32] {
        let mut message = [0u8; 32];
        message[..16].copy_from_slice(Self::DOMAIN);
        message[16..].copy_from_slice(&handle.0.to_le_bytes());
        message
    }
}
