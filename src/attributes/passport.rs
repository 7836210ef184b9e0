//! Passport-style personal attribute schema.

use serde::{Deserialize, Serialize};

use super::{AttributeSchema, AttributeStore};
use crate::error::Result;
use crate::substrate::{EncryptedCompute, SealedInput};
use crate::types::{Address, CtHandle, SubjectId};

/// Fields of a passport record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassportField {
    Biodata,
    Firstname,
    Lastname,
    Birthdate,
}

/// Sealed input bundle for registering a passport record.
pub struct PassportInput {
    /// Encrypted biodata byte.
    pub biodata: SealedInput,
    /// Encrypted firstname byte.
    pub firstname: SealedInput,
    /// Encrypted lastname byte.
    pub lastname: SealedInput,
    /// Encrypted birthdate, seconds since the epoch.
    pub birthdate: SealedInput,
}

/// Stored passport record: one random internal identifier plus four
/// encrypted fields. Immutable once written.
pub struct PassportRecord {
    internal_id: CtHandle,
    biodata: CtHandle,
    firstname: CtHandle,
    lastname: CtHandle,
    birthdate: CtHandle,
}

/// Schema marker for the passport store variant.
pub struct PassportSchema;

impl AttributeSchema for PassportSchema {
    const STORE: &'static str = "passport";

    type Field = PassportField;
    type Input = PassportInput;
    type Record = PassportRecord;

    fn parse_field(name: &str) -> Option<Self::Field> {
        match name {
            "biodata" => Some(PassportField::Biodata),
            "firstname" => Some(PassportField::Firstname),
            "lastname" => Some(PassportField::Lastname),
            "birthdate" => Some(PassportField::Birthdate),
            _ => None,
        }
    }

    fn seal(
        vm: &dyn EncryptedCompute,
        store: Address,
        input: Self::Input,
    ) -> Result<Self::Record> {
        Ok(PassportRecord {
            internal_id: vm.random_handle(store),
            biodata: vm.encrypt(store, &input.biodata)?,
            firstname: vm.encrypt(store, &input.firstname)?,
            lastname: vm.encrypt(store, &input.lastname)?,
            birthdate: vm.encrypt(store, &input.birthdate)?,
        })
    }

    fn handle(record: &Self::Record, field: Self::Field) -> CtHandle {
        match field {
            PassportField::Biodata => record.biodata,
            PassportField::Firstname => record.firstname,
            PassportField::Lastname => record.lastname,
            PassportField::Birthdate => record.birthdate,
        }
    }

    fn all_handles(record: &Self::Record) -> Vec<CtHandle> {
        vec![
            record.internal_id,
            record.biodata,
            record.firstname,
            record.lastname,
            record.birthdate,
        ]
    }
}

/// Passport-variant attribute store.
pub type PassportStore = AttributeStore<PassportSchema>;

impl AttributeStore<PassportSchema> {
    /// Encrypted biodata handle for `subject`.
    pub fn biodata(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, PassportField::Biodata)
    }

    /// Encrypted firstname handle for `subject`.
    pub fn firstname(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, PassportField::Firstname)
    }

    /// Encrypted lastname handle for `subject`.
    pub fn lastname(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, PassportField::Lastname)
    }

    /// Encrypted birthdate handle for `subject`.
    pub fn birthdate(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, PassportField::Birthdate)
    }
}
