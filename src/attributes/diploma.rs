//! Diploma-style credential attribute schema.
//!
//! Independent record space keyed by the same subject ids as the passport
//! store.

use serde::{Deserialize, Serialize};

use super::{AttributeSchema, AttributeStore};
use crate::error::Result;
use crate::substrate::{EncryptedCompute, SealedInput};
use crate::types::{Address, CtHandle, SubjectId};

/// Fields of a diploma record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiplomaField {
    University,
    Degree,
    Grade,
}

/// Sealed input bundle for registering a diploma record.
pub struct DiplomaInput {
    /// Encrypted university code.
    pub university: SealedInput,
    /// Encrypted degree code.
    pub degree: SealedInput,
    /// Encrypted grade code.
    pub grade: SealedInput,
}

/// Stored diploma record. Immutable once written.
pub struct DiplomaRecord {
    internal_id: CtHandle,
    university: CtHandle,
    degree: CtHandle,
    grade: CtHandle,
}

/// Schema marker for the diploma store variant.
pub struct DiplomaSchema;

impl AttributeSchema for DiplomaSchema {
    const STORE: &'static str = "diploma";

    type Field = DiplomaField;
    type Input = DiplomaInput;
    type Record = DiplomaRecord;

    fn parse_field(name: &str) -> Option<Self::Field> {
        match name {
            "university" => Some(DiplomaField::University),
            "degree" => Some(DiplomaField::Degree),
            "grade" => Some(DiplomaField::Grade),
            _ => None,
        }
    }

    fn seal(
        vm: &dyn EncryptedCompute,
        store: Address,
        input: Self::Input,
    ) -> Result<Self::Record> {
        Ok(DiplomaRecord {
            internal_id: vm.random_handle(store),
            university: vm.encrypt(store, &input.university)?,
            degree: vm.encrypt(store, &input.degree)?,
            grade: vm.encrypt(store, &input.grade)?,
        })
    }

    fn handle(record: &Self::Record, field: Self::Field) -> CtHandle {
        match field {
            DiplomaField::University => record.university,
            DiplomaField::Degree => record.degree,
            DiplomaField::Grade => record.grade,
        }
    }

    fn all_handles(record: &Self::Record) -> Vec<CtHandle> {
        vec![
            record.internal_id,
            record.university,
            record.degree,
            record.grade,
        ]
    }
}

/// Diploma-variant attribute store.
pub type DiplomaStore = AttributeStore<DiplomaSchema>;

impl AttributeStore<DiplomaSchema> {
    /// Encrypted university handle for `subject`.
    pub fn university(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, DiplomaField::University)
    }

    /// Encrypted degree handle for `subject`.
    pub fn degree(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, DiplomaField::Degree)
    }

    /// Encrypted grade handle for `subject`.
    pub fn grade(&self, subject: SubjectId) -> Result<CtHandle> {
        self.field_handle(subject, DiplomaField::Grade)
    }
}
