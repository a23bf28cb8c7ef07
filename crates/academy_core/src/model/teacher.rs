//! Teacher model.
//!
//! Teachers relate to courses through independent join rows. Removing a
//! teacher drops only those rows; courses are never touched.

use crate::model::validation::{validate_birth_date, validate_text, ValidationError};
use crate::model::{DisplayName, EntityKind, Record, RecordId, Retireable};
use serde::{Deserialize, Serialize};

pub const TEACHER_NAME_MAX_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: RecordId,
    /// Linked courses in link insertion order. Updates replace the full set.
    pub course_ids: Vec<RecordId>,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub is_retired: bool,
}

impl Teacher {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_teacher_fields(&self.first_name, &self.last_name, &self.birth_date)
    }
}

/// Creation input for [`Teacher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacher {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub course_ids: Vec<RecordId>,
}

impl NewTeacher {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: birth_date.into(),
            course_ids: Vec::new(),
        }
    }

    pub fn with_courses(mut self, course_ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.course_ids = course_ids.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_teacher_fields(&self.first_name, &self.last_name, &self.birth_date)
    }
}

fn validate_teacher_fields(
    first_name: &str,
    last_name: &str,
    birth_date: &str,
) -> Result<(), ValidationError> {
    validate_text("first_name", first_name, TEACHER_NAME_MAX_CHARS)?;
    validate_text("last_name", last_name, TEACHER_NAME_MAX_CHARS)?;
    validate_birth_date(birth_date)
}

impl Record for Teacher {
    const KIND: EntityKind = EntityKind::Teacher;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        Some(self.is_retired)
    }
}

impl Retireable for Teacher {
    fn is_retired(&self) -> bool {
        self.is_retired
    }

    fn retire(&mut self) {
        self.is_retired = true;
    }
}

impl DisplayName for Teacher {
    /// Zero-padded id, then surname and first name: `007 Curie Marie`.
    fn display_name(&self) -> String {
        format!("{:0>3} {} {}", self.id, self.last_name, self.first_name)
    }
}
