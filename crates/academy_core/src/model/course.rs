//! Course model.
//!
//! # Invariants
//! - `cost_cents` fits `decimal(8, 2)` and is never negative.
//! - Retiring a course does not touch its lessons; hard-deleting it removes
//!   lessons, feedback and teacher links.

use crate::model::validation::{validate_cost, validate_text, ValidationError};
use crate::model::{DisplayName, EntityKind, Record, RecordId, Retireable};
use serde::{Deserialize, Serialize};

pub const COURSE_NAME_MAX_CHARS: usize = 256;
pub const COURSE_COVER_MAX_CHARS: usize = 25;
pub const DEFAULT_COURSE_COVER: &str = "no_image.svg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub description_as_markdown: bool,
    /// Price in cents.
    pub cost_cents: i64,
    /// Cover image reference, relative to the media root.
    pub cover: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_retired: bool,
}

impl Course {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_course_fields(&self.name, self.cost_cents, &self.cover)
    }
}

/// Creation input for [`Course`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub description_as_markdown: bool,
    pub cost_cents: i64,
    pub cover: String,
}

impl NewCourse {
    /// Creates a free course with the default cover.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            description_as_markdown: false,
            cost_cents: 0,
            cover: DEFAULT_COURSE_COVER.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_course_fields(&self.name, self.cost_cents, &self.cover)
    }
}

fn validate_course_fields(name: &str, cost_cents: i64, cover: &str) -> Result<(), ValidationError> {
    validate_text("name", name, COURSE_NAME_MAX_CHARS)?;
    validate_cost(cost_cents)?;
    validate_text("cover", cover, COURSE_COVER_MAX_CHARS)
}

impl Record for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        Some(self.is_retired)
    }
}

impl Retireable for Course {
    fn is_retired(&self) -> bool {
        self.is_retired
    }

    fn retire(&mut self) {
        self.is_retired = true;
    }
}

impl DisplayName for Course {
    fn display_name(&self) -> String {
        format!("{} {}", self.id, self.name)
    }
}
