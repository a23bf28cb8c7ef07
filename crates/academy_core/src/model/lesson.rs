//! Lesson model.
//!
//! # Invariants
//! - `course_id` references an existing course row (retired or not).
//! - Default listing order is `(course_id ASC, num ASC)`.

use crate::model::validation::{validate_text, ValidationError};
use crate::model::{DisplayName, EntityKind, Record, RecordId, Retireable};
use serde::{Deserialize, Serialize};

pub const LESSON_TITLE_MAX_CHARS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: RecordId,
    pub course_id: RecordId,
    /// Parent course name, joined on read. Ignored by writes.
    #[serde(default)]
    pub course_name: String,
    /// Sequence number inside the course.
    pub num: u32,
    pub title: String,
    pub description: Option<String>,
    pub description_as_markdown: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_retired: bool,
}

impl Lesson {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("title", &self.title, LESSON_TITLE_MAX_CHARS)
    }
}

/// Creation input for [`Lesson`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub course_id: RecordId,
    pub num: u32,
    pub title: String,
    pub description: Option<String>,
    pub description_as_markdown: bool,
}

impl NewLesson {
    pub fn new(course_id: RecordId, num: u32, title: impl Into<String>) -> Self {
        Self {
            course_id,
            num,
            title: title.into(),
            description: None,
            description_as_markdown: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("title", &self.title, LESSON_TITLE_MAX_CHARS)
    }
}

impl Record for Lesson {
    const KIND: EntityKind = EntityKind::Lesson;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        Some(self.is_retired)
    }
}

impl Retireable for Lesson {
    fn is_retired(&self) -> bool {
        self.is_retired
    }

    fn retire(&mut self) {
        self.is_retired = true;
    }
}

impl DisplayName for Lesson {
    fn display_name(&self) -> String {
        format!("{} | {} | {}", self.course_name, self.num, self.title)
    }
}
