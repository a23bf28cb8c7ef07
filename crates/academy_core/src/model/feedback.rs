//! Course feedback model.
//!
//! # Invariants
//! - `rating` is always in `1..=5`.
//! - `is_retired` is stored but not applied by default listings, and no
//!   retire operation exists for feedback; removal is a hard delete.
//! - Rows are inserted with the column's default of 0 and no write path
//!   sets it; a raised flag can only come from rows written elsewhere.

use crate::model::validation::{validate_required, ValidationError};
use crate::model::{DisplayName, EntityKind, Record, RecordId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEEDBACK_COMMENT: &str = "No feedback";

/// Discrete five-star rating.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    #[default]
    Five = 5,
}

impl Rating {
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Star label shown next to the rating, e.g. `⭐⭐⭐`.
    pub fn stars(self) -> String {
        "⭐".repeat(self as usize)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            other => Err(ValidationError::RatingOutOfRange(other)),
        }
    }
}

impl From<Rating> for i64 {
    fn from(value: Rating) -> Self {
        value.value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: RecordId,
    pub course_id: RecordId,
    pub user_id: RecordId,
    /// Joined on read.
    #[serde(default)]
    pub course_name: String,
    /// Joined on read.
    #[serde(default)]
    pub username: String,
    pub comment: String,
    pub rating: Rating,
    pub created_at: i64,
    pub is_retired: bool,
}

impl Feedback {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("comment", &self.comment)
    }
}

/// Creation input for [`Feedback`].
///
/// `rating` is kept as the raw submitted number so out-of-range input is
/// reported as a validation error instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub course_id: RecordId,
    pub user_id: RecordId,
    pub comment: String,
    pub rating: i64,
}

impl NewFeedback {
    pub fn new(course_id: RecordId, user_id: RecordId) -> Self {
        Self {
            course_id,
            user_id,
            comment: DEFAULT_FEEDBACK_COMMENT.to_string(),
            rating: Rating::default().value(),
        }
    }

    pub fn with_rating(mut self, rating: i64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Validates the draft and returns the typed rating.
    pub fn validate(&self) -> Result<Rating, ValidationError> {
        validate_required("comment", &self.comment)?;
        Rating::try_from(self.rating)
    }
}

impl Record for Feedback {
    const KIND: EntityKind = EntityKind::Feedback;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        Some(self.is_retired)
    }
}

impl DisplayName for Feedback {
    fn display_name(&self) -> String {
        format!("{} {} ({})", self.course_id, self.course_name, self.username)
    }
}
