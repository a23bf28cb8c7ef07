//! Domain model for accounts, news and the course catalog.
//!
//! # Responsibility
//! - Define the persisted record shapes and their creation drafts.
//! - Host the lifecycle traits shared by retireable records.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `RecordId`.
//! - Retirement is one-directional: there is no operation clearing the flag.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod course;
pub mod feedback;
pub mod lesson;
pub mod news;
pub mod teacher;
pub mod user;
pub mod validation;

/// Store-assigned row identifier shared by every entity type.
pub type RecordId = i64;

/// Entity types known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    News,
    Course,
    Lesson,
    Teacher,
    Feedback,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::User,
        Self::News,
        Self::Course,
        Self::Lesson,
        Self::Teacher,
        Self::Feedback,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::News => "news",
            Self::Course => "courses",
            Self::Lesson => "lessons",
            Self::Teacher => "teachers",
            Self::Feedback => "course_feedback",
        }
    }

    /// Stable lowercase label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::News => "news",
            Self::Course => "course",
            Self::Lesson => "lesson",
            Self::Teacher => "teacher",
            Self::Feedback => "feedback",
        }
    }

    /// Whether default listings hide retired rows of this kind.
    ///
    /// Feedback stores the flag but its listings ignore it. Users have no
    /// retired flag at all; they are deactivated instead.
    pub fn filters_retired(self) -> bool {
        matches!(
            self,
            Self::News | Self::Course | Self::Lesson | Self::Teacher
        )
    }

    /// Whether rows of this kind carry an `updated_at` column.
    pub fn tracks_updated_at(self) -> bool {
        matches!(self, Self::News | Self::Course | Self::Lesson)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Common identity surface of every persisted record.
pub trait Record: DisplayName {
    const KIND: EntityKind;

    fn id(&self) -> RecordId;

    /// Stored retired flag, `None` for kinds that have no such flag.
    fn retired_flag(&self) -> Option<bool>;
}

/// Soft-delete lifecycle: `Active -> Retired`, never back.
pub trait Retireable {
    fn is_retired(&self) -> bool;

    /// Marks the in-memory value retired. Persisting it is the
    /// repository's job (`RetireRepository::retire`).
    fn retire(&mut self);
}

/// Human-readable label used by list and admin presentations.
pub trait DisplayName {
    fn display_name(&self) -> String;
}
