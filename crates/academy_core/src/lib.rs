//! Core domain logic for the academy content store.
//! This crate is the single source of truth for entity lifecycle invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::course::{Course, NewCourse};
pub use model::feedback::{Feedback, NewFeedback, Rating};
pub use model::lesson::{Lesson, NewLesson};
pub use model::news::{NewNews, News};
pub use model::teacher::{NewTeacher, Teacher};
pub use model::user::{NewUser, User};
pub use model::validation::ValidationError;
pub use model::{DisplayName, EntityKind, Record, RecordId, Retireable};
pub use repo::{
    CourseOrder, EntityRepository, FeedbackOrder, LessonOrder, ListQuery, NewsOrder, Page,
    PageLimits, RepoError, RepoResult, RetireRepository, TeacherOrder, UserOrder,
};
pub use service::{listing_counts, LifecycleService, ListingCounts};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
