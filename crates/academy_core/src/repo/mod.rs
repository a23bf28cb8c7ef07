//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts on top of the shared
//!   [`EntityRepository`] / [`RetireRepository`] surface.
//! - Keep SQL, visibility predicates and pagination out of the service layer.
//!
//! # Invariants
//! - Writes validate before any SQL mutation.
//! - Multi-statement writes run in one immediate transaction.
//! - Repositories refuse connections that are not fully migrated.

pub mod course_repo;
pub mod entity;
pub mod error;
pub mod feedback_repo;
pub mod lesson_repo;
pub mod news_repo;
pub mod query;
mod schema;
mod sql;
pub mod teacher_repo;
pub mod user_repo;
pub mod visibility;

pub use course_repo::{CourseCascade, CourseRepository, SqliteCourseRepository};
pub use entity::{EntityRepository, RetireRepository};
pub use error::{RepoError, RepoResult};
pub use feedback_repo::{FeedbackRepository, SqliteFeedbackRepository};
pub use lesson_repo::{LessonRepository, SqliteLessonRepository};
pub use news_repo::{NewsRepository, SqliteNewsRepository};
pub use query::{
    CourseOrder, FeedbackOrder, LessonOrder, ListQuery, NewsOrder, Page, PageLimits, SortOrder,
    TeacherOrder, UserOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use teacher_repo::{SqliteTeacherRepository, TeacherRepository};
pub use user_repo::{SqliteUserRepository, UserRepository};
pub use visibility::{is_listed, is_visible, retired_predicate};
