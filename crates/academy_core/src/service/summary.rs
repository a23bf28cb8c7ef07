//! Listing totals per entity type.

use crate::model::EntityKind;
use crate::repo::course_repo::SqliteCourseRepository;
use crate::repo::entity::EntityRepository;
use crate::repo::error::RepoResult;
use crate::repo::feedback_repo::SqliteFeedbackRepository;
use crate::repo::lesson_repo::SqliteLessonRepository;
use crate::repo::news_repo::SqliteNewsRepository;
use crate::repo::query::ListQuery;
use crate::repo::teacher_repo::SqliteTeacherRepository;
use crate::repo::user_repo::SqliteUserRepository;
use rusqlite::Connection;

/// Number of rows each entity listing would report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingCounts {
    pub users: u64,
    pub news: u64,
    pub courses: u64,
    pub lessons: u64,
    pub teachers: u64,
    pub feedback: u64,
}

impl ListingCounts {
    pub fn get(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::User => self.users,
            EntityKind::News => self.news,
            EntityKind::Course => self.courses,
            EntityKind::Lesson => self.lessons,
            EntityKind::Teacher => self.teachers,
            EntityKind::Feedback => self.feedback,
        }
    }
}

/// Counts listed rows of every entity type, honoring the visibility filter
/// unless `include_retired` is set.
pub fn listing_counts(conn: &Connection, include_retired: bool) -> RepoResult<ListingCounts> {
    Ok(ListingCounts {
        users: listing_total(&SqliteUserRepository::try_new(conn)?, include_retired)?,
        news: listing_total(&SqliteNewsRepository::try_new(conn)?, include_retired)?,
        courses: listing_total(&SqliteCourseRepository::try_new(conn)?, include_retired)?,
        lessons: listing_total(&SqliteLessonRepository::try_new(conn)?, include_retired)?,
        teachers: listing_total(&SqliteTeacherRepository::try_new(conn)?, include_retired)?,
        feedback: listing_total(&SqliteFeedbackRepository::try_new(conn)?, include_retired)?,
    })
}

fn listing_total<R: EntityRepository>(repo: &R, include_retired: bool) -> RepoResult<u64> {
    let query = ListQuery {
        include_retired,
        ..ListQuery::default()
    }
    .with_page(1, 1);
    Ok(repo.list(&query)?.total)
}
