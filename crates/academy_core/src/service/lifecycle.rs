//! Entity lifecycle use-case service.
//!
//! # Responsibility
//! - Provide one create/update/retire/delete/get/list entry point for every
//!   entity type, whatever repository backs it.
//! - Emit metadata-only lifecycle events for every mutation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation or persistence
//!   contracts.
//! - `retire` is only callable for retireable entity types; feedback and
//!   users have no retire entry point.
//! - `get` turns an absent row into `RepoError::NotFound`.

use crate::model::course::Course;
use crate::model::feedback::Feedback;
use crate::model::lesson::Lesson;
use crate::model::news::News;
use crate::model::teacher::Teacher;
use crate::model::user::User;
use crate::model::{EntityKind, Record, RecordId};
use crate::repo::course_repo::{CourseCascade, CourseRepository};
use crate::repo::entity::{EntityRepository, RetireRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::feedback_repo::FeedbackRepository;
use crate::repo::lesson_repo::LessonRepository;
use crate::repo::news_repo::NewsRepository;
use crate::repo::query::{FeedbackOrder, LessonOrder, ListQuery, NewsOrder, Page};
use crate::repo::teacher_repo::TeacherRepository;
use crate::repo::user_repo::UserRepository;
use log::{error, info, warn};
use std::time::Instant;

/// Lifecycle service wrapper over one entity repository.
pub struct LifecycleService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> LifecycleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn kind() -> EntityKind {
        <R::Entity as Record>::KIND
    }

    /// Validates and persists a new record with default flags and
    /// store-assigned timestamps.
    pub fn create(&self, draft: &R::Draft) -> RepoResult<R::Entity> {
        let started_at = Instant::now();
        let result = self.repo.create(draft);
        let id = result.as_ref().ok().map(|entity| entity.id());
        log_outcome("entity_create", Self::kind(), id, started_at, &result);
        result
    }

    /// Re-validates and persists mutable fields. The retired flag and
    /// creation timestamps are left as stored.
    pub fn update(&self, entity: &R::Entity) -> RepoResult<R::Entity> {
        let started_at = Instant::now();
        let result = self.repo.update(entity);
        log_outcome(
            "entity_update",
            Self::kind(),
            Some(entity.id()),
            started_at,
            &result,
        );
        result
    }

    /// Detail read. Retired rows are returned too.
    pub fn get(&self, id: RecordId) -> RepoResult<R::Entity> {
        self.repo.get(id)?.ok_or(RepoError::NotFound {
            entity: Self::kind(),
            id,
        })
    }

    pub fn list(&self, query: &ListQuery<R::Order>) -> RepoResult<Page<R::Entity>> {
        self.repo.list(query)
    }

    /// Structural removal following the entity's cascade rules.
    pub fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.hard_delete(id);
        log_outcome("entity_hard_delete", Self::kind(), Some(id), started_at, &result);
        result
    }
}

impl<R: RetireRepository> LifecycleService<R> {
    /// Marks a record retired. Idempotent and never cascades.
    pub fn retire(&self, id: RecordId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.retire(id);
        log_outcome("entity_retire", Self::kind(), Some(id), started_at, &result);
        result
    }

    /// Retires several records in one transaction and returns how many of
    /// the ids exist.
    pub fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.repo.retire_many(ids);
        match &result {
            Ok(matched) => info!(
                "event=entity_retire_many module=service status=ok entity={} requested={} matched={matched} duration_ms={}",
                Self::kind(),
                ids.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("entity_retire_many", Self::kind(), None, started_at, err),
        }
        result
    }
}

impl<R: UserRepository> LifecycleService<R> {
    /// Clears `is_active`; the account analogue of retiring. Idempotent.
    pub fn deactivate(&self, id: RecordId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_active(id, false);
        log_outcome("user_deactivate", EntityKind::User, Some(id), started_at, &result);
        result
    }

    pub fn activate(&self, id: RecordId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_active(id, true);
        log_outcome("user_activate", EntityKind::User, Some(id), started_at, &result);
        result
    }

    pub fn set_staff(&self, id: RecordId, staff: bool) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.set_staff(id, staff);
        log_outcome("user_set_staff", EntityKind::User, Some(id), started_at, &result);
        result
    }

    pub fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.repo.find_by_username(username)
    }

    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.repo.find_by_email(email)
    }
}

impl<R: NewsRepository> LifecycleService<R> {
    /// Case-insensitive substring search over title, preamble and body.
    /// A blank term behaves like a plain listing.
    pub fn search_news(&self, term: &str, query: &ListQuery<NewsOrder>) -> RepoResult<Page<News>> {
        self.repo.search_news(term, query)
    }
}

impl<R: CourseRepository> LifecycleService<R> {
    /// Hard-deletes a course and reports the dependent rows removed with it.
    pub fn hard_delete_course(&self, id: RecordId) -> RepoResult<CourseCascade> {
        let started_at = Instant::now();
        let result = self.repo.hard_delete_with_report(id);
        log_outcome(
            "entity_hard_delete",
            EntityKind::Course,
            Some(id),
            started_at,
            &result,
        );
        result
    }
}

impl<R: LessonRepository> LifecycleService<R> {
    pub fn lessons_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<LessonOrder>,
    ) -> RepoResult<Page<Lesson>> {
        self.repo.list_lessons_for_course(course_id, query)
    }
}

impl<R: FeedbackRepository> LifecycleService<R> {
    pub fn feedback_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<FeedbackOrder>,
    ) -> RepoResult<Page<Feedback>> {
        self.repo.list_feedback_for_course(course_id, query)
    }
}

impl<R: TeacherRepository> LifecycleService<R> {
    /// Links a teacher to a course. Returns `false` when already linked.
    pub fn assign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.repo.assign_course(teacher_id, course_id);
        log_outcome(
            "teacher_assign_course",
            EntityKind::Teacher,
            Some(teacher_id),
            started_at,
            &result,
        );
        result
    }

    /// Removes one link. Returns `false` when it did not exist.
    pub fn unassign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.repo.unassign_course(teacher_id, course_id);
        log_outcome(
            "teacher_unassign_course",
            EntityKind::Teacher,
            Some(teacher_id),
            started_at,
            &result,
        );
        result
    }

    pub fn courses_for_teacher(
        &self,
        teacher_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Course>> {
        self.repo.courses_for_teacher(teacher_id, include_retired)
    }

    pub fn teachers_for_course(
        &self,
        course_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Teacher>> {
        self.repo.teachers_for_course(course_id, include_retired)
    }
}

fn log_outcome<T>(
    event: &'static str,
    kind: EntityKind,
    id: Option<RecordId>,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok entity={kind} id={} duration_ms={}",
            id_field(id),
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, kind, id, started_at, err),
    }
}

fn log_failure(
    event: &'static str,
    kind: EntityKind,
    id: Option<RecordId>,
    started_at: Instant,
    err: &RepoError,
) {
    let duration_ms = started_at.elapsed().as_millis();
    if err.is_caller_error() {
        warn!(
            "event={event} module=service status=rejected entity={kind} id={} duration_ms={duration_ms} error_code={}",
            id_field(id),
            err.code()
        );
    } else {
        error!(
            "event={event} module=service status=error entity={kind} id={} duration_ms={duration_ms} error_code={} error={err}",
            id_field(id),
            err.code()
        );
    }
}

fn id_field(id: Option<RecordId>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}
