//! Course repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Retiring a course never touches lessons, feedback or teacher links.
//! - Hard-deleting a course removes its lessons and feedback and drops its
//!   teacher links (schema-level `ON DELETE CASCADE`), all in one
//!   transaction.

use crate::model::course::{Course, NewCourse};
use crate::model::{EntityKind, RecordId};
use crate::repo::entity::{EntityRepository, RetireRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{CourseOrder, ListQuery, Page, PageLimits, SortOrder};
use crate::repo::schema::{
    ensure_connection_ready, COURSES_TABLE, COURSE_TEACHERS_TABLE, FEEDBACK_TABLE, LESSONS_TABLE,
};
use crate::repo::sql::{
    begin_write, bool_to_int, count_referencing, delete_row, ensure_exists, fetch_one, fetch_page,
    read_bool, retire_row, retire_rows, ListSql, NOW_MS_SQL,
};
use crate::repo::visibility::retired_predicate;
use log::debug;
use rusqlite::{params, Connection, Row};

pub(crate) const COURSE_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.name AS name,
    c.description AS description,
    c.description_as_markdown AS description_as_markdown,
    c.cost_cents AS cost_cents,
    c.cover AS cover,
    c.created_at AS created_at,
    c.updated_at AS updated_at,
    c.is_retired AS is_retired
FROM courses c";

/// Rows removed together with one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseCascade {
    pub lessons: u64,
    pub feedback: u64,
    pub teacher_links: u64,
}

pub trait CourseRepository:
    RetireRepository<Entity = Course, Draft = NewCourse, Order = CourseOrder>
{
    /// Hard-deletes a course and reports what the cascade removed.
    fn hard_delete_with_report(&self, id: RecordId) -> RepoResult<CourseCascade>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteCourseRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                COURSES_TABLE,
                LESSONS_TABLE,
                FEEDBACK_TABLE,
                COURSE_TEACHERS_TABLE,
            ],
        )?;
        Ok(Self {
            conn,
            limits: PageLimits::default(),
        })
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn load_required(&self, id: RecordId) -> RepoResult<Course> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("course {id} missing in read-back"))
        })
    }
}

impl EntityRepository for SqliteCourseRepository<'_> {
    type Entity = Course;
    type Draft = NewCourse;
    type Order = CourseOrder;

    fn create(&self, draft: &NewCourse) -> RepoResult<Course> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO courses (
                name,
                description,
                description_as_markdown,
                cost_cents,
                cover
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.name.as_str(),
                draft.description.as_deref(),
                bool_to_int(draft.description_as_markdown),
                draft.cost_cents,
                draft.cover.as_str(),
            ],
        )?;

        self.load_required(self.conn.last_insert_rowid())
    }

    fn update(&self, course: &Course) -> RepoResult<Course> {
        course.validate()?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE courses
                 SET
                    name = ?2,
                    description = ?3,
                    description_as_markdown = ?4,
                    cost_cents = ?5,
                    cover = ?6,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                course.id,
                course.name.as_str(),
                course.description.as_deref(),
                bool_to_int(course.description_as_markdown),
                course.cost_cents,
                course.cover.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Course,
                id: course.id,
            });
        }

        self.load_required(course.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Course>> {
        fetch_one(self.conn, COURSE_SELECT_SQL, "c.id", id, parse_course_row)
    }

    fn list(&self, query: &ListQuery<CourseOrder>) -> RepoResult<Page<Course>> {
        let mut sql = ListSql::new(COURSE_SELECT_SQL, "FROM courses c");
        if let Some(predicate) =
            retired_predicate(EntityKind::Course, query.include_retired, "c")
        {
            sql.filter(predicate);
        }
        fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_course_row,
        )
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        self.hard_delete_with_report(id).map(|_| ())
    }
}

impl RetireRepository for SqliteCourseRepository<'_> {
    fn retire(&self, id: RecordId) -> RepoResult<()> {
        retire_row(self.conn, EntityKind::Course, id)
    }

    fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize> {
        retire_rows(self.conn, EntityKind::Course, ids)
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn hard_delete_with_report(&self, id: RecordId) -> RepoResult<CourseCascade> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::Course, id)?;

        let cascade = CourseCascade {
            lessons: count_referencing(&tx, EntityKind::Lesson.table(), "course_id", id)?,
            feedback: count_referencing(&tx, EntityKind::Feedback.table(), "course_id", id)?,
            teacher_links: count_referencing(&tx, "course_teachers", "course_id", id)?,
        };
        delete_row(&tx, EntityKind::Course, id)?;
        tx.commit()?;

        debug!(
            "event=course_cascade module=repo status=ok id={id} lessons={} feedback={} teacher_links={}",
            cascade.lessons, cascade.feedback, cascade.teacher_links
        );
        Ok(cascade)
    }
}

pub(crate) fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    Ok(Course {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        description_as_markdown: read_bool(row, "description_as_markdown")?,
        cost_cents: row.get("cost_cents")?,
        cover: row.get("cover")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_retired: read_bool(row, "is_retired")?,
    })
}
