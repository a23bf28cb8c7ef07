//! Lesson repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Writes reject a `course_id` with no course row; a retired course is
//!   still a valid parent.
//! - Reads join the parent course name for display.
//! - Lesson visibility is independent of the parent course's flag.

use crate::model::lesson::{Lesson, NewLesson};
use crate::model::{EntityKind, RecordId};
use crate::repo::entity::{EntityRepository, RetireRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{LessonOrder, ListQuery, Page, PageLimits, SortOrder};
use crate::repo::schema::{ensure_connection_ready, COURSES_TABLE, LESSONS_TABLE};
use crate::repo::sql::{
    begin_write, bool_to_int, delete_row, ensure_exists, ensure_reference, fetch_one, fetch_page,
    read_bool, retire_row, retire_rows, ListSql, NOW_MS_SQL,
};
use crate::repo::visibility::retired_predicate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const LESSON_SELECT_SQL: &str = "SELECT
    l.id AS id,
    l.course_id AS course_id,
    c.name AS course_name,
    l.num AS num,
    l.title AS title,
    l.description AS description,
    l.description_as_markdown AS description_as_markdown,
    l.created_at AS created_at,
    l.updated_at AS updated_at,
    l.is_retired AS is_retired
FROM lessons l
JOIN courses c ON c.id = l.course_id";

pub trait LessonRepository:
    RetireRepository<Entity = Lesson, Draft = NewLesson, Order = LessonOrder>
{
    /// Lists the lessons of one course. Unknown courses yield an empty page.
    fn list_lessons_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<LessonOrder>,
    ) -> RepoResult<Page<Lesson>>;
}

/// SQLite-backed lesson repository.
pub struct SqliteLessonRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteLessonRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[LESSONS_TABLE, COURSES_TABLE])?;
        Ok(Self {
            conn,
            limits: PageLimits::default(),
        })
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn load_required(&self, id: RecordId) -> RepoResult<Lesson> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("lesson {id} missing in read-back"))
        })
    }

    fn list_filtered(
        &self,
        query: &ListQuery<LessonOrder>,
        course_id: Option<RecordId>,
    ) -> RepoResult<Page<Lesson>> {
        let mut sql = ListSql::new(LESSON_SELECT_SQL, "FROM lessons l");
        if let Some(predicate) =
            retired_predicate(EntityKind::Lesson, query.include_retired, "l")
        {
            sql.filter(predicate);
        }
        if let Some(course_id) = course_id {
            sql.filter("l.course_id = ?").bind(Value::Integer(course_id));
        }
        fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_lesson_row,
        )
    }
}

impl EntityRepository for SqliteLessonRepository<'_> {
    type Entity = Lesson;
    type Draft = NewLesson;
    type Order = LessonOrder;

    fn create(&self, draft: &NewLesson) -> RepoResult<Lesson> {
        draft.validate()?;

        let tx = begin_write(self.conn)?;
        ensure_reference(&tx, EntityKind::Course, draft.course_id)?;
        tx.execute(
            "INSERT INTO lessons (
                course_id,
                num,
                title,
                description,
                description_as_markdown
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.course_id,
                draft.num,
                draft.title.as_str(),
                draft.description.as_deref(),
                bool_to_int(draft.description_as_markdown),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.load_required(id)
    }

    fn update(&self, lesson: &Lesson) -> RepoResult<Lesson> {
        lesson.validate()?;

        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::Lesson, lesson.id)?;
        ensure_reference(&tx, EntityKind::Course, lesson.course_id)?;
        tx.execute(
            &format!(
                "UPDATE lessons
                 SET
                    course_id = ?2,
                    num = ?3,
                    title = ?4,
                    description = ?5,
                    description_as_markdown = ?6,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                lesson.id,
                lesson.course_id,
                lesson.num,
                lesson.title.as_str(),
                lesson.description.as_deref(),
                bool_to_int(lesson.description_as_markdown),
            ],
        )?;
        tx.commit()?;

        self.load_required(lesson.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Lesson>> {
        fetch_one(self.conn, LESSON_SELECT_SQL, "l.id", id, parse_lesson_row)
    }

    fn list(&self, query: &ListQuery<LessonOrder>) -> RepoResult<Page<Lesson>> {
        self.list_filtered(query, None)
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Lesson, id)
    }
}

impl RetireRepository for SqliteLessonRepository<'_> {
    fn retire(&self, id: RecordId) -> RepoResult<()> {
        retire_row(self.conn, EntityKind::Lesson, id)
    }

    fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize> {
        retire_rows(self.conn, EntityKind::Lesson, ids)
    }
}

impl LessonRepository for SqliteLessonRepository<'_> {
    fn list_lessons_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<LessonOrder>,
    ) -> RepoResult<Page<Lesson>> {
        self.list_filtered(query, Some(course_id))
    }
}

fn parse_lesson_row(row: &Row<'_>) -> RepoResult<Lesson> {
    Ok(Lesson {
        id: row.get("id")?,
        course_id: row.get("course_id")?,
        course_name: row.get("course_name")?,
        num: row.get("num")?,
        title: row.get("title")?,
        description: row.get("description")?,
        description_as_markdown: read_bool(row, "description_as_markdown")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_retired: read_bool(row, "is_retired")?,
    })
}
