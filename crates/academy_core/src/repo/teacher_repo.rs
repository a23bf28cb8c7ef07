//! Teacher repository and the course/teacher relationship.
//!
//! # Responsibility
//! - Persist teachers and their `course_teachers` join rows.
//! - Answer both directions of the many-to-many relation.
//!
//! # Invariants
//! - Join rows are unique per `(course_id, teacher_id)`.
//! - `Teacher::course_ids` lists links in the order they were created.
//! - Hard-deleting a teacher removes only its join rows.

use crate::model::course::Course;
use crate::model::teacher::{NewTeacher, Teacher};
use crate::model::{EntityKind, RecordId};
use crate::repo::course_repo::{parse_course_row, COURSE_SELECT_SQL};
use crate::repo::entity::{EntityRepository, RetireRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{ListQuery, Page, PageLimits, SortOrder, TeacherOrder};
use crate::repo::schema::{
    ensure_connection_ready, COURSES_TABLE, COURSE_TEACHERS_TABLE, TEACHERS_TABLE,
};
use crate::repo::sql::{
    begin_write, delete_row, ensure_exists, ensure_reference, fetch_one, fetch_page, read_bool,
    retire_row, retire_rows, ListSql,
};
use crate::repo::visibility::retired_predicate;
use rusqlite::{params, Connection, Row};

const TEACHER_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.first_name AS first_name,
    t.last_name AS last_name,
    t.birth_date AS birth_date,
    t.is_retired AS is_retired
FROM teachers t";

pub trait TeacherRepository:
    RetireRepository<Entity = Teacher, Draft = NewTeacher, Order = TeacherOrder>
{
    /// Links a teacher to a course. Returns `false` when already linked.
    fn assign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool>;
    /// Removes one link. Returns `false` when no such link existed.
    fn unassign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool>;
    fn courses_for_teacher(
        &self,
        teacher_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Course>>;
    fn teachers_for_course(
        &self,
        course_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Teacher>>;
}

/// SQLite-backed teacher repository.
pub struct SqliteTeacherRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteTeacherRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[TEACHERS_TABLE, COURSE_TEACHERS_TABLE, COURSES_TABLE],
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

    fn load_required(&self, id: RecordId) -> RepoResult<Teacher> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("teacher {id} missing in read-back"))
        })
    }

    fn with_course_ids(&self, mut teacher: Teacher) -> RepoResult<Teacher> {
        teacher.course_ids = load_course_ids(self.conn, teacher.id)?;
        Ok(teacher)
    }
}

impl EntityRepository for SqliteTeacherRepository<'_> {
    type Entity = Teacher;
    type Draft = NewTeacher;
    type Order = TeacherOrder;

    fn create(&self, draft: &NewTeacher) -> RepoResult<Teacher> {
        draft.validate()?;

        let tx = begin_write(self.conn)?;
        tx.execute(
            "INSERT INTO teachers (first_name, last_name, birth_date)
             VALUES (?1, ?2, ?3);",
            params![
                draft.first_name.as_str(),
                draft.last_name.as_str(),
                draft.birth_date.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_links(&tx, id, &draft.course_ids)?;
        tx.commit()?;

        self.load_required(id)
    }

    fn update(&self, teacher: &Teacher) -> RepoResult<Teacher> {
        teacher.validate()?;

        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::Teacher, teacher.id)?;
        tx.execute(
            "UPDATE teachers
             SET
                first_name = ?2,
                last_name = ?3,
                birth_date = ?4
             WHERE id = ?1;",
            params![
                teacher.id,
                teacher.first_name.as_str(),
                teacher.last_name.as_str(),
                teacher.birth_date.as_str(),
            ],
        )?;
        tx.execute(
            "DELETE FROM course_teachers WHERE teacher_id = ?1;",
            [teacher.id],
        )?;
        insert_links(&tx, teacher.id, &teacher.course_ids)?;
        tx.commit()?;

        self.load_required(teacher.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Teacher>> {
        fetch_one(self.conn, TEACHER_SELECT_SQL, "t.id", id, parse_teacher_row)?
            .map(|teacher| self.with_course_ids(teacher))
            .transpose()
    }

    fn list(&self, query: &ListQuery<TeacherOrder>) -> RepoResult<Page<Teacher>> {
        let mut sql = ListSql::new(TEACHER_SELECT_SQL, "FROM teachers t");
        if let Some(predicate) =
            retired_predicate(EntityKind::Teacher, query.include_retired, "t")
        {
            sql.filter(predicate);
        }
        let page = fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_teacher_row,
        )?;

        let items = page
            .items
            .into_iter()
            .map(|teacher| self.with_course_ids(teacher))
            .collect::<RepoResult<Vec<_>>>()?;
        Ok(Page { items, ..page })
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Teacher, id)
    }
}

impl RetireRepository for SqliteTeacherRepository<'_> {
    fn retire(&self, id: RecordId) -> RepoResult<()> {
        retire_row(self.conn, EntityKind::Teacher, id)
    }

    fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize> {
        retire_rows(self.conn, EntityKind::Teacher, ids)
    }
}

impl TeacherRepository for SqliteTeacherRepository<'_> {
    fn assign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::Teacher, teacher_id)?;
        ensure_reference(&tx, EntityKind::Course, course_id)?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO course_teachers (course_id, teacher_id) VALUES (?1, ?2);",
            params![course_id, teacher_id],
        )?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    fn unassign_course(&self, teacher_id: RecordId, course_id: RecordId) -> RepoResult<bool> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::Teacher, teacher_id)?;
        let removed = tx.execute(
            "DELETE FROM course_teachers WHERE course_id = ?1 AND teacher_id = ?2;",
            params![course_id, teacher_id],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn courses_for_teacher(
        &self,
        teacher_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Course>> {
        ensure_exists(self.conn, EntityKind::Teacher, teacher_id)?;

        let mut sql = format!(
            "{COURSE_SELECT_SQL}
             JOIN course_teachers ct ON ct.course_id = c.id
             WHERE ct.teacher_id = ?1"
        );
        if let Some(predicate) = retired_predicate(EntityKind::Course, include_retired, "c") {
            sql.push_str(" AND ");
            sql.push_str(&predicate);
        }
        sql.push_str(" ORDER BY ct.rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([teacher_id])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }

    fn teachers_for_course(
        &self,
        course_id: RecordId,
        include_retired: bool,
    ) -> RepoResult<Vec<Teacher>> {
        ensure_exists(self.conn, EntityKind::Course, course_id)?;

        let mut sql = format!(
            "{TEACHER_SELECT_SQL}
             JOIN course_teachers ct ON ct.teacher_id = t.id
             WHERE ct.course_id = ?1"
        );
        if let Some(predicate) = retired_predicate(EntityKind::Teacher, include_retired, "t") {
            sql.push_str(" AND ");
            sql.push_str(&predicate);
        }
        sql.push_str(" ORDER BY ct.rowid ASC;");

        let mut teachers = Vec::new();
        {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query([course_id])?;
            while let Some(row) = rows.next()? {
                teachers.push(parse_teacher_row(row)?);
            }
        }
        teachers
            .into_iter()
            .map(|teacher| self.with_course_ids(teacher))
            .collect()
    }
}

/// Inserts join rows after checking every course exists. Duplicate ids in
/// `course_ids` collapse into one link.
fn insert_links(conn: &Connection, teacher_id: RecordId, course_ids: &[RecordId]) -> RepoResult<()> {
    for &course_id in course_ids {
        ensure_reference(conn, EntityKind::Course, course_id)?;
    }
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO course_teachers (course_id, teacher_id) VALUES (?1, ?2);",
    )?;
    for &course_id in course_ids {
        stmt.execute(params![course_id, teacher_id])?;
    }
    Ok(())
}

fn load_course_ids(conn: &Connection, teacher_id: RecordId) -> RepoResult<Vec<RecordId>> {
    let mut stmt = conn.prepare(
        "SELECT course_id
         FROM course_teachers
         WHERE teacher_id = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([teacher_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn parse_teacher_row(row: &Row<'_>) -> RepoResult<Teacher> {
    Ok(Teacher {
        id: row.get("id")?,
        course_ids: Vec::new(),
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birth_date: row.get("birth_date")?,
        is_retired: read_bool(row, "is_retired")?,
    })
}
