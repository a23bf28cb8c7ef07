//! Connection readiness checks run by repository constructors.

use crate::db::migrations::{current_version, latest_version};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;

/// Table name and the columns a repository reads or writes.
pub(crate) type TableSpec = (&'static str, &'static [&'static str]);

pub(crate) const USERS_TABLE: TableSpec = (
    "users",
    &[
        "id",
        "username",
        "email",
        "first_name",
        "last_name",
        "age",
        "avatar",
        "is_staff",
        "is_active",
        "date_joined",
    ],
);

pub(crate) const NEWS_TABLE: TableSpec = (
    "news",
    &[
        "id",
        "title",
        "preamble",
        "body",
        "body_as_markdown",
        "created_at",
        "updated_at",
        "is_retired",
    ],
);

pub(crate) const COURSES_TABLE: TableSpec = (
    "courses",
    &[
        "id",
        "name",
        "description",
        "description_as_markdown",
        "cost_cents",
        "cover",
        "created_at",
        "updated_at",
        "is_retired",
    ],
);

pub(crate) const LESSONS_TABLE: TableSpec = (
    "lessons",
    &[
        "id",
        "course_id",
        "num",
        "title",
        "description",
        "description_as_markdown",
        "created_at",
        "updated_at",
        "is_retired",
    ],
);

pub(crate) const TEACHERS_TABLE: TableSpec = (
    "teachers",
    &["id", "first_name", "last_name", "birth_date", "is_retired"],
);

pub(crate) const COURSE_TEACHERS_TABLE: TableSpec =
    ("course_teachers", &["course_id", "teacher_id"]);

pub(crate) const FEEDBACK_TABLE: TableSpec = (
    "course_feedback",
    &[
        "id",
        "course_id",
        "user_id",
        "comment",
        "rating",
        "created_at",
        "is_retired",
    ],
);

/// Verifies migration version, then every listed table and column.
pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[TableSpec]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        let present = table_columns(conn, table)?;
        for &column in columns {
            if !present.iter().any(|name| name == column) {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
