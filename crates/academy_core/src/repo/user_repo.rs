//! User account repository.
//!
//! # Invariants
//! - Username and email uniqueness is decided by the store's UNIQUE
//!   constraints and reported as `ValidationError::Duplicate*`.
//! - Accounts are deactivated, never retired; listings do not filter on
//!   `is_active`.
//! - A user referenced by feedback cannot be hard-deleted.

use crate::model::user::{NewUser, User};
use crate::model::validation::{normalize_email, ValidationError};
use crate::model::{EntityKind, RecordId};
use crate::repo::entity::EntityRepository;
use crate::repo::error::{constraint_violation, ConstraintKind, RepoError, RepoResult};
use crate::repo::query::{ListQuery, Page, PageLimits, SortOrder, UserOrder};
use crate::repo::schema::{ensure_connection_ready, FEEDBACK_TABLE, USERS_TABLE};
use crate::repo::sql::{
    begin_write, bool_to_int, count_referencing, delete_row, ensure_exists, fetch_one, fetch_page,
    read_bool, ListSql,
};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    u.id AS id,
    u.username AS username,
    u.email AS email,
    u.first_name AS first_name,
    u.last_name AS last_name,
    u.age AS age,
    u.avatar AS avatar,
    u.is_staff AS is_staff,
    u.is_active AS is_active,
    u.date_joined AS date_joined
FROM users u";

pub trait UserRepository:
    EntityRepository<Entity = User, Draft = NewUser, Order = UserOrder>
{
    /// Sets `is_active`. Idempotent.
    fn set_active(&self, id: RecordId, active: bool) -> RepoResult<()>;
    fn set_staff(&self, id: RecordId, staff: bool) -> RepoResult<()>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Looks up by email after applying the write-time normalization.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS_TABLE, FEEDBACK_TABLE])?;
        Ok(Self {
            conn,
            limits: PageLimits::default(),
        })
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn load_required(&self, id: RecordId) -> RepoResult<User> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("user {id} missing in read-back"))
        })
    }

    fn find_by(&self, column: &str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE u.{column} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn set_flag(&self, id: RecordId, column: &str, value: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("UPDATE users SET {column} = ?2 WHERE id = ?1;"),
            params![id, bool_to_int(value)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id,
            });
        }
        Ok(())
    }
}

impl EntityRepository for SqliteUserRepository<'_> {
    type Entity = User;
    type Draft = NewUser;
    type Order = UserOrder;

    fn create(&self, draft: &NewUser) -> RepoResult<User> {
        let email = draft.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (
                    username,
                    email,
                    first_name,
                    last_name,
                    age,
                    avatar,
                    is_staff
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    draft.username.as_str(),
                    email.as_str(),
                    draft.first_name.as_str(),
                    draft.last_name.as_str(),
                    draft.age,
                    draft.avatar.as_deref(),
                    bool_to_int(draft.is_staff),
                ],
            )
            .map_err(|err| map_unique_violation(err, &draft.username, &email))?;

        self.load_required(self.conn.last_insert_rowid())
    }

    fn update(&self, user: &User) -> RepoResult<User> {
        let email = user.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET
                    username = ?2,
                    email = ?3,
                    first_name = ?4,
                    last_name = ?5,
                    age = ?6,
                    avatar = ?7,
                    is_staff = ?8
                 WHERE id = ?1;",
                params![
                    user.id,
                    user.username.as_str(),
                    email.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.age,
                    user.avatar.as_deref(),
                    bool_to_int(user.is_staff),
                ],
            )
            .map_err(|err| map_unique_violation(err, &user.username, &email))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id: user.id,
            });
        }

        self.load_required(user.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<User>> {
        fetch_one(self.conn, USER_SELECT_SQL, "u.id", id, parse_user_row)
    }

    fn list(&self, query: &ListQuery<UserOrder>) -> RepoResult<Page<User>> {
        let sql = ListSql::new(USER_SELECT_SQL, "FROM users u");
        fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_user_row,
        )
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, EntityKind::User, id)?;

        let feedback = count_referencing(&tx, EntityKind::Feedback.table(), "user_id", id)?;
        if feedback > 0 {
            return Err(RepoError::Constraint {
                entity: EntityKind::User,
                id,
                reason: format!("referenced by {feedback} feedback rows"),
            });
        }

        delete_row(&tx, EntityKind::User, id)?;
        tx.commit()?;
        Ok(())
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn set_active(&self, id: RecordId, active: bool) -> RepoResult<()> {
        self.set_flag(id, "is_active", active)
    }

    fn set_staff(&self, id: RecordId, staff: bool) -> RepoResult<()> {
        self.set_flag(id, "is_staff", staff)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_by("username", username)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = normalize_email(email)?;
        self.find_by("email", &email)
    }
}

/// Maps a UNIQUE failure on `users.username`/`users.email` to the matching
/// validation error; everything else passes through as a storage error.
fn map_unique_violation(err: rusqlite::Error, username: &str, email: &str) -> RepoError {
    let duplicate = match constraint_violation(&err) {
        Some((ConstraintKind::Unique, message)) if message.contains("users.username") => {
            Some(ValidationError::DuplicateUsername(username.to_string()))
        }
        Some((ConstraintKind::Unique, message)) if message.contains("users.email") => {
            Some(ValidationError::DuplicateEmail(email.to_string()))
        }
        _ => None,
    };
    match duplicate {
        Some(validation) => validation.into(),
        None => err.into(),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        age: row.get("age")?,
        avatar: row.get("avatar")?,
        is_staff: read_bool(row, "is_staff")?,
        is_active: read_bool(row, "is_active")?,
        date_joined: row.get("date_joined")?,
    })
}
