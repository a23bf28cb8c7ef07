//! Course feedback repository.
//!
//! # Invariants
//! - Writes require an existing course and user.
//! - The stored retired flag is never used to filter listings.
//! - Updates change only `comment` and `rating`.

use crate::model::feedback::{Feedback, NewFeedback, Rating};
use crate::model::{EntityKind, RecordId};
use crate::repo::entity::EntityRepository;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{FeedbackOrder, ListQuery, Page, PageLimits, SortOrder};
use crate::repo::schema::{ensure_connection_ready, COURSES_TABLE, FEEDBACK_TABLE, USERS_TABLE};
use crate::repo::sql::{
    begin_write, delete_row, ensure_reference, fetch_one, fetch_page, read_bool, ListSql,
};
use crate::repo::visibility::retired_predicate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const FEEDBACK_SELECT_SQL: &str = "SELECT
    f.id AS id,
    f.course_id AS course_id,
    f.user_id AS user_id,
    c.name AS course_name,
    u.username AS username,
    f.comment AS comment,
    f.rating AS rating,
    f.created_at AS created_at,
    f.is_retired AS is_retired
FROM course_feedback f
JOIN courses c ON c.id = f.course_id
JOIN users u ON u.id = f.user_id";

pub trait FeedbackRepository:
    EntityRepository<Entity = Feedback, Draft = NewFeedback, Order = FeedbackOrder>
{
    fn list_feedback_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<FeedbackOrder>,
    ) -> RepoResult<Page<Feedback>>;
}

/// SQLite-backed feedback repository.
pub struct SqliteFeedbackRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteFeedbackRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[FEEDBACK_TABLE, COURSES_TABLE, USERS_TABLE])?;
        Ok(Self {
            conn,
            limits: PageLimits::default(),
        })
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn load_required(&self, id: RecordId) -> RepoResult<Feedback> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("feedback {id} missing in read-back"))
        })
    }

    fn list_filtered(
        &self,
        query: &ListQuery<FeedbackOrder>,
        course_id: Option<RecordId>,
    ) -> RepoResult<Page<Feedback>> {
        let mut sql = ListSql::new(FEEDBACK_SELECT_SQL, "FROM course_feedback f");
        if let Some(predicate) =
            retired_predicate(EntityKind::Feedback, query.include_retired, "f")
        {
            sql.filter(predicate);
        }
        if let Some(course_id) = course_id {
            sql.filter("f.course_id = ?").bind(Value::Integer(course_id));
        }
        fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_feedback_row,
        )
    }
}

impl EntityRepository for SqliteFeedbackRepository<'_> {
    type Entity = Feedback;
    type Draft = NewFeedback;
    type Order = FeedbackOrder;

    fn create(&self, draft: &NewFeedback) -> RepoResult<Feedback> {
        let rating = draft.validate()?;

        let tx = begin_write(self.conn)?;
        ensure_reference(&tx, EntityKind::Course, draft.course_id)?;
        ensure_reference(&tx, EntityKind::User, draft.user_id)?;
        tx.execute(
            "INSERT INTO course_feedback (course_id, user_id, comment, rating)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                draft.course_id,
                draft.user_id,
                draft.comment.as_str(),
                rating.value(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.load_required(id)
    }

    fn update(&self, feedback: &Feedback) -> RepoResult<Feedback> {
        feedback.validate()?;

        let changed = self.conn.execute(
            "UPDATE course_feedback
             SET
                comment = ?2,
                rating = ?3
             WHERE id = ?1;",
            params![
                feedback.id,
                feedback.comment.as_str(),
                feedback.rating.value(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Feedback,
                id: feedback.id,
            });
        }

        self.load_required(feedback.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Feedback>> {
        fetch_one(self.conn, FEEDBACK_SELECT_SQL, "f.id", id, parse_feedback_row)
    }

    fn list(&self, query: &ListQuery<FeedbackOrder>) -> RepoResult<Page<Feedback>> {
        self.list_filtered(query, None)
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Feedback, id)
    }
}

impl FeedbackRepository for SqliteFeedbackRepository<'_> {
    fn list_feedback_for_course(
        &self,
        course_id: RecordId,
        query: &ListQuery<FeedbackOrder>,
    ) -> RepoResult<Page<Feedback>> {
        self.list_filtered(query, Some(course_id))
    }
}

fn parse_feedback_row(row: &Row<'_>) -> RepoResult<Feedback> {
    let raw_rating: i64 = row.get("rating")?;
    let rating = Rating::try_from(raw_rating)
        .map_err(|_| RepoError::InvalidData(format!("invalid stored rating `{raw_rating}`")))?;

    Ok(Feedback {
        id: row.get("id")?,
        course_id: row.get("course_id")?,
        user_id: row.get("user_id")?,
        course_name: row.get("course_name")?,
        username: row.get("username")?,
        comment: row.get("comment")?,
        rating,
        created_at: row.get("created_at")?,
        is_retired: read_bool(row, "is_retired")?,
    })
}
