//! News repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Default listing is newest-first and hides retired articles.
//! - Search matches title, preamble and body case-insensitively (ASCII).

use crate::model::news::{NewNews, News};
use crate::model::{EntityKind, RecordId};
use crate::repo::entity::{EntityRepository, RetireRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::query::{ListQuery, NewsOrder, Page, PageLimits, SortOrder};
use crate::repo::schema::{ensure_connection_ready, NEWS_TABLE};
use crate::repo::sql::{
    bool_to_int, contains_pattern, delete_row, fetch_one, fetch_page, read_bool, retire_row,
    retire_rows, ListSql, NOW_MS_SQL,
};
use crate::repo::visibility::retired_predicate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const NEWS_SELECT_SQL: &str = "SELECT
    n.id AS id,
    n.title AS title,
    n.preamble AS preamble,
    n.body AS body,
    n.body_as_markdown AS body_as_markdown,
    n.created_at AS created_at,
    n.updated_at AS updated_at,
    n.is_retired AS is_retired
FROM news n";

/// News-specific operations on top of the shared lifecycle.
pub trait NewsRepository:
    RetireRepository<Entity = News, Draft = NewNews, Order = NewsOrder>
{
    /// Lists articles whose title, preamble or body contains `term`.
    fn search_news(&self, term: &str, query: &ListQuery<NewsOrder>) -> RepoResult<Page<News>>;
}

/// SQLite-backed news repository.
pub struct SqliteNewsRepository<'conn> {
    conn: &'conn Connection,
    limits: PageLimits,
}

impl<'conn> SqliteNewsRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[NEWS_TABLE])?;
        Ok(Self {
            conn,
            limits: PageLimits::default(),
        })
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn load_required(&self, id: RecordId) -> RepoResult<News> {
        self.get(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("news {id} missing in read-back"))
        })
    }

    fn list_filtered(
        &self,
        query: &ListQuery<NewsOrder>,
        term: Option<&str>,
    ) -> RepoResult<Page<News>> {
        let mut sql = ListSql::new(NEWS_SELECT_SQL, "FROM news n");
        if let Some(predicate) = retired_predicate(EntityKind::News, query.include_retired, "n") {
            sql.filter(predicate);
        }
        if let Some(term) = term {
            let pattern = contains_pattern(term);
            sql.filter(
                "(n.title LIKE ? ESCAPE '\\' OR n.preamble LIKE ? ESCAPE '\\' OR n.body LIKE ? ESCAPE '\\')",
            );
            for _ in 0..3 {
                sql.bind(Value::Text(pattern.clone()));
            }
        }
        fetch_page(
            self.conn,
            &sql,
            query.order.order_by(),
            query.window(self.limits),
            parse_news_row,
        )
    }
}

impl EntityRepository for SqliteNewsRepository<'_> {
    type Entity = News;
    type Draft = NewNews;
    type Order = NewsOrder;

    fn create(&self, draft: &NewNews) -> RepoResult<News> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO news (title, preamble, body, body_as_markdown)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                draft.title.as_str(),
                draft.preamble.as_str(),
                draft.body.as_deref(),
                bool_to_int(draft.body_as_markdown),
            ],
        )?;

        self.load_required(self.conn.last_insert_rowid())
    }

    fn update(&self, news: &News) -> RepoResult<News> {
        news.validate()?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE news
                 SET
                    title = ?2,
                    preamble = ?3,
                    body = ?4,
                    body_as_markdown = ?5,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                news.id,
                news.title.as_str(),
                news.preamble.as_str(),
                news.body.as_deref(),
                bool_to_int(news.body_as_markdown),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::News,
                id: news.id,
            });
        }

        self.load_required(news.id)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<News>> {
        fetch_one(self.conn, NEWS_SELECT_SQL, "n.id", id, parse_news_row)
    }

    fn list(&self, query: &ListQuery<NewsOrder>) -> RepoResult<Page<News>> {
        self.list_filtered(query, None)
    }

    fn hard_delete(&self, id: RecordId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::News, id)
    }
}

impl RetireRepository for SqliteNewsRepository<'_> {
    fn retire(&self, id: RecordId) -> RepoResult<()> {
        retire_row(self.conn, EntityKind::News, id)
    }

    fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize> {
        retire_rows(self.conn, EntityKind::News, ids)
    }
}

impl NewsRepository for SqliteNewsRepository<'_> {
    fn search_news(&self, term: &str, query: &ListQuery<NewsOrder>) -> RepoResult<Page<News>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_filtered(query, None);
        }
        self.list_filtered(query, Some(term))
    }
}

fn parse_news_row(row: &Row<'_>) -> RepoResult<News> {
    Ok(News {
        id: row.get("id")?,
        title: row.get("title")?,
        preamble: row.get("preamble")?,
        body: row.get("body")?,
        body_as_markdown: read_bool(row, "body_as_markdown")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_retired: read_bool(row, "is_retired")?,
    })
}
