//! SQL helpers shared by the SQLite repositories.

use crate::model::validation::ValidationError;
use crate::model::{EntityKind, RecordId};
use crate::repo::error::{constraint_violation, ConstraintKind, RepoError, RepoResult};
use crate::repo::query::{Page, PageWindow};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Current time in epoch milliseconds, evaluated by SQLite.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Filtered listing statement pieces.
pub(crate) struct ListSql<'a> {
    /// `SELECT ... FROM <table> <alias> [JOIN ...]`
    pub select: &'a str,
    /// `FROM <table> <alias>`; filters must only reference this alias.
    pub count_from: &'a str,
    pub filters: Vec<String>,
    pub binds: Vec<Value>,
}

impl<'a> ListSql<'a> {
    pub(crate) fn new(select: &'a str, count_from: &'a str) -> Self {
        Self {
            select,
            count_from,
            filters: Vec::new(),
            binds: Vec::new(),
        }
    }

    pub(crate) fn filter(&mut self, predicate: impl Into<String>) -> &mut Self {
        self.filters.push(predicate.into());
        self
    }

    pub(crate) fn bind(&mut self, value: Value) -> &mut Self {
        self.binds.push(value);
        self
    }

    fn where_sql(&self) -> String {
        if self.filters.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.filters.join(" AND "))
        }
    }
}

/// Runs a count plus a windowed select and parses each row.
pub(crate) fn fetch_page<T>(
    conn: &Connection,
    sql: &ListSql<'_>,
    order_by: &str,
    window: PageWindow,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Page<T>> {
    let where_sql = sql.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {}{where_sql};", sql.count_from),
        params_from_iter(sql.binds.iter()),
        |row| row.get(0),
    )?;
    let total = u64::try_from(total)
        .map_err(|_| RepoError::InvalidData(format!("negative row count {total}")))?;

    let mut binds = sql.binds.clone();
    binds.push(Value::Integer(i64::from(window.page_size)));
    binds.push(Value::Integer(window.offset));

    let mut stmt = conn.prepare(&format!(
        "{}{where_sql} ORDER BY {order_by} LIMIT ? OFFSET ?;",
        sql.select
    ))?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }

    Ok(Page {
        items,
        page: window.page,
        page_size: window.page_size,
        total,
    })
}

/// Runs a single-row select by id and parses the row when present.
pub(crate) fn fetch_one<T>(
    conn: &Connection,
    select: &str,
    id_column: &str,
    id: RecordId,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(&format!("{select} WHERE {id_column} = ?1;"))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

/// Opens an immediate (write-locking) transaction on a shared connection.
pub(crate) fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

pub(crate) fn row_exists(conn: &Connection, kind: EntityKind, id: RecordId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            kind.table()
        ),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn ensure_exists(conn: &Connection, kind: EntityKind, id: RecordId) -> RepoResult<()> {
    if !row_exists(conn, kind, id)? {
        return Err(RepoError::NotFound { entity: kind, id });
    }
    Ok(())
}

/// Referential check for a parent row; retired parents still count.
pub(crate) fn ensure_reference(
    conn: &Connection,
    kind: EntityKind,
    id: RecordId,
) -> RepoResult<()> {
    if !row_exists(conn, kind, id)? {
        return Err(ValidationError::UnknownReference { entity: kind, id }.into());
    }
    Ok(())
}

/// Sets the retired flag on one row. `updated_at` moves only on the
/// `Active -> Retired` transition so repeated calls leave the row unchanged.
pub(crate) fn retire_row(conn: &Connection, kind: EntityKind, id: RecordId) -> RepoResult<()> {
    let changed = conn.execute(&retire_sql(kind), [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity: kind, id });
    }
    Ok(())
}

/// Retires every listed row in one transaction. Returns how many distinct
/// ids exist; repeated ids count once.
pub(crate) fn retire_rows(
    conn: &Connection,
    kind: EntityKind,
    ids: &[RecordId],
) -> RepoResult<usize> {
    let distinct: BTreeSet<RecordId> = ids.iter().copied().collect();
    let tx = begin_write(conn)?;
    let mut matched = 0;
    {
        let mut stmt = tx.prepare(&retire_sql(kind))?;
        for id in &distinct {
            matched += stmt.execute([id])?;
        }
    }
    tx.commit()?;
    Ok(matched)
}

fn retire_sql(kind: EntityKind) -> String {
    if kind.tracks_updated_at() {
        format!(
            "UPDATE {}
             SET
                updated_at = CASE WHEN is_retired = 0 THEN {NOW_MS_SQL} ELSE updated_at END,
                is_retired = 1
             WHERE id = ?1;",
            kind.table()
        )
    } else {
        format!("UPDATE {} SET is_retired = 1 WHERE id = ?1;", kind.table())
    }
}

/// Deletes one row; dependent rows follow the schema's cascade rules.
pub(crate) fn delete_row(conn: &Connection, kind: EntityKind, id: RecordId) -> RepoResult<()> {
    let result = conn.execute(&format!("DELETE FROM {} WHERE id = ?1;", kind.table()), [id]);
    let changed = match result {
        Ok(changed) => changed,
        Err(err) => {
            if let Some((ConstraintKind::ForeignKey, _)) = constraint_violation(&err) {
                return Err(RepoError::Constraint {
                    entity: kind,
                    id,
                    reason: "row is still referenced by dependent records".to_string(),
                });
            }
            return Err(err.into());
        }
    };
    if changed == 0 {
        return Err(RepoError::NotFound { entity: kind, id });
    }
    Ok(())
}

/// Counts rows of `table` whose `column` equals `id`.
pub(crate) fn count_referencing(
    conn: &Connection,
    table: &str,
    column: &str,
    id: RecordId,
) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1;"),
        [id],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

pub(crate) fn read_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in column `{column}`"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

/// `LIKE` pattern matching `term` anywhere, with `\` as escape character.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
