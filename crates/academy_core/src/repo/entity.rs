//! Entity repository contracts shared by every record type.
//!
//! # Invariants
//! - `create`/`update` validate before any SQL mutation.
//! - `update` refreshes `updated_at` where tracked and never writes the
//!   retired flag or creation timestamps.
//! - `get` is a detail read and returns retired rows.
//! - `list` applies the visibility filter per [`ListQuery::include_retired`].

use crate::model::{Record, RecordId};
use crate::repo::error::RepoResult;
use crate::repo::query::{ListQuery, Page, SortOrder};

/// Create/read/update/hard-delete surface of one entity type.
pub trait EntityRepository {
    type Entity: Record;
    type Draft;
    type Order: SortOrder;

    /// Validates and inserts a draft, returning the stored record.
    fn create(&self, draft: &Self::Draft) -> RepoResult<Self::Entity>;
    /// Re-validates and persists mutable fields, returning the stored record.
    fn update(&self, entity: &Self::Entity) -> RepoResult<Self::Entity>;
    fn get(&self, id: RecordId) -> RepoResult<Option<Self::Entity>>;
    fn list(&self, query: &ListQuery<Self::Order>) -> RepoResult<Page<Self::Entity>>;
    /// Structurally removes the row, applying the kind's cascade rules.
    fn hard_delete(&self, id: RecordId) -> RepoResult<()>;
}

/// Soft-delete surface; implemented only for entity types that are
/// [`Retireable`](crate::model::Retireable).
pub trait RetireRepository: EntityRepository {
    /// Sets the retired flag. Idempotent; never cascades.
    fn retire(&self, id: RecordId) -> RepoResult<()>;
    /// Retires every existing id in one transaction and returns how many of
    /// the given ids exist, counting repeated ids once. Unknown ids are
    /// skipped.
    fn retire_many(&self, ids: &[RecordId]) -> RepoResult<usize>;
}
