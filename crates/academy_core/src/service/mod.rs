//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into lifecycle-level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod lifecycle;
pub mod summary;

pub use lifecycle::LifecycleService;
pub use summary::{listing_counts, ListingCounts};
