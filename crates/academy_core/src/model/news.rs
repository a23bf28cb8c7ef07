//! News article model.

use crate::model::validation::{validate_text, ValidationError};
use crate::model::{DisplayName, EntityKind, Record, RecordId, Retireable};
use serde::{Deserialize, Serialize};

pub const NEWS_TITLE_MAX_CHARS: usize = 256;
pub const NEWS_PREAMBLE_MAX_CHARS: usize = 1024;

/// Persisted news article. Listed newest-first by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: RecordId,
    pub title: String,
    pub preamble: String,
    pub body: Option<String>,
    /// Render hint for presentation layers; the core stores it only.
    pub body_as_markdown: bool,
    /// Epoch milliseconds, assigned on insert.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed by every update.
    pub updated_at: i64,
    pub is_retired: bool,
}

impl News {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_news_fields(&self.title, &self.preamble)
    }
}

/// Creation input for [`News`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNews {
    pub title: String,
    pub preamble: String,
    pub body: Option<String>,
    pub body_as_markdown: bool,
}

impl NewNews {
    pub fn new(title: impl Into<String>, preamble: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            preamble: preamble.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_news_fields(&self.title, &self.preamble)
    }
}

fn validate_news_fields(title: &str, preamble: &str) -> Result<(), ValidationError> {
    validate_text("title", title, NEWS_TITLE_MAX_CHARS)?;
    validate_text("preamble", preamble, NEWS_PREAMBLE_MAX_CHARS)
}

impl Record for News {
    const KIND: EntityKind = EntityKind::News;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        Some(self.is_retired)
    }
}

impl Retireable for News {
    fn is_retired(&self) -> bool {
        self.is_retired
    }

    fn retire(&mut self) {
        self.is_retired = true;
    }
}

impl DisplayName for News {
    fn display_name(&self) -> String {
        format!("{} {}", self.id, self.title)
    }
}
