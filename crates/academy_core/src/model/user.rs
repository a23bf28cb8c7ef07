//! User account model.
//!
//! # Invariants
//! - `username` and `email` are each unique across all users.
//! - `email` is stored normalized (trimmed, lowercase domain).
//! - Accounts are never retired; they are deactivated via `is_active`.

use crate::model::validation::{
    normalize_email, validate_max_len, validate_username, ValidationError,
};
use crate::model::{DisplayName, EntityKind, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const USER_NAME_PART_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    /// Media-relative avatar path, see [`avatar_upload_path`].
    pub avatar: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    /// Epoch milliseconds.
    pub date_joined: i64,
}

impl User {
    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn short_name(&self) -> &str {
        &self.first_name
    }

    /// Validates fields and returns the normalized email.
    pub fn validate(&self) -> Result<String, ValidationError> {
        validate_user_fields(
            &self.username,
            &self.email,
            &self.first_name,
            &self.last_name,
        )
    }
}

/// Registration input for [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub avatar: Option<String>,
    pub is_staff: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Validates fields and returns the normalized email.
    pub fn validate(&self) -> Result<String, ValidationError> {
        validate_user_fields(
            &self.username,
            &self.email,
            &self.first_name,
            &self.last_name,
        )
    }
}

fn validate_user_fields(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<String, ValidationError> {
    validate_username(username)?;
    validate_max_len("first_name", first_name, USER_NAME_PART_MAX_CHARS)?;
    validate_max_len("last_name", last_name, USER_NAME_PART_MAX_CHARS)?;
    normalize_email(email)
}

/// Builds the media-relative storage path for an uploaded avatar:
/// `user_<username>/avatars/pic_<now_ms><suffix>`.
///
/// Only the original file's last extension survives; its stem is dropped.
pub fn avatar_upload_path(username: &str, original_filename: &str, now_ms: i64) -> String {
    let suffix = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("user_{username}/avatars/pic_{now_ms}{suffix}")
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> RecordId {
        self.id
    }

    fn retired_flag(&self) -> Option<bool> {
        None
    }
}

impl DisplayName for User {
    fn display_name(&self) -> String {
        self.username.clone()
    }
}
