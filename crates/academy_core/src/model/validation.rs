//! Pre-write field validators.
//!
//! # Responsibility
//! - Check plain field values before they reach SQL.
//! - Return structured errors that presentation layers can map to forms.
//!
//! # Invariants
//! - Validators are pure; uniqueness is never decided here. The store's
//!   UNIQUE constraints are the authority and surface as
//!   `DuplicateUsername` / `DuplicateEmail` from the repository layer.

use crate::model::{EntityKind, RecordId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const USERNAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 256;
/// `decimal(8, 2)` upper bound expressed in cents.
pub const MAX_COST_CENTS: i64 = 99_999_999;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("valid username regex"));
static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("valid date regex")
});

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty or whitespace only.
    Required { field: &'static str },
    /// Field exceeds its character budget.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Username contains characters outside the allowed ASCII class.
    InvalidUsername(String),
    /// Email lacks a local part or a domain.
    InvalidEmail(String),
    DuplicateUsername(String),
    DuplicateEmail(String),
    /// Rating outside `1..=5`.
    RatingOutOfRange(i64),
    /// Cost outside `0..=MAX_COST_CENTS`.
    CostOutOfRange(i64),
    /// Birth date is not a `YYYY-MM-DD` calendar-shaped value.
    InvalidBirthDate(String),
    /// Referenced parent row does not exist.
    UnknownReference { entity: EntityKind, id: RecordId },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{field} is required"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} must be at most {max} characters, got {actual}")
            }
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`: only ASCII letters, digits and @/./+/-/_ are allowed"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::DuplicateUsername(value) => {
                write!(f, "a user with username `{value}` already exists")
            }
            Self::DuplicateEmail(value) => {
                write!(f, "a user with email address `{value}` already exists")
            }
            Self::RatingOutOfRange(value) => write!(f, "rating must be in 1..=5, got {value}"),
            Self::CostOutOfRange(value) => {
                write!(f, "cost must be in 0..={MAX_COST_CENTS} cents, got {value}")
            }
            Self::InvalidBirthDate(value) => {
                write!(f, "birth date must be formatted as YYYY-MM-DD, got `{value}`")
            }
            Self::UnknownReference { entity, id } => {
                write!(f, "referenced {entity} {id} does not exist")
            }
        }
    }
}

impl Error for ValidationError {}

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Rejects values longer than `max` characters (not bytes).
pub fn validate_max_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Combined required + length check for short text fields.
pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    validate_required(field, value)?;
    validate_max_len(field, value, max)
}

/// Checks username presence, length and ASCII character class.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    validate_text("username", username, USERNAME_MAX_CHARS)?;
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Trims the address and lowercases its domain part.
///
/// The local part is kept verbatim; two addresses differing only in local
/// part case are distinct accounts.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    validate_text("email", trimmed, EMAIL_MAX_CHARS)?;

    let Some((local, domain)) = trimmed.rsplit_once('@') else {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    }

    Ok(format!("{local}@{}", domain.to_lowercase()))
}

pub fn validate_cost(cost_cents: i64) -> Result<(), ValidationError> {
    if !(0..=MAX_COST_CENTS).contains(&cost_cents) {
        return Err(ValidationError::CostOutOfRange(cost_cents));
    }
    Ok(())
}

/// Shape check only; the date is otherwise opaque to the core.
pub fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    if !ISO_DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidBirthDate(value.to_string()));
    }
    Ok(())
}
