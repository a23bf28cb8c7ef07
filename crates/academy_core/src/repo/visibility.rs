//! Read-time visibility filter for retired rows.
//!
//! # Invariants
//! - The filter is always explicit: callers pass `include_retired`.
//! - Only kinds where [`EntityKind::filters_retired`] holds are narrowed;
//!   feedback and users pass through untouched.
//! - Detail reads (`get`) never apply the filter.

use crate::model::{EntityKind, Record};

/// Whether a row with the given flag appears in a listing of `kind`.
pub fn is_listed(kind: EntityKind, is_retired: bool, include_retired: bool) -> bool {
    include_retired || !kind.filters_retired() || !is_retired
}

/// Record-level form of [`is_listed`] for presentation layers.
pub fn is_visible<R: Record>(record: &R, include_retired: bool) -> bool {
    is_listed(
        R::KIND,
        record.retired_flag().unwrap_or(false),
        include_retired,
    )
}

/// SQL predicate narrowing `alias` to listed rows, `None` when no
/// narrowing applies.
pub fn retired_predicate(
    kind: EntityKind,
    include_retired: bool,
    alias: &str,
) -> Option<String> {
    if include_retired || !kind.filters_retired() {
        return None;
    }
    Some(format!("{alias}.is_retired = 0"))
}

#[cfg(test)]
mod tests {
    use super::{is_listed, retired_predicate};
    use crate::model::EntityKind;

    #[test]
    fn retireable_kinds_hide_retired_rows_by_default() {
        for kind in [
            EntityKind::News,
            EntityKind::Course,
            EntityKind::Lesson,
            EntityKind::Teacher,
        ] {
            assert!(!is_listed(kind, true, false), "{kind} should hide retired");
            assert!(is_listed(kind, true, true));
            assert!(is_listed(kind, false, false));
            assert_eq!(
                retired_predicate(kind, false, "x").as_deref(),
                Some("x.is_retired = 0")
            );
        }
    }

    #[test]
    fn feedback_flag_is_not_filtered() {
        assert!(is_listed(EntityKind::Feedback, true, false));
        assert_eq!(retired_predicate(EntityKind::Feedback, false, "f"), None);
        assert_eq!(retired_predicate(EntityKind::User, false, "u"), None);
    }

    #[test]
    fn override_disables_predicate() {
        assert_eq!(retired_predicate(EntityKind::News, true, "n"), None);
    }
}
