//! Listing options: visibility switch, ordering and pagination.
//!
//! # Invariants
//! - Pages are 1-based; page `0` is read as page `1`.
//! - Page size falls back to the configured default and is clamped to the
//!   configured maximum.
//! - Every ordering ends with an `id` tie-breaker so pages are stable.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page size bounds applied by repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Normalizes a requested page size against these limits.
    pub fn normalize(self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_size.min(self.max_size),
            Some(value) => value.min(self.max_size),
        }
    }
}

/// Per-entity ordering rendered into a static `ORDER BY` body.
pub trait SortOrder: Copy + Default {
    fn order_by(self) -> &'static str;
}

/// Query options for `list` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery<O> {
    /// Administrative override: include retired rows.
    pub include_retired: bool,
    /// 1-based page number.
    pub page: u32,
    pub page_size: Option<u32>,
    pub order: O,
}

impl<O: Default> Default for ListQuery<O> {
    fn default() -> Self {
        Self {
            include_retired: false,
            page: 1,
            page_size: None,
            order: O::default(),
        }
    }
}

impl<O: Default> ListQuery<O> {
    /// Default listing including retired rows.
    pub fn including_retired() -> Self {
        Self {
            include_retired: true,
            ..Self::default()
        }
    }
}

impl<O> ListQuery<O> {
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }

    pub fn ordered_by(mut self, order: O) -> Self {
        self.order = order;
        self
    }

    /// Resolves page number, size and row offset.
    pub fn window(&self, limits: PageLimits) -> PageWindow {
        let page = self.page.max(1);
        let page_size = limits.normalize(self.page_size);
        PageWindow {
            page,
            page_size,
            offset: i64::from(page - 1) * i64::from(page_size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub offset: i64,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    /// Number of rows matching the filter across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.page_count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder for NewsOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::NewestFirst => "n.created_at DESC, n.id DESC",
            Self::OldestFirst => "n.created_at ASC, n.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseOrder {
    #[default]
    Insertion,
    Name,
}

impl SortOrder for CourseOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::Insertion => "c.id ASC",
            Self::Name => "c.name COLLATE NOCASE ASC, c.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonOrder {
    /// `(course, num)` ascending.
    #[default]
    CourseThenNum,
    /// Admin listing: course name ascending, then lesson number descending.
    CourseNameThenNumDesc,
}

impl SortOrder for LessonOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::CourseThenNum => "l.course_id ASC, l.num ASC, l.id ASC",
            Self::CourseNameThenNumDesc => "c.name COLLATE NOCASE ASC, l.num DESC, l.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherOrder {
    #[default]
    Insertion,
    Surname,
}

impl SortOrder for TeacherOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::Insertion => "t.id ASC",
            Self::Surname => "t.last_name COLLATE NOCASE ASC, t.first_name COLLATE NOCASE ASC, t.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOrder {
    #[default]
    NewestFirst,
}

impl SortOrder for FeedbackOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::NewestFirst => "f.created_at DESC, f.id DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOrder {
    #[default]
    NewestJoined,
    Username,
}

impl SortOrder for UserOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::NewestJoined => "u.date_joined DESC, u.id DESC",
            Self::Username => "u.username ASC, u.id ASC",
        }
    }
}
