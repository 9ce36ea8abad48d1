//! Column schemas, keyed by source.
//!
//! One registry replaces per-source rendering code: each source maps to an
//! ordered list of typed [`Column`] descriptors, and a single renderer
//! ([`crate::render`]) interprets them.  Sources without an entry fall back
//! to the generic date/title/category layout.

use std::collections::HashMap;

use crate::api::ARTICLE_DATE_FIELDS;

/// How a column's value is read and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Timestamp read from the first present key in the list.
    Date(&'static [&'static str]),
    /// Headline; activating it opens the detail view.
    Title,
    /// Long text, truncated with an expand/collapse toggle.
    Content,
    /// Category id translated to a display label.
    Category,
    /// Counter; missing counts show as `0`.
    Count,
    /// Percentage with one decimal.
    Percent,
    /// Risk level badge.
    Risk,
    /// Raw value.
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub label: &'static str,
    pub class: Option<&'static str>,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(field: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            field,
            label,
            class: None,
            kind,
        }
    }

    pub const fn with_class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }
}

const DATE: Column = Column::new("published_date", "Date", ColumnKind::Date(ARTICLE_DATE_FIELDS))
    .with_class("date-col");
const TITLE: Column = Column::new("title", "Title", ColumnKind::Title).with_class("title-col");
const CATEGORY: Column =
    Column::new("category", "Category", ColumnKind::Category).with_class("category-col");

/// Date, title, category.
pub const GENERIC: &[Column] = &[DATE, TITLE, CATEGORY];

const TELEGRAM: &[Column] = &[
    DATE,
    Column::new("telegram_channel", "Channel", ColumnKind::Plain),
    TITLE,
    CATEGORY,
];

const ID: Column = Column::new("id", "ID", ColumnKind::Plain);
const TEXT: Column = Column::new("text", "Text", ColumnKind::Content).with_class("content-cell");
const EXTREMISM: Column = Column::new("extremism_percentage", "Extremism %", ColumnKind::Percent);
const RISK: Column = Column::new("risk_level", "Risk", ColumnKind::Risk);

const TWITTER: &[Column] = &[
    ID,
    Column::new("author_username", "Author", ColumnKind::Plain),
    TEXT,
    Column::new("created_at", "Date", ColumnKind::Date(&["created_at"])),
    Column::new("public_metrics_like_count", "Likes", ColumnKind::Count),
    Column::new("public_metrics_retweet_count", "Retweets", ColumnKind::Count),
    EXTREMISM,
    RISK,
];

const VK: &[Column] = &[
    ID,
    Column::new("from_id", "Author", ColumnKind::Plain),
    TEXT,
    Column::new("date", "Date", ColumnKind::Date(&["date"])),
    Column::new("likes_count", "Likes", ColumnKind::Count),
    Column::new("reposts_count", "Reposts", ColumnKind::Count),
    EXTREMISM,
    RISK,
];

const OK: &[Column] = &[
    ID,
    Column::new("author_name", "Author", ColumnKind::Plain),
    TEXT,
    Column::new("created_time", "Date", ColumnKind::Date(&["created_time"])),
    Column::new("likes_count", "Likes", ColumnKind::Count),
    EXTREMISM,
    RISK,
];

/// Source id → column list.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, &'static [Column]>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("telegram", TELEGRAM);
        registry.register("twitter", TWITTER);
        registry.register("vk", VK);
        registry.register("ok", OK);
        registry
    }

    pub fn register(&mut self, source: impl Into<String>, columns: &'static [Column]) {
        self.schemas.insert(source.into(), columns);
    }

    /// Columns for `source`, or [`GENERIC`] when none are registered.
    pub fn resolve(&self, source: &str) -> &'static [Column] {
        self.schemas.get(source).copied().unwrap_or(GENERIC)
    }
}
