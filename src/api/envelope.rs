//! Response envelopes of the backend REST API and their normalisation.
//!
//! Each endpoint wraps its payload differently.  The `into_*` methods check
//! the `status` field and convert the wire shape into the types the rest of
//! the application works with, so callers never look at `status` directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Record;
use crate::error::{ClientError, ClientResult};

/// Value of the `status` field shared by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    /// Used by `stop_parser` when there was nothing to stop.
    Info,
    #[serde(other)]
    Unknown,
}

fn check(status: Status, message: Option<String>, fallback: &str) -> ClientResult<()> {
    match status {
        Status::Success => Ok(()),
        _ => Err(ClientError::application(
            message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// One page of records, normalised from either list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResponse {
    pub items: Vec<Record>,
    pub total_pages: u32,
    /// Page the server says it served.  `None` when the endpoint does not
    /// report one (social media), in which case the requested page stands.
    pub current_page: Option<u32>,
    pub available_channels: Option<Vec<String>>,
    pub available_categories: Option<Vec<String>>,
}

/// `GET /api/news`
#[derive(Debug, Deserialize)]
pub struct NewsEnvelope {
    pub status: Status,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Record>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub available_channels: Option<Vec<String>>,
    #[serde(default)]
    pub available_categories: Option<Vec<String>>,
}

impl NewsEnvelope {
    pub fn into_list(self) -> ClientResult<ListResponse> {
        check(self.status, self.message, "failed to load data")?;
        Ok(ListResponse {
            items: self.data.unwrap_or_default(),
            total_pages: self.total_pages.unwrap_or(0),
            current_page: self.current_page,
            available_channels: self.available_channels,
            available_categories: self.available_categories,
        })
    }
}

/// `GET /api/social_media/{source}`
///
/// Older backends answer with a bare `{posts, total_pages}`; newer ones wrap
/// the posts in the usual `{status, data}` envelope.  Both are accepted.
#[derive(Debug, Deserialize)]
pub struct SocialEnvelope {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub posts: Option<Vec<Record>>,
    #[serde(default)]
    pub data: Option<Vec<Record>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl SocialEnvelope {
    pub fn into_list(self) -> ClientResult<ListResponse> {
        if let Some(status) = self.status {
            check(status, self.message, "failed to load social media data")?;
        }
        Ok(ListResponse {
            items: self.posts.or(self.data).unwrap_or_default(),
            total_pages: self.total_pages.filter(|p| *p > 0).unwrap_or(1),
            current_page: None,
            available_channels: None,
            available_categories: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Sources, categories, statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SourceGroups {
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SourcesData {
    #[serde(default)]
    pub sources: SourceGroups,
}

/// `GET /api/sources`
#[derive(Debug, Deserialize)]
pub struct SourcesEnvelope {
    pub status: Status,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SourcesData>,
}

impl SourcesEnvelope {
    /// User-added sources, id → display name.
    pub fn into_custom(self) -> ClientResult<BTreeMap<String, String>> {
        check(self.status, self.message, "failed to load sources")?;
        Ok(self.data.map(|d| d.sources.custom).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `GET /api/categories`
#[derive(Debug, Deserialize)]
pub struct CategoriesEnvelope {
    pub status: Status,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<CategoryEntry>>,
}

impl CategoriesEnvelope {
    pub fn into_categories(self) -> ClientResult<Vec<CategoryEntry>> {
        check(self.status, self.message, "failed to load categories")?;
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountEntry {
    pub count: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Statistics {
    pub total: u64,
    #[serde(default)]
    pub categories: BTreeMap<String, CountEntry>,
    #[serde(default)]
    pub custom_sources: BTreeMap<String, CountEntry>,
}

/// `GET /api/statistics`
#[derive(Debug, Deserialize)]
pub struct StatisticsEnvelope {
    pub status: Status,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Statistics>,
}

impl StatisticsEnvelope {
    pub fn into_statistics(self) -> ClientResult<Statistics> {
        check(self.status, self.message, "failed to load statistics")?;
        Ok(self.data.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Parser control
// ---------------------------------------------------------------------------

/// `POST /api/run_parser` and `POST /api/stop_parser`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandReply {
    pub status: Status,
    #[serde(default)]
    pub message: String,
}

impl CommandReply {
    /// `info` is not a failure: the backend had nothing to do.
    pub fn into_reply(self) -> ClientResult<Self> {
        match self.status {
            Status::Success | Status::Info => Ok(self),
            _ => Err(ClientError::application(if self.message.is_empty() {
                "parser command failed".to_string()
            } else {
                self.message
            })),
        }
    }
}

/// `GET /api/parser_status`
#[derive(Debug, Deserialize)]
pub struct ParserStatusEnvelope {
    pub status: Status,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub active_parsers: Vec<String>,
}

impl ParserStatusEnvelope {
    pub fn into_active(self) -> ClientResult<Vec<String>> {
        check(self.status, self.message, "failed to load parser status")?;
        Ok(self.active_parsers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
