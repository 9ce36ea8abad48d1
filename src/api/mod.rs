//! HTTP client for the news/monitoring backend.
//!
//! [`ApiClient`] wraps one `reqwest::Client` and exposes one async method per
//! endpoint.  Every method returns the already-normalised payload, or a
//! [`ClientError`] when the transport failed, the body was not the expected
//! JSON, or the envelope carried `status != "success"`.
//!
//! Envelope shapes live in [`envelope`]; the loosely-typed row type lives in
//! [`record`].

pub mod envelope;
mod record;

pub use envelope::{CategoryEntry, CommandReply, ListResponse, Statistics, Status};
pub use record::{Record, ARTICLE_DATE_FIELDS};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::catalog::SourceKind;
use crate::error::{ClientError, ClientResult};
use crate::query::ListRequest;

use envelope::{
    CategoriesEnvelope, NewsEnvelope, ParserStatusEnvelope, SocialEnvelope, SourcesEnvelope,
    StatisticsEnvelope,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of a `run_parser` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParserTarget {
    /// A built-in parser, by source id.
    Named(String),
    /// The universal parser pointed at an arbitrary site.
    Universal {
        #[serde(rename = "type")]
        kind: UniversalTag,
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniversalTag {
    Universal,
}

impl ParserTarget {
    pub fn universal(url: impl Into<String>) -> Self {
        Self::Universal {
            kind: UniversalTag::Universal,
            url: url.into(),
        }
    }

    /// Source id the backend reports in log events for this target.
    pub fn source_id(&self) -> &str {
        match self {
            Self::Named(id) => id,
            Self::Universal { .. } => "universal",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Named(id) => id.clone(),
            Self::Universal { url, .. } => format!("universal parser ({url})"),
        }
    }
}

/// Async client for every REST endpoint the dashboard uses.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(String, String)]) -> ClientResult<T> {
        debug!(path, ?params, "GET");
        let response = self.http.get(self.endpoint(path)).query(params).send().await?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> ClientResult<T> {
        debug!(path, %body, "POST");
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode(response).await
    }

    /// Fetch one page for either list endpoint.
    pub async fn list(&self, request: &ListRequest) -> ClientResult<ListResponse> {
        let result = match request.kind {
            SourceKind::News => self
                .get::<NewsEnvelope>(&request.path, &request.params)
                .await
                .and_then(NewsEnvelope::into_list),
            SourceKind::Social => self
                .get::<SocialEnvelope>(&request.path, &request.params)
                .await
                .and_then(SocialEnvelope::into_list),
        };
        match &result {
            Ok(list) => info!(
                path = %request.path,
                items = list.items.len(),
                total_pages = list.total_pages,
                current_page = ?list.current_page,
                "list loaded"
            ),
            Err(err) => warn!(path = %request.path, error = %err, "list request failed"),
        }
        result
    }

    /// User-added sources, id → display name.
    pub async fn sources(&self) -> ClientResult<BTreeMap<String, String>> {
        self.get::<SourcesEnvelope>("/api/sources", &[])
            .await?
            .into_custom()
    }

    pub async fn categories(&self) -> ClientResult<Vec<CategoryEntry>> {
        self.get::<CategoriesEnvelope>("/api/categories", &[])
            .await?
            .into_categories()
    }

    pub async fn statistics(&self, days: u32, category: &str) -> ClientResult<Statistics> {
        let params = [
            ("days".to_string(), days.to_string()),
            ("category".to_string(), category.to_string()),
        ];
        self.get::<StatisticsEnvelope>("/api/statistics", &params)
            .await?
            .into_statistics()
    }

    /// Ask the backend to start the given parsers.  Returns its message.
    pub async fn run_parser(&self, targets: &[ParserTarget]) -> ClientResult<String> {
        let body = json!({ "sources": targets });
        let reply = self
            .post::<CommandReply>("/api/run_parser", &body)
            .await?
            .into_reply()?;
        info!(count = targets.len(), "parser run accepted");
        Ok(reply.message)
    }

    /// Stop every running parser.
    pub async fn stop_parser(&self) -> ClientResult<CommandReply> {
        let body = json!({ "sources": ["all"] });
        let reply = self
            .post::<CommandReply>("/api/stop_parser", &body)
            .await?
            .into_reply()?;
        info!(status = ?reply.status, "parser stop answered");
        Ok(reply)
    }

    /// Ids of the parsers currently running on the backend.
    pub async fn parser_status(&self) -> ClientResult<Vec<String>> {
        self.get::<ParserStatusEnvelope>("/api/parser_status", &[])
            .await?
            .into_active()
    }
}

/// Read the body as JSON.
///
/// Error statuses usually still carry a `{status: "error", message}`
/// envelope, so the body is tried first; only an undecodable body on a
/// non-2xx status becomes [`ClientError::Http`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.bytes().await?;
    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(ClientError::Http {
            status: status.as_u16(),
        }),
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
