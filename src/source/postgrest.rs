//! # PostgREST Query Source
//!
//! Talks to the hosted database's REST surface (`{url}/rest/v1`).
//!
//! - count: `HEAD` with `Prefer: count=exact`, total read from `Content-Range`
//! - range: `GET` with `order`, `offset` and `limit` parameters
//! - update: `PATCH` with `Prefer: return=representation`
//!
//! Error bodies follow the PostgREST shape `{"code", "message", "details", "hint"}`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::errors::{SourceError, SourceResult};
use super::{QuerySource, RecordWriter};
use crate::config::BackendConfig;
use crate::query::{FilterSet, OrderBy, RowRange};

const USER_AGENT: &str = concat!("largetable/", env!("CARGO_PKG_VERSION"));

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Query source backed by a PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestSource {
    client: Client,
    rest_url: String,
    schema: String,
}

impl PostgrestSource {
    /// Build the HTTP client from backend configuration
    pub fn new(config: &BackendConfig) -> SourceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.api_key)?);
        let bearer = config.access_token.as_deref().unwrap_or(&config.api_key);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rest_url: rest_url(&config.url),
            schema: config.schema.clone(),
        })
    }

    /// Endpoint for a relation
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn read_request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Accept-Profile", &self.schema)
    }

    async fn send(&self, request: RequestBuilder) -> SourceResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }
}

/// `https://x.supabase.co/` -> `https://x.supabase.co/rest/v1`
fn rest_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/rest/v1") {
        base.to_string()
    } else {
        format!("{}/rest/v1", base)
    }
}

fn header_value(value: &str) -> SourceResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SourceError::Transport(format!("Invalid header value: {}", e)))
}

/// Total from a `Content-Range` header: `0-24/3573` or `*/3573`.
///
/// `*/*` (count not requested or not available) yields `None`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// Query parameters for a range select, filters first in caller order
pub fn range_query(
    select: &str,
    filters: &FilterSet,
    order: &OrderBy,
    range: RowRange,
) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), select_or_all(select))];
    pairs.extend(filters.to_query_pairs());
    pairs.push(("order".to_string(), order.to_query_value()));
    pairs.push(("offset".to_string(), range.start.to_string()));
    pairs.push(("limit".to_string(), range.span().to_string()));
    pairs
}

/// Query parameters for a head-only count. The select list matches the
/// range queries so embedded-resource filters count the same rows.
pub fn count_query(select: &str, filters: &FilterSet) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), select_or_all(select))];
    pairs.extend(filters.to_query_pairs());
    pairs
}

fn select_or_all(select: &str) -> String {
    let select = select.trim();
    if select.is_empty() {
        "*".to_string()
    } else {
        select.to_string()
    }
}

async fn error_from_response(response: Response) -> SourceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_from_parts(status, &body)
}

fn error_from_parts(status: StatusCode, body: &str) -> SourceError {
    let parsed: Option<PostgrestErrorBody> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(PostgrestErrorBody {
            code,
            message: Some(message),
        }) => (code, message),
        Some(PostgrestErrorBody { code, message: None }) => (code, status_message(status)),
        None if !body.trim().is_empty() => (None, body.trim().to_string()),
        None => (None, status_message(status)),
    };

    SourceError::Backend {
        status: Some(status.as_u16()),
        code,
        message,
    }
}

fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

impl QuerySource for PostgrestSource {
    async fn count(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> SourceResult<Option<u64>> {
        let request = self
            .read_request(self.client.head(self.table_url(table)))
            .header("Prefer", "count=exact")
            .query(&count_query(select, filters));
        let response = self.send(request).await?;

        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        Ok(count)
    }

    async fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> SourceResult<Vec<Value>> {
        let request = self
            .read_request(self.client.get(self.table_url(table)))
            .query(&range_query(select, filters, order, range));
        let response = self.send(request).await?;

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}

impl RecordWriter for PostgrestSource {
    async fn update(
        &self,
        table: &str,
        filters: &FilterSet,
        patch: &Value,
        select: &str,
    ) -> SourceResult<Vec<Value>> {
        let mut query = vec![("select".to_string(), select_or_all(select))];
        query.extend(filters.to_query_pairs());

        let request = self
            .client
            .patch(self.table_url(table))
            .header("Content-Profile", &self.schema)
            .header("Prefer", "return=representation")
            .query(&query)
            .json(patch);
        let response = self.send(request).await?;

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}
