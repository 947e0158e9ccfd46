//! HTTP client for the Ghost Admin API.
//!
//! One method per backend operation. Every request carries a freshly
//! validated admin token; a 401/403 invalidates the cached token and the
//! call is retried once with a new one before an auth failure surfaces.
//! Pagination is followed internally so callers never see page numbers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::auth::CredentialManager;
use super::error::GhostError;
use super::models::{
    Listing, ListQuery, Page, Pagination, Post, PostChanges, PostDraft, SiteInfo, Tag, TagChanges,
    TagDraft, TagRef,
};
use super::API_VERSION;

/// Bound on every backend call so invocations cannot hang.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Items fetched per backend page while aggregating a listing.
const PAGE_SIZE: u32 = 50;

/// Default and hard cap for caller-facing list limits.
const DEFAULT_LIST_LIMIT: u32 = 10;
const MAX_LIST_LIMIT: u32 = 200;

/// Longest backend detail echoed into a failure message.
const MAX_DETAIL_LEN: usize = 500;

const ACCEPT_VERSION_HEADER: &str = "Accept-Version";

/// Client for the Ghost Admin API.
#[derive(Clone)]
pub struct GhostClient {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialManager>,
}

impl GhostClient {
    /// Create a new GhostClient.
    ///
    /// # Arguments
    /// * `base_url` - Site base URL without the API path (e.g., "https://blog.example.com")
    /// * `credentials` - Shared credential manager for admin tokens
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<CredentialManager>,
    ) -> Result<Self, GhostError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                GhostError::Configuration(format!("failed to build http client: {}", e))
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Get the configured site base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn admin_url(&self, endpoint: &str) -> String {
        format!(
            "{}/ghost/api/{}/admin/{}",
            self.base_url, API_VERSION, endpoint
        )
    }

    // =========================================================================
    // Posts
    // =========================================================================

    pub async fn list_posts(&self, query: &ListQuery) -> Result<Listing<Post>, GhostError> {
        self.list_collection("posts", true, query).await
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, GhostError> {
        self.get_single("posts", id, true).await
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, GhostError> {
        self.create_single("posts", draft, true).await
    }

    /// Update a post. The backend refuses edits that do not carry the
    /// resource's current `updated_at`, so this reads the post first and
    /// merges the changes into it.
    pub async fn update_post(&self, id: &str, changes: &PostChanges) -> Result<Post, GhostError> {
        self.update_document("posts", id, changes).await
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), GhostError> {
        self.delete_single("posts", id).await
    }

    // =========================================================================
    // Pages
    // =========================================================================

    pub async fn list_pages(&self, query: &ListQuery) -> Result<Listing<Page>, GhostError> {
        self.list_collection("pages", true, query).await
    }

    pub async fn get_page(&self, id: &str) -> Result<Page, GhostError> {
        self.get_single("pages", id, true).await
    }

    pub async fn create_page(&self, draft: &PostDraft) -> Result<Page, GhostError> {
        self.create_single("pages", draft, true).await
    }

    pub async fn update_page(&self, id: &str, changes: &PostChanges) -> Result<Page, GhostError> {
        self.update_document("pages", id, changes).await
    }

    pub async fn delete_page(&self, id: &str) -> Result<(), GhostError> {
        self.delete_single("pages", id).await
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub async fn list_tags(&self, query: &ListQuery) -> Result<Listing<Tag>, GhostError> {
        self.list_collection("tags", false, query).await
    }

    pub async fn get_tag(&self, id: &str) -> Result<Tag, GhostError> {
        self.get_single("tags", id, false).await
    }

    pub async fn create_tag(&self, draft: &TagDraft) -> Result<Tag, GhostError> {
        self.create_single("tags", draft, false).await
    }

    pub async fn update_tag(&self, id: &str, changes: &TagChanges) -> Result<Tag, GhostError> {
        let current: Tag = self.get_single("tags", id, false).await?;
        let updated_at = current.updated_at.clone().ok_or_else(|| {
            GhostError::ProtocolMismatch(format!(
                "tag '{}' has no updated_at to carry into the edit",
                id
            ))
        })?;

        let mut document = serde_json::Map::new();
        document.insert("id".to_string(), json!(id));
        document.insert(
            "name".to_string(),
            json!(changes.name.clone().unwrap_or(current.name)),
        );
        if let Some(slug) = changes.slug.clone().or(current.slug) {
            document.insert("slug".to_string(), json!(slug));
        }
        if let Some(description) = changes.description.clone().or(current.description) {
            document.insert("description".to_string(), json!(description));
        }
        document.insert("updated_at".to_string(), json!(updated_at));

        let endpoint = format!("tags/{}/", id);
        let body = self
            .request(
                Method::PUT,
                &endpoint,
                &[],
                Some(&envelope("tags", Value::Object(document))),
            )
            .await?;
        take_single(&body, "tags")
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), GhostError> {
        self.delete_single("tags", id).await
    }

    // =========================================================================
    // Site
    // =========================================================================

    /// Fetch site information. Doubles as a connectivity and credential
    /// probe: it is the cheapest authenticated endpoint the backend has.
    pub async fn site_info(&self) -> Result<SiteInfo, GhostError> {
        let body = self.request(Method::GET, "site/", &[], None).await?;
        let raw = body.get("site").ok_or_else(|| {
            GhostError::ProtocolMismatch("response is missing the 'site' object".to_string())
        })?;
        serde_json::from_value(raw.clone())
            .map_err(|e| GhostError::ProtocolMismatch(format!("malformed 'site' object: {}", e)))
    }

    // =========================================================================
    // Generic resource plumbing
    // =========================================================================

    /// Fetch a listing, following `meta.pagination.next` until the caller's
    /// limit is filled or pages run out. Sets `more_available` when items
    /// exist past what was returned.
    async fn list_collection<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        source_html: bool,
        query: &ListQuery,
    ) -> Result<Listing<T>, GhostError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let endpoint = format!("{}/", resource);

        let mut items: Vec<T> = Vec::new();
        let mut total;
        let mut more_available = false;
        let mut page = 1u32;

        loop {
            let remaining = limit - items.len() as u32;
            let page_size = remaining.min(PAGE_SIZE);

            let mut params: Vec<(&str, String)> = Vec::new();
            if source_html {
                params.push(("source", "html".to_string()));
            }
            params.push(("limit", page_size.to_string()));
            params.push(("page", page.to_string()));
            if let Some(status) = query.status {
                params.push(("filter", format!("status:{}", status.as_str())));
            }

            let body = self.request(Method::GET, &endpoint, &params, None).await?;
            let mut batch: Vec<T> = take_collection(&body, resource)?;
            let fetched = batch.len() as u32;
            batch.truncate(remaining as usize);
            items.append(&mut batch);

            let pagination = match take_pagination(&body)? {
                Some(p) => p,
                // No pagination block means the whole result fit in one page
                None => {
                    total = items.len() as u32;
                    break;
                }
            };
            total = pagination.total;

            match pagination.next {
                Some(next) if (items.len() as u32) < limit && fetched > 0 => {
                    page = next;
                }
                Some(_) => {
                    more_available = true;
                    break;
                }
                None => {
                    if fetched > remaining {
                        more_available = true;
                    }
                    break;
                }
            }
        }

        Ok(Listing {
            items,
            total,
            more_available,
        })
    }

    async fn get_single<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        id: &str,
        source_html: bool,
    ) -> Result<T, GhostError> {
        let endpoint = format!("{}/{}/", resource, id);
        let params = source_params(source_html);
        let body = self.request(Method::GET, &endpoint, &params, None).await?;
        take_single(&body, resource)
    }

    async fn create_single<T: DeserializeOwned, D: Serialize>(
        &self,
        resource: &'static str,
        draft: &D,
        source_html: bool,
    ) -> Result<T, GhostError> {
        let endpoint = format!("{}/", resource);
        let params = source_params(source_html);
        let document = serde_json::to_value(draft).map_err(|e| {
            GhostError::ProtocolMismatch(format!("failed to encode {} payload: {}", resource, e))
        })?;
        let body = self
            .request(
                Method::POST,
                &endpoint,
                &params,
                Some(&envelope(resource, document)),
            )
            .await?;
        take_single(&body, resource)
    }

    /// Read-modify-write for posts and pages: fetch the current document,
    /// merge the changes, and send the result back with its `updated_at`.
    async fn update_document(
        &self,
        resource: &'static str,
        id: &str,
        changes: &PostChanges,
    ) -> Result<Post, GhostError> {
        let current: Post = self.get_single(resource, id, true).await?;
        let updated_at = current.updated_at.clone().ok_or_else(|| {
            GhostError::ProtocolMismatch(format!(
                "{} '{}' has no updated_at to carry into the edit",
                resource, id
            ))
        })?;

        let title = changes.title.clone().unwrap_or(current.title);
        let html = changes.html.clone().or(current.html).unwrap_or_default();
        let status = changes.status.unwrap_or(current.status);

        let mut document = serde_json::Map::new();
        document.insert("id".to_string(), json!(id));
        document.insert("title".to_string(), json!(title));
        document.insert("html".to_string(), json!(html));
        document.insert("status".to_string(), json!(status.as_str()));
        document.insert("updated_at".to_string(), json!(updated_at));
        if let Some(names) = &changes.tags {
            let tags: Vec<TagRef> = names
                .iter()
                .map(|name| TagRef { name: name.clone() })
                .collect();
            document.insert("tags".to_string(), json!(tags));
        }

        let endpoint = format!("{}/{}/", resource, id);
        let body = self
            .request(
                Method::PUT,
                &endpoint,
                &source_params(true),
                Some(&envelope(resource, Value::Object(document))),
            )
            .await?;
        take_single(&body, resource)
    }

    async fn delete_single(&self, resource: &'static str, id: &str) -> Result<(), GhostError> {
        let endpoint = format!("{}/{}/", resource, id);
        self.request(Method::DELETE, &endpoint, &[], None).await?;
        Ok(())
    }

    /// Issue one admin request with the current token. A 401/403 response
    /// invalidates the cache and retries exactly once with a fresh token;
    /// a second rejection surfaces as an auth failure from the decoder.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, GhostError> {
        let url = self.admin_url(endpoint);
        let mut retried = false;

        loop {
            let credential = self.credentials.get_valid_token().await?;

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header(
                    header::AUTHORIZATION,
                    format!("Ghost {}", credential.token),
                )
                .header(ACCEPT_VERSION_HEADER, API_VERSION);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(map_transport_error)?;
            let status = response.status();

            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) && !retried
            {
                warn!(
                    %status,
                    endpoint,
                    "backend rejected the admin token, retrying once with a fresh one"
                );
                self.credentials.invalidate().await;
                retried = true;
                continue;
            }

            return decode_response(response, endpoint).await;
        }
    }
}

fn source_params(source_html: bool) -> Vec<(&'static str, String)> {
    if source_html {
        vec![("source", "html".to_string())]
    } else {
        Vec::new()
    }
}

/// Wrap a document in the backend's `{"<key>": [{...}]}` envelope.
fn envelope(key: &str, document: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), Value::Array(vec![document]));
    Value::Object(map)
}

fn map_transport_error(err: reqwest::Error) -> GhostError {
    if err.is_timeout() {
        GhostError::Transient(format!("request timed out: {}", err))
    } else if err.is_connect() {
        GhostError::Transient(format!("connection failed: {}", err))
    } else {
        GhostError::Transient(format!("transport error: {}", err))
    }
}

/// Turn a response into a decoded JSON body or the matching failure kind.
async fn decode_response(response: reqwest::Response, endpoint: &str) -> Result<Value, GhostError> {
    let status = response.status();

    if status.is_success() {
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        return response.json().await.map_err(|e| {
            GhostError::ProtocolMismatch(format!(
                "undecodable response body from '{}': {}",
                endpoint, e
            ))
        });
    }

    let detail = error_detail(status, response.text().await.unwrap_or_default());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GhostError::Auth(detail),
        StatusCode::NOT_FOUND => GhostError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS => GhostError::Transient(detail),
        s if s.is_client_error() => GhostError::InvalidRequest(detail),
        s if s.is_server_error() => GhostError::Transient(detail),
        s => GhostError::ProtocolMismatch(format!(
            "unexpected status {} from '{}': {}",
            s, endpoint, detail
        )),
    })
}

/// Extract the backend's own error message when the body carries one,
/// falling back to the raw (truncated) body or the bare status line.
fn error_detail(status: StatusCode, text: String) -> String {
    if let Ok(body) = serde_json::from_str::<super::models::ErrorBody>(&text) {
        if let Some(first) = body.errors.first() {
            if let Some(message) = &first.message {
                return match &first.context {
                    Some(context) if !context.is_empty() => format!("{} ({})", message, context),
                    _ => message.clone(),
                };
            }
        }
    }

    if text.trim().is_empty() {
        status.to_string()
    } else {
        truncate_detail(&text)
    }
}

fn truncate_detail(text: &str) -> String {
    if text.len() <= MAX_DETAIL_LEN {
        return text.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn take_collection<T: DeserializeOwned>(body: &Value, key: &str) -> Result<Vec<T>, GhostError> {
    let raw = body.get(key).and_then(Value::as_array).ok_or_else(|| {
        GhostError::ProtocolMismatch(format!("response is missing the '{}' array", key))
    })?;
    raw.iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| {
                GhostError::ProtocolMismatch(format!("malformed '{}' entry: {}", key, e))
            })
        })
        .collect()
}

fn take_single<T: DeserializeOwned>(body: &Value, key: &str) -> Result<T, GhostError> {
    let mut items: Vec<T> = take_collection(body, key)?;
    if items.is_empty() {
        return Err(GhostError::ProtocolMismatch(format!(
            "response '{}' array is empty",
            key
        )));
    }
    Ok(items.remove(0))
}

fn take_pagination(body: &Value) -> Result<Option<Pagination>, GhostError> {
    match body.get("meta").and_then(|m| m.get("pagination")) {
        Some(raw) => serde_json::from_value(raw.clone()).map(Some).map_err(|e| {
            GhostError::ProtocolMismatch(format!("malformed pagination block: {}", e))
        }),
        None => Ok(None),
    }
}
