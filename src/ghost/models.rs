//! Wire shapes for the Ghost Admin API.
//!
//! Request and response bodies wrap each resource in a single-element array
//! keyed by the collection name, `{"posts": [{...}]}`. Timestamps stay
//! opaque strings: `updated_at` must round-trip byte-identical for the
//! backend's edit collision check. Unknown backend fields are tolerated and
//! dropped on decode.

use serde::{Deserialize, Serialize};

// ============================================================================
// Posts and pages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

/// A post as the backend returns it. Pages share this shape; only the
/// envelope key differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

pub type Page = Post;

/// Fields accepted when creating a post or page.
#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub html: String,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagRef>>,
}

/// Partial update for a post or page. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub html: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.html.is_none() && self.status.is_none() && self.tags.is_none()
    }
}

/// Tag attachment by name, as post and page writes reference tags.
#[derive(Debug, Clone, Serialize)]
pub struct TagRef {
    pub name: String,
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update for a tag. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl TagChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none()
    }
}

// ============================================================================
// Site
// ============================================================================

/// Site information from the `site/` probe endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ============================================================================
// Pagination and listings
// ============================================================================

/// The `meta.pagination` block on list responses. `next` and `prev` are
/// page numbers, null at either end.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub total: u32,
    #[serde(default)]
    pub next: Option<u32>,
    #[serde(default)]
    pub prev: Option<u32>,
}

/// Aggregated list result after internal pagination following. Page numbers
/// never leak here: callers get items, the backend's total, and a flag for
/// whether more exist past what was returned.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub more_available: bool,
}

/// Caller-facing options for list operations.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Maximum items to return. Defaults applied by the client.
    pub limit: Option<u32>,
    /// Restrict posts/pages to one status. `None` lists all.
    pub status: Option<PostStatus>,
}

// ============================================================================
// Error payloads
// ============================================================================

/// Backend error body: `{"errors": [{"message": ..., "context": ...}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}
