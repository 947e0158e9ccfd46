//! In-process mock Ghost Admin API
//!
//! Spawns a real HTTP server speaking enough of the admin API for the bridge
//! to exercise every tool end to end. Collections live in memory; tests seed
//! them through the shared state handle and inspect request counters on it.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const MAX_TITLE_LENGTH: usize = 255;

/// Shared, inspectable state of the mock backend.
pub struct GhostState {
    posts: Mutex<Vec<Value>>,
    pages: Mutex<Vec<Value>>,
    tags: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
    /// Total admin API requests served, including rejected ones.
    admin_requests: AtomicUsize,
    /// When set, the next admin request is rejected with 401 and the flag clears.
    reject_next_auth: AtomicBool,
    /// When set, every admin request is rejected with 401.
    reject_auth_always: AtomicBool,
    /// How many requests were rejected with 401.
    auth_rejections: AtomicUsize,
    /// Delay applied to single-resource GETs, for in-flight invocation tests.
    get_delay_ms: AtomicU64,
    /// The Authorization header of the most recent admin request.
    last_auth_header: Mutex<Option<String>>,
}

impl GhostState {
    fn new() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            pages: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            admin_requests: AtomicUsize::new(0),
            reject_next_auth: AtomicBool::new(false),
            reject_auth_always: AtomicBool::new(false),
            auth_rejections: AtomicUsize::new(0),
            get_delay_ms: AtomicU64::new(0),
            last_auth_header: Mutex::new(None),
        }
    }

    fn make_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }

    /// Ghost expands tag name references on writes into full tag objects.
    fn expand_tag_refs(&self, document: &mut Value) {
        let Some(tags) = document.get_mut("tags").and_then(Value::as_array_mut) else {
            return;
        };
        for tag in tags {
            if tag.get("id").is_none() {
                let name = tag["name"].as_str().unwrap_or("untitled").to_string();
                *tag = json!({
                    "id": self.make_id("tag"),
                    "name": name,
                    "slug": name.to_lowercase().replace(' ', "-"),
                });
            }
        }
    }

    pub fn seed_post(&self, title: &str, status: &str) -> String {
        let id = self.make_id("post");
        self.posts.lock().unwrap().push(json!({
            "id": id,
            "title": title,
            "html": format!("<p>{}</p>", title),
            "status": status,
            "url": format!("http://ghost.test/{}/", id),
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-02T00:00:00.000Z",
        }));
        id
    }

    pub fn seed_page(&self, title: &str, status: &str) -> String {
        let id = self.make_id("page");
        self.pages.lock().unwrap().push(json!({
            "id": id,
            "title": title,
            "html": format!("<p>{}</p>", title),
            "status": status,
            "url": format!("http://ghost.test/{}/", id),
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-02T00:00:00.000Z",
        }));
        id
    }

    pub fn seed_tag(&self, name: &str) -> String {
        let id = self.make_id("tag");
        self.tags.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-02T00:00:00.000Z",
        }));
        id
    }

    /// Arrange for the next admin request to get a 401.
    pub fn reject_next_auth(&self) {
        self.reject_next_auth.store(true, Ordering::SeqCst);
    }

    /// Reject every admin request with 401 until called again with false.
    pub fn set_always_reject_auth(&self, reject: bool) {
        self.reject_auth_always.store(reject, Ordering::SeqCst);
    }

    /// Delay single-resource GETs by the given amount.
    pub fn set_get_delay_ms(&self, delay: u64) {
        self.get_delay_ms.store(delay, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.admin_requests.load(Ordering::SeqCst)
    }

    pub fn auth_rejection_count(&self) -> usize {
        self.auth_rejections.load(Ordering::SeqCst)
    }

    /// The Authorization header the bridge sent most recently.
    pub fn last_auth_header(&self) -> Option<String> {
        self.last_auth_header.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn find_post(&self, id: &str) -> Option<Value> {
        find_by_id(&self.posts.lock().unwrap(), id)
    }

    pub fn find_tag(&self, id: &str) -> Option<Value> {
        find_by_id(&self.tags.lock().unwrap(), id)
    }

    fn collection(&self, resource: &str) -> Option<&Mutex<Vec<Value>>> {
        match resource {
            "posts" => Some(&self.posts),
            "pages" => Some(&self.pages),
            "tags" => Some(&self.tags),
            _ => None,
        }
    }

    /// Rejects requests without a Ghost authorization header, plus the next
    /// request when a 401 has been scripted.
    fn check_auth(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.admin_requests.fetch_add(1, Ordering::SeqCst);

        let auth_header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_auth_header.lock().unwrap() = auth_header.clone();

        let authorized = auth_header
            .map(|v| v.starts_with("Ghost "))
            .unwrap_or(false);
        if !authorized {
            self.auth_rejections.fetch_add(1, Ordering::SeqCst);
            return Err(ghost_error(
                StatusCode::UNAUTHORIZED,
                "Authorization failed",
                Some("Unable to determine the authenticated member or integration."),
            ));
        }

        let scripted = self.reject_next_auth.swap(false, Ordering::SeqCst)
            || self.reject_auth_always.load(Ordering::SeqCst);
        if scripted {
            self.auth_rejections.fetch_add(1, Ordering::SeqCst);
            return Err(ghost_error(
                StatusCode::UNAUTHORIZED,
                "Invalid token",
                Some("Token expired"),
            ));
        }

        if headers.get("accept-version").is_none() {
            return Err(ghost_error(
                StatusCode::BAD_REQUEST,
                "Accept-Version header required",
                None,
            ));
        }

        Ok(())
    }
}

fn find_by_id(items: &[Value], id: &str) -> Option<Value> {
    items
        .iter()
        .find(|item| item["id"].as_str() == Some(id))
        .cloned()
}

fn ghost_error(status: StatusCode, message: &str, context: Option<&str>) -> Response {
    (
        status,
        Json(json!({"errors": [{"message": message, "context": context}]})),
    )
        .into_response()
}

fn singular(resource: &str) -> &str {
    resource.trim_end_matches('s')
}

fn not_found(resource: &str) -> Response {
    ghost_error(
        StatusCode::NOT_FOUND,
        &format!("Resource not found error, cannot read {}.", singular(resource)),
        None,
    )
}

fn validate_title(resource: &str, document: &Value) -> Result<(), Response> {
    if resource == "tags" {
        if document["name"].as_str().unwrap_or("").is_empty() {
            return Err(ghost_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error, cannot save tag.",
                Some("Value in [tags.name] cannot be blank."),
            ));
        }
        return Ok(());
    }

    let title = document["title"].as_str().unwrap_or("");
    if title.is_empty() {
        return Err(ghost_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("Validation error, cannot save {}.", singular(resource)),
            Some(&format!("Value in [{}.title] cannot be blank.", resource)),
        ));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ghost_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("Validation error, cannot save {}.", singular(resource)),
            Some(&format!(
                "Value in [{}.title] exceeds maximum length of {} characters.",
                resource, MAX_TITLE_LENGTH
            )),
        ));
    }
    Ok(())
}

async fn get_site(State(state): State<Arc<GhostState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    Json(json!({
        "site": {
            "title": "Mock Ghost",
            "description": "A blog that exists only in tests",
            "url": "http://ghost.test/",
            "version": "5.82",
        }
    }))
    .into_response()
}

async fn list_resource(
    State(state): State<Arc<GhostState>>,
    headers: HeaderMap,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    let Some(collection) = state.collection(&resource) else {
        return not_found(&resource);
    };

    let limit: usize = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(15)
        .max(1);
    let page: usize = params
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
        .max(1);
    let status_filter = params
        .get("filter")
        .and_then(|f| f.strip_prefix("status:"))
        .map(str::to_string);

    let items = collection.lock().unwrap();
    let filtered: Vec<Value> = items
        .iter()
        .filter(|item| match &status_filter {
            Some(status) => item["status"].as_str() == Some(status),
            None => true,
        })
        .cloned()
        .collect();

    let total = filtered.len();
    let pages = total.div_ceil(limit).max(1);
    let start = (page - 1) * limit;
    let slice: Vec<Value> = filtered.into_iter().skip(start).take(limit).collect();

    let next = if page < pages {
        json!(page + 1)
    } else {
        Value::Null
    };
    let prev = if page > 1 { json!(page - 1) } else { Value::Null };

    Json(json!({
        resource.clone(): slice,
        "meta": {
            "pagination": {
                "page": page,
                "limit": limit,
                "pages": pages,
                "total": total,
                "next": next,
                "prev": prev,
            }
        }
    }))
    .into_response()
}

async fn create_resource(
    State(state): State<Arc<GhostState>>,
    headers: HeaderMap,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    let Some(collection) = state.collection(&resource) else {
        return not_found(&resource);
    };

    let Some(document) = body[&resource].get(0) else {
        return ghost_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("Request body is missing the '{}' array.", resource),
            None,
        );
    };
    if let Err(rejection) = validate_title(&resource, document) {
        return rejection;
    }

    let mut created = document.clone();
    let id = state.make_id(singular(&resource));
    created["id"] = json!(id);
    created["url"] = json!(format!("http://ghost.test/{}/", id));
    created["created_at"] = json!("2024-03-01T00:00:00.000Z");
    created["updated_at"] = json!("2024-03-01T00:00:00.000Z");
    if resource != "tags" && created.get("status").is_none() {
        created["status"] = json!("draft");
    }
    if resource == "tags" && created.get("slug").is_none() {
        let name = created["name"].as_str().unwrap_or("").to_lowercase();
        created["slug"] = json!(name.replace(' ', "-"));
    }
    state.expand_tag_refs(&mut created);

    collection.lock().unwrap().push(created.clone());
    (
        StatusCode::CREATED,
        Json(json!({resource: [created]})),
    )
        .into_response()
}

async fn get_resource(
    State(state): State<Arc<GhostState>>,
    headers: HeaderMap,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    let delay = state.get_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let Some(collection) = state.collection(&resource) else {
        return not_found(&resource);
    };
    match find_by_id(&collection.lock().unwrap(), &id) {
        Some(item) => Json(json!({resource: [item]})).into_response(),
        None => not_found(&resource),
    }
}

async fn update_resource(
    State(state): State<Arc<GhostState>>,
    headers: HeaderMap,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    let Some(collection) = state.collection(&resource) else {
        return not_found(&resource);
    };

    let Some(document) = body[&resource].get(0) else {
        return ghost_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("Request body is missing the '{}' array.", resource),
            None,
        );
    };
    let mut document = document.clone();
    state.expand_tag_refs(&mut document);
    // Edits must carry the resource's current updated_at
    if document.get("updated_at").and_then(Value::as_str).is_none() {
        return ghost_error(
            StatusCode::CONFLICT,
            &format!("Saving failed! Someone else is editing this {}.", singular(&resource)),
            Some("updated_at is missing from the request"),
        );
    }
    if let Err(rejection) = validate_title(&resource, &document) {
        return rejection;
    }

    let mut items = collection.lock().unwrap();
    let Some(stored) = items
        .iter_mut()
        .find(|item| item["id"].as_str() == Some(id.as_str()))
    else {
        return not_found(&resource);
    };

    if let (Some(stored_map), Some(document_map)) = (stored.as_object_mut(), document.as_object()) {
        for (key, value) in document_map {
            if key != "id" {
                stored_map.insert(key.clone(), value.clone());
            }
        }
        stored_map.insert("updated_at".to_string(), json!("2024-03-02T00:00:00.000Z"));
    }

    Json(json!({resource.clone(): [stored.clone()]})).into_response()
}

async fn delete_resource(
    State(state): State<Arc<GhostState>>,
    headers: HeaderMap,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    if let Err(rejection) = state.check_auth(&headers) {
        return rejection;
    }
    let Some(collection) = state.collection(&resource) else {
        return not_found(&resource);
    };

    let mut items = collection.lock().unwrap();
    let before = items.len();
    items.retain(|item| item["id"].as_str() != Some(id.as_str()));
    if items.len() == before {
        return not_found(&resource);
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Handle to a running mock backend. Shuts down when dropped.
pub struct MockGhost {
    pub base_url: String,
    pub state: Arc<GhostState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockGhost {
    pub async fn spawn() -> Self {
        let state = Arc::new(GhostState::new());

        let app = Router::new()
            .route("/ghost/api/v4/admin/site/", get(get_site))
            .route(
                "/ghost/api/v4/admin/{resource}/",
                get(list_resource).post(create_resource),
            )
            .route(
                "/ghost/api/v4/admin/{resource}/{id}/",
                get(get_resource).put(update_resource).delete(delete_resource),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock Ghost to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get mock Ghost address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock Ghost failed");
        });

        Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for MockGhost {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
