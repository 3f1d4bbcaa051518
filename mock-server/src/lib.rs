//! In-memory stand-in for the items backend.
//!
//! Mirrors the real backend's observable behavior closely enough for client
//! tests: page-number pagination with absolute `next`/`previous` links,
//! newest items first, field validation errors, the (name, group) uniqueness
//! rule, and `{"detail": ...}` bodies for missing items and bad pages.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::HOST, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const PAGE_SIZE: usize = 10;
pub const GROUPS: [&str; 2] = ["Primary", "Secondary"];
const MAX_NAME_LEN: usize = 255;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemPage {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Item>,
}

/// Body of POST and PATCH. Every field is optional here so missing fields
/// become field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ItemInput {
    pub name: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    items: BTreeMap<i64, Item>,
}

impl Store {
    /// Items in listing order: newest first, ties broken by higher id.
    fn ordered(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items
    }

    fn is_taken(&self, name: &str, group: &str, except: Option<i64>) -> bool {
        self.items
            .values()
            .any(|item| item.name == name && item.group == group && Some(item.id) != except)
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/items/", get(list_items).post(create_item))
        .route(
            "/items/{id}/",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

fn not_found() -> (StatusCode, Json<Value>) {
    detail(StatusCode::NOT_FOUND, "Not found.")
}

fn page_link(host: Option<&str>, page: usize) -> String {
    let base = match host {
        Some(host) => format!("http://{host}/items/"),
        None => "/items/".to_string(),
    };
    if page == 1 {
        base
    } else {
        format!("{base}?page={page}")
    }
}

#[derive(Deserialize)]
struct ListParams {
    page: Option<String>,
}

async fn list_items(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> ApiResult<Json<ItemPage>> {
    let page = match params.page.as_deref() {
        None => 1,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Invalid page."))?,
    };

    let store = db.read().await;
    let ordered = store.ordered();
    let count = ordered.len();
    let pages = count.div_ceil(PAGE_SIZE).max(1);
    if page > pages {
        return Err(detail(StatusCode::NOT_FOUND, "Invalid page."));
    }

    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    let results = ordered
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Ok(Json(ItemPage {
        count,
        next: (page < pages).then(|| page_link(host, page + 1)),
        previous: (page > 1).then(|| page_link(host, page - 1)),
        results,
    }))
}

/// Field-level checks. `partial` skips required-field errors for PATCH.
fn check_fields(input: &ItemInput, partial: bool) -> Result<(), Map<String, Value>> {
    let mut errors = Map::new();

    match input.name.as_deref() {
        None if !partial => {
            errors.insert("name".into(), json!(["This field is required."]));
        }
        Some(name) if name.trim().is_empty() => {
            errors.insert("name".into(), json!(["This field may not be blank."]));
        }
        Some(name) if name.chars().count() > MAX_NAME_LEN => {
            errors.insert(
                "name".into(),
                json!([format!("Ensure this field has no more than {MAX_NAME_LEN} characters.")]),
            );
        }
        _ => {}
    }

    match input.group.as_deref() {
        None if !partial => {
            errors.insert("group".into(), json!(["This field is required."]));
        }
        Some(group) if !GROUPS.contains(&group) => {
            errors.insert(
                "group".into(),
                json!([format!("\"{group}\" is not a valid choice.")]),
            );
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn bad_request(body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(body))
}

fn duplicate() -> (StatusCode, Json<Value>) {
    bad_request(json!({
        "non_field_errors": ["The fields name, group must make a unique set."]
    }))
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<ItemInput>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    check_fields(&input, false).map_err(|errors| bad_request(Value::Object(errors)))?;
    let (Some(name), Some(group)) = (input.name, input.group) else {
        return Err(bad_request(json!({ "detail": "name and group are required" })));
    };

    let mut store = db.write().await;
    if store.is_taken(&name, &group, None) {
        return Err(duplicate());
    }
    store.next_id += 1;
    let now = Utc::now();
    let item = Item {
        id: store.next_id,
        name,
        group,
        created_at: now,
        updated_at: now,
    };
    store.items.insert(item.id, item.clone());
    tracing::debug!(id = item.id, "created item");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Item>> {
    let store = db.read().await;
    store.items.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<ItemInput>,
) -> ApiResult<Json<Item>> {
    let mut store = db.write().await;
    let current = store.items.get(&id).cloned().ok_or_else(not_found)?;
    check_fields(&input, true).map_err(|errors| bad_request(Value::Object(errors)))?;

    let name = input.name.unwrap_or(current.name);
    let group = input.group.unwrap_or(current.group);
    if store.is_taken(&name, &group, Some(id)) {
        return Err(duplicate());
    }

    let item = store.items.get_mut(&id).ok_or_else(not_found)?;
    item.name = name;
    item.group = group;
    item.updated_at = Utc::now();
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store
        .items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}
