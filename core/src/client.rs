//! Stateless HTTP request builder and response parser for the items API.
//!
//! # Design
//! `ItemClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Any 2xx counts as success; everything else goes through
//! [`error_message`] so every operation, DELETE included, reports failures
//! the same way.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{error_message, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateItem, Item, ItemId, Page, UpdateItem};

/// Synchronous, stateless client for the items API.
#[derive(Debug, Clone)]
pub struct ItemClient {
    base_url: String,
}

impl ItemClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `page` is 1-based.
    pub fn build_list_items(&self, page: u32) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/items/?page={page}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_item(&self, id: ItemId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_item(&self, input: &CreateItem) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, format!("{}/items/", self.base_url), input)
    }

    pub fn build_update_item(&self, id: ItemId, input: &UpdateItem) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Patch, self.item_url(id), input)
    }

    pub fn build_delete_item(&self, id: ItemId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Page<Item>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        parse_json(response)
    }

    /// The body of a successful delete is never read.
    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn item_url(&self, id: ItemId) -> String {
        format!("{}/items/{id}/", self.base_url)
    }
}

fn json_request<T: Serialize>(
    method: HttpMethod,
    path: String,
    input: &T,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map a non-2xx response to `ApiError::Http` with the derived message.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        message: error_message(response.status, &response.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemGroup;

    const ITEM_JSON: &str = r#"{"id":1,"name":"Widget","group":"Primary","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;

    fn client() -> ItemClient {
        ItemClient::new("http://localhost:8000/api")
    }

    #[test]
    fn build_list_items_produces_correct_request() {
        let req = client().build_list_items(2);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/api/items/?page=2");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_item_produces_correct_request() {
        let req = client().build_get_item(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/api/items/42/");
    }

    #[test]
    fn build_create_item_produces_correct_request() {
        let input = CreateItem {
            name: "Widget".to_string(),
            group: ItemGroup::Primary,
        };
        let req = client().build_create_item(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/api/items/");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Widget");
        assert_eq!(body["group"], "Primary");
    }

    #[test]
    fn build_update_item_sends_partial_patch() {
        let input = UpdateItem {
            name: None,
            group: Some(ItemGroup::Secondary),
        };
        let req = client().build_update_item(7, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:8000/api/items/7/");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"group": "Secondary"}));
    }

    #[test]
    fn build_delete_item_produces_correct_request() {
        let req = client().build_delete_item(5);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:8000/api/items/5/");
        assert!(req.body.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ItemClient::new("http://localhost:8000/api/");
        assert_eq!(client.build_list_items(1).path, "http://localhost:8000/api/items/?page=1");
    }

    #[test]
    fn parse_list_items_success() {
        let body = format!(r#"{{"count":11,"next":"http://x/items/?page=2","previous":null,"results":[{ITEM_JSON}]}}"#);
        let page = client().parse_list_items(HttpResponse::new(200, body)).unwrap();
        assert_eq!(page.count, 11);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name, "Widget");
        assert!(page.previous.is_none());
    }

    #[test]
    fn parse_create_accepts_any_2xx() {
        let item = client().parse_create_item(HttpResponse::new(201, ITEM_JSON)).unwrap();
        assert_eq!(item.id, 1);
        let item = client().parse_create_item(HttpResponse::new(200, ITEM_JSON)).unwrap();
        assert_eq!(item.group, ItemGroup::Primary);
    }

    #[test]
    fn parse_update_not_found_uses_detail() {
        let err = client()
            .parse_update_item(HttpResponse::new(404, r#"{"detail":"Not found."}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found.");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn parse_delete_ignores_success_body() {
        assert!(client().parse_delete_item(HttpResponse::new(204, "")).is_ok());
        assert!(client().parse_delete_item(HttpResponse::new(200, "not json")).is_ok());
    }

    #[test]
    fn parse_delete_failure_extracts_message() {
        let err = client()
            .parse_delete_item(HttpResponse::new(404, r#"{"detail":"Not found."}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::Http { status: 404, message: "Not found.".to_string() });

        let err = client().parse_delete_item(HttpResponse::new(500, "")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn parse_list_items_bad_json() {
        let err = client().parse_list_items(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
