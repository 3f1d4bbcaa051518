//! The seam between the pure request/response types and real I/O.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and hands back whatever the server answered.
///
/// Implementations must return non-2xx responses as `Ok` data; status
/// interpretation belongs to [`ItemClient`](crate::client::ItemClient).
/// `Err` is reserved for requests that produced no response at all, and
/// should be `ApiError::Network`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}
