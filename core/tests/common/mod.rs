//! Shared fixtures: an in-process transport backed by the mock server's
//! router, with call counting and injectable failures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use http_body_util::BodyExt;
use items_core::cache::ManualClock;
use items_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, ItemClient, ItemService, NotificationLog,
    QueryConfig, Transport,
};
use tokio::sync::{oneshot, Notify};
use tower::ServiceExt;

pub const BASE_URL: &str = "http://testserver";

/// Routes requests straight into `mock_server::app()` without a socket.
pub struct RouterTransport {
    router: Router,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    held_read: Mutex<Option<(Arc<Notify>, oneshot::Receiver<()>)>>,
}

/// Holds back the response of one GET until released.
pub struct ReadGate {
    answered: Arc<Notify>,
    release: oneshot::Sender<()>,
}

impl ReadGate {
    /// Resolves once the backend has answered the held GET.
    pub async fn answered(&self) {
        self.answered.notified().await;
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl RouterTransport {
    pub fn new() -> Self {
        Self {
            router: mock_server::app(),
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            held_read: Mutex::new(None),
        }
    }

    /// The next GET is answered by the backend right away, but its response
    /// only reaches the caller after [`ReadGate::release`].
    pub fn hold_next_read(&self) -> ReadGate {
        let answered = Arc::new(Notify::new());
        let (release, held) = oneshot::channel();
        *self.held_read.lock().unwrap() = Some((answered.clone(), held));
        ReadGate { answered, release }
    }

    /// Requests executed so far, including injected failures.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` requests fail as if the network were down.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ApiError::Network("connection refused".to_string()));
        }

        let method = request.method;
        let uri = request
            .path
            .strip_prefix(BASE_URL)
            .expect("request outside test base url")
            .to_string();
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(uri)
            .header(header::HOST, "testserver");
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        let http_request = builder
            .body(Body::from(request.body.unwrap_or_default()))
            .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .expect("router is infallible");
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let response = HttpResponse::new(status, String::from_utf8_lossy(&bytes).into_owned());

        if method == HttpMethod::Get {
            let held = self.held_read.lock().unwrap().take();
            if let Some((answered, release)) = held {
                answered.notify_one();
                let _ = release.await;
            }
        }
        Ok(response)
    }
}

pub struct Harness {
    pub transport: Arc<RouterTransport>,
    pub notifications: Arc<NotificationLog>,
    pub clock: Arc<ManualClock>,
    pub service: ItemService<Arc<RouterTransport>>,
}

/// A service over a fresh mock backend with zero retry delay.
pub fn harness() -> Harness {
    harness_with(QueryConfig {
        retry_delay: Duration::ZERO,
        ..QueryConfig::default()
    })
}

pub fn harness_with(config: QueryConfig) -> Harness {
    let transport = Arc::new(RouterTransport::new());
    let notifications = Arc::new(NotificationLog::new());
    let clock = Arc::new(ManualClock::new());
    let service = ItemService::new(ItemClient::new(BASE_URL), transport.clone(), config)
        .with_notifier(notifications.clone())
        .with_clock(clock.clone());
    Harness {
        transport,
        notifications,
        clock,
        service,
    }
}
