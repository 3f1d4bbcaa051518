//! Data-access layer: cached queries and invalidating mutations.
//!
//! # Design
//! `ItemService` composes the stateless [`ItemClient`] with a [`Transport`]
//! and two [`QueryCache`]s, one for list pages and one for single items.
//!
//! - Queries serve fresh cache entries and otherwise fetch, retrying failed
//!   attempts with exponential backoff before giving up.
//! - Mutations issue exactly one request. Only after it succeeds are the
//!   affected cache entries invalidated, and that happens before the
//!   mutation returns, so any read started afterwards refetches. A query
//!   already in flight still returns what it fetched, but caches it as
//!   stale. Failures leave the cache untouched and produce an error
//!   notification.
//! - Concurrent mutations are not serialized; the backend decides the
//!   winner.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{Cached, Clock, KeyFilter, QueryCache, QueryKey, SystemClock};
use crate::client::ItemClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::transport::Transport;
use crate::types::{CreateItem, Item, ItemId, Page, UpdateItem};

/// Upper bound for a single retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Freshness, eviction and retry settings shared by every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Age after which cached data is refetched on next access.
    pub stale_time: Duration,
    /// Idle time after which an entry is evicted.
    pub gc_time: Duration,
    /// Extra attempts after a failed query fetch.
    pub retry: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_delay: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(24 * 60 * 60),
            retry: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl QueryConfig {
    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

/// The write operations, named the way notifications refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    pub fn verb(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

pub struct ItemService<T> {
    client: ItemClient,
    transport: T,
    config: QueryConfig,
    lists: QueryCache<Page<Item>>,
    details: QueryCache<Item>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Transport> ItemService<T> {
    pub fn new(client: ItemClient, transport: T, config: QueryConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            lists: QueryCache::new(config.stale_time, config.gc_time, clock.clone()),
            details: QueryCache::new(config.stale_time, config.gc_time, clock),
            client,
            transport,
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the freshness clock. Drops anything cached so far.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.lists = QueryCache::new(self.config.stale_time, self.config.gc_time, clock.clone());
        self.details = QueryCache::new(self.config.stale_time, self.config.gc_time, clock);
        self
    }

    pub fn client(&self) -> &ItemClient {
        &self.client
    }

    /// One page of items, 1-based.
    pub async fn items(&self, page: u32) -> Result<Page<Item>, ApiError> {
        let key = QueryKey::list(page);
        if let Some(cached) = self.lists.fresh(&key) {
            debug!(%key, "cache hit");
            return Ok(cached);
        }
        debug!(%key, "cache miss");
        let started = self.lists.generation();
        let fetched = self
            .query(key, move || async move {
                let response = self.send(self.client.build_list_items(page)).await?;
                self.client.parse_list_items(response)
            })
            .await?;
        self.lists.insert_fetched(key, fetched.clone(), started);
        Ok(fetched)
    }

    pub async fn item(&self, id: ItemId) -> Result<Item, ApiError> {
        let key = QueryKey::detail(id);
        if let Some(cached) = self.details.fresh(&key) {
            debug!(%key, "cache hit");
            return Ok(cached);
        }
        debug!(%key, "cache miss");
        let started = self.details.generation();
        let fetched = self
            .query(key, move || async move {
                let response = self.send(self.client.build_get_item(id)).await?;
                self.client.parse_get_item(response)
            })
            .await?;
        self.details.insert_fetched(key, fetched.clone(), started);
        Ok(fetched)
    }

    /// Whatever is cached for `page`, fresh or not, without fetching.
    pub fn cached_items(&self, page: u32) -> Option<Cached<Page<Item>>> {
        self.lists.get(&QueryKey::list(page))
    }

    pub async fn create_item(&self, input: &CreateItem) -> Result<Item, ApiError> {
        let result = async {
            let request = self.client.build_create_item(input)?;
            let response = self.send(request).await?;
            self.client.parse_create_item(response)
        }
        .await;

        match result {
            Ok(item) => {
                self.invalidate_lists();
                info!(id = item.id, name = %item.name, "item created");
                self.notifier.notify(Notification::success(
                    "Item created.",
                    format!("Item \"{}\" has been added.", item.name),
                ));
                Ok(item)
            }
            Err(err) => Err(self.report_failure(Mutation::Create, err)),
        }
    }

    pub async fn update_item(&self, id: ItemId, input: &UpdateItem) -> Result<Item, ApiError> {
        let result = async {
            let request = self.client.build_update_item(id, input)?;
            let response = self.send(request).await?;
            self.client.parse_update_item(response)
        }
        .await;

        match result {
            Ok(item) => {
                self.details.invalidate(&KeyFilter::detail(item.id));
                self.invalidate_lists();
                info!(id = item.id, name = %item.name, "item updated");
                self.notifier.notify(Notification::success(
                    "Item updated.",
                    format!("Item \"{}\" has been updated.", item.name),
                ));
                Ok(item)
            }
            Err(err) => Err(self.report_failure(Mutation::Update, err)),
        }
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<(), ApiError> {
        let result = async {
            let response = self.send(self.client.build_delete_item(id)).await?;
            self.client.parse_delete_item(response)
        }
        .await;

        match result {
            Ok(()) => {
                self.details.invalidate(&KeyFilter::detail(id));
                self.invalidate_lists();
                info!(id, "item deleted");
                self.notifier
                    .notify(Notification::success("Item deleted.", "Item deleted successfully"));
                Ok(())
            }
            Err(err) => Err(self.report_failure(Mutation::Delete, err)),
        }
    }

    /// Mark every cached list page stale. Returns the number of pages hit.
    pub fn invalidate_lists(&self) -> usize {
        let pages = self.lists.invalidate(&KeyFilter::lists());
        debug!(pages, "invalidated list queries");
        pages
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "sending request");
        self.transport.execute(request).await
    }

    async fn query<V, F, Fut>(&self, key: QueryKey, mut fetch: F) -> Result<V, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.retry => {
                    let delay = self.config.backoff(attempt);
                    attempt += 1;
                    warn!(%key, attempt, ?delay, error = %err, "query failed, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn report_failure(&self, mutation: Mutation, err: ApiError) -> ApiError {
        let description = format!("Failed to {} item: {err}", mutation.verb());
        error!(operation = mutation.verb(), error = %err, "mutation failed");
        self.notifier.notify(Notification::error(description));
        err
    }
}
