//! Client core for the items service.
//!
//! # Overview
//! Everything a frontend needs to manage items against the REST backend,
//! independent of any UI toolkit:
//!
//! - [`client`] builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - [`transport`] is the async seam where a host plugs in real I/O.
//! - [`service`] is the data-access layer: cached list/detail queries,
//!   mutations that invalidate them, and notifications.
//! - [`sort`], [`pagination`] and [`table`] turn a fetched page into what
//!   the item table shows.
//! - [`form`] validates create/edit input and submits it.
//!
//! # Design
//! - `ItemClient` is stateless; `ItemService` owns the only mutable state,
//!   the query cache.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod notify;
pub mod pagination;
pub mod service;
pub mod sort;
pub mod table;
pub mod transport;
pub mod types;

pub use client::ItemClient;
pub use error::ApiError;
pub use form::{validate, FieldErrors, ItemForm, SubmitError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notify::{Notification, NotificationKind, NotificationLog, Notifier};
pub use service::{ItemService, QueryConfig};
pub use sort::{SortDirection, SortField, SortState};
pub use table::{ItemTable, TableView};
pub use transport::Transport;
pub use types::{CreateItem, Item, ItemGroup, ItemId, Page, UpdateItem, PAGE_SIZE};
