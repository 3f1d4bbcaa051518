//! Domain DTOs for the items API.
//!
//! # Design
//! These types mirror the backend's schema but are defined independently of
//! the mock-server crate. Integration tests catch any schema drift between
//! the two. Timestamps are `chrono::DateTime<Utc>` so sorting can compare
//! them chronologically instead of as strings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned item identifier.
pub type ItemId = i64;

/// Number of items the backend returns per page.
pub const PAGE_SIZE: u64 = 10;

/// Classification of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemGroup {
    Primary,
    Secondary,
}

impl ItemGroup {
    /// All groups in declaration order. The first one is the form default.
    pub const ALL: [ItemGroup; 2] = [ItemGroup::Primary, ItemGroup::Secondary];

    /// Wire value, as stored by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemGroup::Primary => "Primary",
            ItemGroup::Secondary => "Secondary",
        }
    }
}

impl Default for ItemGroup {
    fn default() -> Self {
        ItemGroup::ALL[0]
    }
}

impl fmt::Display for ItemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item group: {0:?}")]
pub struct UnknownGroup(pub String);

impl FromStr for ItemGroup {
    type Err = UnknownGroup;

    /// Case-insensitive match against the wire values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ItemGroup::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownGroup(s.to_string()))
    }
}

/// A single item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub group: ItemGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a new item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateItem {
    pub name: String,
    pub group: ItemGroup,
}

/// Request payload for a partial update. Only the fields present in the
/// JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<ItemGroup>,
}

impl From<CreateItem> for UpdateItem {
    fn from(input: CreateItem) -> Self {
        Self {
            name: Some(input.name),
            group: Some(input.group),
        }
    }
}

/// One page of a paginated listing.
///
/// `count` is the total across all pages; `next` and `previous` are the
/// backend's page links, absent at either end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
