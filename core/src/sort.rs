//! Client-side ordering of one page of items.
//!
//! Sorting never crosses page boundaries: it reorders the rows the server
//! returned for the current page and nothing else. The sort is stable, so
//! rows that compare equal keep their server order in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Group,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Name,
        SortField::Group,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Group => "group",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    /// Column heading shown above this field.
    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Group => "Group",
            SortField::CreatedAt => "Created At",
            SortField::UpdatedAt => "Updated At",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort field {0:?} (expected name, group, created_at or updated_at)")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| UnknownSortField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// The active sort column and direction. Defaults to newest update first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Column-header click: the active field flips direction, any other
    /// field becomes active in ascending order.
    pub fn select(&mut self, field: SortField) {
        if field == self.field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ordering = match self.field {
            SortField::Name => locale_cmp(&a.name, &b.name),
            SortField::Group => locale_cmp(a.group.as_str(), b.group.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Return a sorted copy of `items`, leaving the input in server order.
pub fn sort_items(items: &[Item], sort: SortState) -> Vec<Item> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| sort.compare(a, b));
    sorted
}

/// Human ordering for display strings: case-insensitive first, then a
/// lowercase letter before its uppercase twin.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
            .unwrap_or(Ordering::Equal)
    })
}
