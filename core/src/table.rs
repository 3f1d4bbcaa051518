//! View model for the item table: current page, sort state, and what the
//! table should show for a query result.

use crate::error::ApiError;
use crate::pagination::PaginationControls;
use crate::service::ItemService;
use crate::sort::{sort_items, SortField, SortState};
use crate::transport::Transport;
use crate::types::{Item, Page};

pub const NO_ITEMS: &str = "No items found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// The list query failed; carries the full message to display.
    Error(String),
    /// Nothing on this page. No pagination controls are shown.
    Empty,
    Rows {
        items: Vec<Item>,
        sort: SortState,
        pagination: Option<PaginationControls>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTable {
    page: u32,
    sort: SortState,
}

impl Default for ItemTable {
    fn default() -> Self {
        Self {
            page: 1,
            sort: SortState::default(),
        }
    }
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.sort.select(field);
    }

    /// Pages are 1-based; zero is treated as the first page.
    pub fn select_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn view(&self, result: Result<&Page<Item>, &ApiError>) -> TableView {
        match result {
            Err(err) => TableView::Error(format!("Error loading items: {err}")),
            Ok(page) if page.is_empty() => TableView::Empty,
            Ok(page) => TableView::Rows {
                items: sort_items(&page.results, self.sort),
                sort: self.sort,
                pagination: PaginationControls::for_page(page, self.page),
            },
        }
    }

    /// Fetch the current page through `service` and build its view.
    pub async fn load<T: Transport>(&self, service: &ItemService<T>) -> TableView {
        let result = service.items(self.page).await;
        self.view(result.as_ref())
    }
}
