//! Text rendering for tables, item details, notifications and form errors.
//!
//! Every function here returns a `String`; callers decide where it goes.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use items_core::pagination::PaginationControls;
use items_core::table::NO_ITEMS;
use items_core::{
    FieldErrors, Item, ItemForm, Notification, NotificationKind, SortDirection, SortField,
    SortState, TableView,
};

/// `January 5, 2024, 3:04 PM`.
pub fn format_date<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.format("%B %-d, %Y, %-I:%M %p").to_string()
}

fn local_date(at: &DateTime<chrono::Utc>) -> String {
    format_date(&at.with_timezone(&Local))
}

/// Column heading with the sort indicator for `field`.
pub fn heading(field: SortField, sort: SortState) -> String {
    let arrow = match (field == sort.field, sort.direction) {
        (false, _) => "↕",
        (true, SortDirection::Asc) => "↑",
        (true, SortDirection::Desc) => "↓",
    };
    format!("{} {arrow}", field.label())
}

fn header_cell(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).add_attribute(Attribute::Bold)
}

pub fn items_table(items: &[Item], sort: SortState) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![header_cell("ID")];
    header.extend(SortField::ALL.map(|field| header_cell(heading(field, sort))));
    table.set_header(header);

    for item in items {
        table.add_row(vec![
            Cell::new(item.id).set_alignment(CellAlignment::Right),
            Cell::new(&item.name),
            Cell::new(item.group),
            Cell::new(local_date(&item.created_at)).set_alignment(CellAlignment::Right),
            Cell::new(local_date(&item.updated_at)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// `Page 2 of 3  1 [2] 3  (prev, next)`.
pub fn pagination_line(controls: &PaginationControls) -> String {
    let pages = controls
        .pages()
        .map(|page| {
            if page == controls.current {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!(
        "Page {} of {}  {pages}",
        controls.current, controls.total_pages
    );
    let hints: Vec<&str> = [
        (controls.previous_enabled, "prev"),
        (controls.next_enabled, "next"),
    ]
    .into_iter()
    .filter_map(|(enabled, hint)| enabled.then_some(hint))
    .collect();
    if !hints.is_empty() {
        line.push_str(&format!("  ({})", hints.join(", ")));
    }
    line
}

pub fn table_view(view: &TableView) -> String {
    match view {
        TableView::Error(message) => message.clone(),
        TableView::Empty => NO_ITEMS.to_string(),
        TableView::Rows {
            items,
            sort,
            pagination,
        } => {
            let mut out = items_table(items, *sort).to_string();
            if let Some(controls) = pagination {
                out.push('\n');
                out.push_str(&pagination_line(controls));
            }
            out
        }
    }
}

pub fn item_detail(item: &Item) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.add_row(vec![header_cell("ID"), Cell::new(item.id)]);
    table.add_row(vec![header_cell("Name"), Cell::new(&item.name)]);
    table.add_row(vec![header_cell("Group"), Cell::new(item.group)]);
    table.add_row(vec![header_cell("Created At"), Cell::new(local_date(&item.created_at))]);
    table.add_row(vec![header_cell("Updated At"), Cell::new(local_date(&item.updated_at))]);
    table.to_string()
}

pub fn notification(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::Success => "✓",
        NotificationKind::Error => "✗",
    };
    format!(
        "{marker} {}: {}",
        notification.title.trim_end_matches('.'),
        notification.description
    )
}

/// One line per failed field, indented under the form.
pub fn field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|error| format!("  {}: {}", error.field.as_str(), error.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title line for the form view.
pub fn form_title(form: &ItemForm) -> String {
    match form.editing() {
        Some(id) => format!("{} #{id}", form.title()),
        None => form.title().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use items_core::{validate, ItemGroup, Page};

    fn item(id: i64, name: &str) -> Item {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 15, 4, 0).unwrap();
        Item {
            id,
            name: name.to_string(),
            group: ItemGroup::Secondary,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn dates_use_long_month_and_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 15, 4, 0).unwrap();
        assert_eq!(format_date(&at), "January 5, 2024, 3:04 PM");

        let morning = Utc.with_ymd_and_hms(2023, 11, 30, 0, 9, 0).unwrap();
        assert_eq!(format_date(&morning), "November 30, 2023, 12:09 AM");
    }

    #[test]
    fn dates_render_in_the_given_zone() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 15, 4, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(format_date(&at.with_timezone(&tokyo)), "January 6, 2024, 12:04 AM");
    }

    #[test]
    fn heading_marks_active_column() {
        let sort = SortState::new(SortField::Name, SortDirection::Desc);
        assert_eq!(heading(SortField::Name, sort), "Name ↓");
        assert_eq!(heading(SortField::Group, sort), "Group ↕");
        let sort = SortState::new(SortField::CreatedAt, SortDirection::Asc);
        assert_eq!(heading(SortField::CreatedAt, sort), "Created At ↑");
    }

    #[test]
    fn empty_and_error_views_are_plain_text() {
        assert_eq!(table_view(&TableView::Empty), "No items found.");
        assert_eq!(
            table_view(&TableView::Error("Error loading items: boom".to_string())),
            "Error loading items: boom"
        );
    }

    #[test]
    fn rows_view_contains_items_and_controls() {
        let page = Page {
            count: 12,
            next: None,
            previous: Some("http://x/items/".to_string()),
            results: vec![item(11, "Widget"), item(12, "Bolt")],
        };
        let view = items_core::ItemTable::new().view(Ok(&page));
        let mut table = items_core::ItemTable::new();
        table.select_page(2);
        let paged = table.view(Ok(&page));

        let text = table_view(&view);
        assert!(text.contains("Widget"));
        assert!(text.contains("Bolt"));
        assert!(text.contains("Updated At ↓"));

        let text = table_view(&paged);
        assert!(text.ends_with("Page 2 of 2  1 [2]  (prev)"));
    }

    #[test]
    fn pagination_line_lists_pages() {
        let controls = PaginationControls {
            current: 1,
            total_pages: 3,
            previous_enabled: false,
            next_enabled: true,
        };
        assert_eq!(pagination_line(&controls), "Page 1 of 3  [1] 2 3  (next)");
    }

    #[test]
    fn notifications_show_kind_title_and_text() {
        let ok = Notification::success("Item created.", "Item \"Widget\" has been added.");
        assert_eq!(notification(&ok), "✓ Item created: Item \"Widget\" has been added.");

        let err = Notification::error("Failed to delete item: Not found.");
        assert_eq!(notification(&err), "✗ Error: Failed to delete item: Not found.");
    }

    #[test]
    fn field_errors_one_per_line() {
        let errors = validate(" ", "Tertiary").unwrap_err();
        assert_eq!(
            field_errors(&errors),
            "  name: Name is required\n  group: Please select a valid group."
        );
    }

    #[test]
    fn form_title_names_the_edited_item() {
        assert_eq!(form_title(&ItemForm::default()), "Create New Item");
        assert_eq!(form_title(&ItemForm::new(Some(&item(7, "Bolt")))), "Edit Item #7");
    }
}
