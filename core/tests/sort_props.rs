//! Property tests for client-side table sorting.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use items_core::sort::sort_items;
use items_core::{Item, ItemGroup, SortDirection, SortField, SortState};
use proptest::prelude::*;

fn arb_field() -> impl Strategy<Value = SortField> {
    prop::sample::select(SortField::ALL.to_vec())
}

fn arb_direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn arb_item() -> impl Strategy<Value = (String, bool, i64, i64)> {
    (
        "[a-zA-Z0-9 ]{0,12}",
        any::<bool>(),
        0i64..2_000_000_000,
        0i64..2_000_000_000,
    )
}

fn build(raw: Vec<(String, bool, i64, i64)>) -> Vec<Item> {
    raw.into_iter()
        .enumerate()
        .map(|(i, (name, secondary, created, updated))| Item {
            id: i as i64 + 1,
            name,
            group: if secondary {
                ItemGroup::Secondary
            } else {
                ItemGroup::Primary
            },
            created_at: Utc.timestamp_opt(created, 0).unwrap(),
            updated_at: Utc.timestamp_opt(updated, 0).unwrap(),
        })
        .collect()
}

proptest! {
    #[test]
    fn sorting_is_an_ordered_permutation(
        raw in prop::collection::vec(arb_item(), 0..30),
        field in arb_field(),
        direction in arb_direction(),
    ) {
        let items = build(raw);
        let sort = SortState::new(field, direction);
        let sorted = sort_items(&items, sort);

        let before: BTreeSet<i64> = items.iter().map(|i| i.id).collect();
        let after: BTreeSet<i64> = sorted.iter().map(|i| i.id).collect();
        prop_assert_eq!(sorted.len(), items.len());
        prop_assert_eq!(before, after);

        for pair in sorted.windows(2) {
            prop_assert_ne!(sort.compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn equal_keys_keep_server_order(
        raw in prop::collection::vec(arb_item(), 0..30),
        direction in arb_direction(),
    ) {
        let items = build(raw);
        let sorted = sort_items(&items, SortState::new(SortField::Group, direction));

        for pair in sorted.windows(2) {
            if pair[0].group == pair[1].group {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn descending_reverses_ascending_for_distinct_names(
        names in prop::collection::btree_set("[a-zA-Z]{1,10}", 0..20),
    ) {
        let raw = names
            .into_iter()
            .map(|name| (name, false, 0, 0))
            .collect();
        let items = build(raw);

        let asc = sort_items(&items, SortState::new(SortField::Name, SortDirection::Asc));
        let mut desc = sort_items(&items, SortState::new(SortField::Name, SortDirection::Desc));
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn selecting_the_same_field_twice_restores_direction(
        field in arb_field(),
        direction in arb_direction(),
    ) {
        let original = SortState::new(field, direction);
        let mut sort = original;
        sort.select(field);
        prop_assert_eq!(sort.field, field);
        prop_assert_ne!(sort.direction, direction);
        sort.select(field);
        prop_assert_eq!(sort, original);
    }

    #[test]
    fn selecting_another_field_starts_ascending(
        from in arb_field(),
        to in arb_field(),
        direction in arb_direction(),
    ) {
        prop_assume!(from != to);
        let mut sort = SortState::new(from, direction);
        sort.select(to);
        prop_assert_eq!(sort, SortState::new(to, SortDirection::Asc));
    }
}
