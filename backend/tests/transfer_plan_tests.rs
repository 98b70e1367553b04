//! Tests for transfer planning, expired-batch consolidation and
//! auto-archive selection

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    consolidate_expired, plan_transfer, refresh_spoilage_group, select_archivable, Collection,
    ExpiredRow, StockStatus, TransferAction,
};
use std::str::FromStr;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expired(
    collection: Collection,
    item_id: i64,
    batch_date: NaiveDate,
    quantity: &str,
) -> ExpiredRow {
    ExpiredRow {
        collection,
        item_id,
        item_name: format!("item-{item_id}"),
        category: None,
        batch_date,
        quantity: dec(quantity),
        expiration_date: date(2024, 6, 1),
    }
}

// =============================================================================
// Transfer Planning Tests
// =============================================================================

mod transfer_planning {
    use super::*;

    #[test]
    fn merge_adds_quantities_when_key_exists() {
        // 10 already in the target, 3 arriving: merged row holds 13
        let action = plan_transfer(dec("3"), Some(dec("10")), dec("100"));
        assert_eq!(
            action,
            TransferAction::MergeAdd {
                merged_quantity: dec("13")
            }
        );
    }

    #[test]
    fn insert_recomputes_status_from_quantity() {
        let action = plan_transfer(dec("30"), None, dec("100"));
        assert_eq!(
            action,
            TransferAction::Insert {
                status: StockStatus::Critical
            }
        );
    }

    #[test]
    fn insert_of_large_quantity_is_normal() {
        let action = plan_transfer(dec("500"), None, dec("100"));
        assert_eq!(
            action,
            TransferAction::Insert {
                status: StockStatus::Normal
            }
        );
    }

    #[test]
    fn merge_with_empty_target_row_still_merges() {
        // A zero-quantity row with the same key exists: merge, don't insert
        let action = plan_transfer(dec("4"), Some(Decimal::ZERO), dec("100"));
        assert_eq!(
            action,
            TransferAction::MergeAdd {
                merged_quantity: dec("4")
            }
        );
    }
}

// =============================================================================
// Expired Consolidation Tests
// One spoilage group per (item_id, batch_date) across all scanned collections
// =============================================================================

mod expired_consolidation {
    use super::*;

    #[test]
    fn same_key_across_collections_is_summed() {
        // 2 kg in master and 3 kg in surplus of the same batch spoil as one
        // group of 5
        let rows = vec![
            expired(Collection::Master, 7, date(2024, 5, 1), "2"),
            expired(Collection::Surplus, 7, date(2024, 5, 1), "3"),
        ];
        let groups = consolidate_expired(rows);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].quantity_spoiled, dec("5"));
        assert_eq!(
            groups[0].sources,
            vec![Collection::Master, Collection::Surplus]
        );
    }

    #[test]
    fn different_batch_dates_stay_separate() {
        let rows = vec![
            expired(Collection::Today, 7, date(2024, 5, 1), "2"),
            expired(Collection::Today, 7, date(2024, 5, 2), "3"),
        ];
        let groups = consolidate_expired(rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].batch_date, date(2024, 5, 1));
        assert_eq!(groups[1].batch_date, date(2024, 5, 2));
    }

    #[test]
    fn different_items_stay_separate() {
        let rows = vec![
            expired(Collection::Master, 1, date(2024, 5, 1), "2"),
            expired(Collection::Master, 2, date(2024, 5, 1), "3"),
        ];
        let groups = consolidate_expired(rows);

        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn groups_come_back_in_key_order() {
        let rows = vec![
            expired(Collection::Surplus, 9, date(2024, 5, 2), "1"),
            expired(Collection::Master, 3, date(2024, 5, 1), "1"),
            expired(Collection::Today, 9, date(2024, 5, 1), "1"),
        ];
        let groups = consolidate_expired(rows);

        let keys: Vec<_> = groups.iter().map(|g| (g.item_id, g.batch_date)).collect();
        assert_eq!(
            keys,
            vec![
                (3, date(2024, 5, 1)),
                (9, date(2024, 5, 1)),
                (9, date(2024, 5, 2)),
            ]
        );
    }

    #[test]
    fn no_rows_no_groups() {
        assert!(consolidate_expired(Vec::new()).is_empty());
    }
}

// =============================================================================
// Group Refresh Tests
// Before the consolidating write, source rows are re-read and the group
// rebuilt from their live quantities
// =============================================================================

mod group_refresh {
    use super::*;

    fn scanned_group() -> shared::SpoilageGroup {
        consolidate_expired(vec![expired(Collection::Today, 7, date(2024, 5, 1), "3")])
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn quantity_merged_in_after_the_scan_is_counted() {
        // Scan saw 3 in today; a morning surplus transfer merge-added 5 more
        // before consolidation ran. The spoiled quantity must be the live 8.
        let group = scanned_group();
        let refreshed = refresh_spoilage_group(&group, &[(Collection::Today, dec("8"))]).unwrap();

        assert_eq!(refreshed.quantity_spoiled, dec("8"));
        assert_eq!(refreshed.sources, vec![Collection::Today]);
    }

    #[test]
    fn partially_consumed_rows_spoil_their_remainder() {
        let group = scanned_group();
        let refreshed = refresh_spoilage_group(&group, &[(Collection::Today, dec("1.5"))]).unwrap();

        assert_eq!(refreshed.quantity_spoiled, dec("1.5"));
    }

    #[test]
    fn vanished_sources_drop_out() {
        let rows = vec![
            expired(Collection::Master, 7, date(2024, 5, 1), "2"),
            expired(Collection::Surplus, 7, date(2024, 5, 1), "3"),
        ];
        let group = consolidate_expired(rows).into_iter().next().unwrap();

        // The master row was transferred away; only surplus still holds stock
        let refreshed = refresh_spoilage_group(&group, &[(Collection::Surplus, dec("3"))]).unwrap();

        assert_eq!(refreshed.quantity_spoiled, dec("3"));
        assert_eq!(refreshed.sources, vec![Collection::Surplus]);
    }

    #[test]
    fn nothing_live_skips_the_group() {
        let group = scanned_group();
        assert_eq!(refresh_spoilage_group(&group, &[]), None);
    }

    #[test]
    fn identity_fields_are_preserved() {
        let group = scanned_group();
        let refreshed = refresh_spoilage_group(&group, &[(Collection::Today, dec("3"))]).unwrap();

        assert_eq!(refreshed.item_id, group.item_id);
        assert_eq!(refreshed.item_name, group.item_name);
        assert_eq!(refreshed.batch_date, group.batch_date);
        assert_eq!(refreshed.expiration_date, group.expiration_date);
    }
}

// =============================================================================
// Auto-Archive Selection Tests
// Depleted batches archive only while a sibling batch still holds stock
// =============================================================================

mod archive_selection {
    use super::*;

    #[test]
    fn depleted_batches_archive_when_stock_remains() {
        let quantities = vec![Decimal::ZERO, dec("5"), Decimal::ZERO];
        assert_eq!(select_archivable(&quantities), vec![0, 2]);
    }

    #[test]
    fn newest_depleted_batch_still_archives() {
        // Selection is quantity-only: a depleted batch archives even when it
        // is the newest of its item, as long as a stocked sibling remains
        let quantities = vec![dec("5"), Decimal::ZERO];
        assert_eq!(select_archivable(&quantities), vec![1]);
    }

    #[test]
    fn last_depleted_batch_is_kept() {
        // All batches empty: nothing archives, the item stays visible
        let quantities = vec![Decimal::ZERO, Decimal::ZERO];
        assert!(select_archivable(&quantities).is_empty());
    }

    #[test]
    fn single_depleted_batch_is_kept() {
        assert!(select_archivable(&[Decimal::ZERO]).is_empty());
    }

    #[test]
    fn stocked_batches_are_never_selected() {
        let quantities = vec![dec("1"), dec("2")];
        assert!(select_archivable(&quantities).is_empty());
    }

    #[test]
    fn no_batches_no_selection() {
        assert!(select_archivable(&[]).is_empty());
    }
}
