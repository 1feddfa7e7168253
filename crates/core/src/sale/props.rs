//! Property tests for sale totals and status derivation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use ventra_shared::types::ProductId;

use super::status::{active_total, derive_status};
use super::types::{CartLine, ItemStatus, LineState, SaleStatus};
use super::validation::{cart_total, line_subtotal, validate_cart};

/// Strategy for positive money amounts up to 10,000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for positive quantities up to 1,000.000 (3 decimals, weight-style).
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

fn item_status_strategy() -> impl Strategy<Value = ItemStatus> {
    prop_oneof![Just(ItemStatus::Active), Just(ItemStatus::Cancelled)]
}

fn line_state_strategy() -> impl Strategy<Value = LineState> {
    (item_status_strategy(), amount_strategy())
        .prop_map(|(status, subtotal)| LineState::new(status, subtotal))
}

fn cart_strategy() -> impl Strategy<Value = Vec<CartLine>> {
    prop::collection::vec(
        (quantity_strategy(), amount_strategy())
            .prop_map(|(quantity, price)| CartLine::new(ProductId::new(), quantity, price)),
        1..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The sale total always equals the sum of subtotals over active items.
    #[test]
    fn prop_total_is_sum_of_active_subtotals(items in prop::collection::vec(line_state_strategy(), 0..12)) {
        let expected: Decimal = items
            .iter()
            .filter(|item| item.status == ItemStatus::Active)
            .map(|item| item.subtotal)
            .sum();

        prop_assert_eq!(active_total(&items), expected);
    }

    /// A sale is cancelled exactly when it has zero active items.
    #[test]
    fn prop_status_cancelled_iff_no_active(items in prop::collection::vec(line_state_strategy(), 0..12)) {
        let active_count = items.iter().filter(|item| item.status == ItemStatus::Active).count();

        match derive_status(&items) {
            SaleStatus::Completed => prop_assert!(active_count > 0),
            SaleStatus::Cancelled => prop_assert_eq!(active_count, 0),
        }
    }

    /// Cancelling an active item then restoring it leaves the derived total
    /// and status unchanged.
    #[test]
    fn prop_cancel_restore_is_identity(
        mut items in prop::collection::vec(line_state_strategy(), 1..12),
        index in 0usize..12,
    ) {
        let index = index % items.len();
        prop_assume!(items[index].status == ItemStatus::Active);

        let total_before = active_total(&items);
        let status_before = derive_status(&items);

        items[index].status = ItemStatus::Cancelled;
        items[index].status = ItemStatus::Active;

        prop_assert_eq!(active_total(&items), total_before);
        prop_assert_eq!(derive_status(&items), status_before);
    }

    /// Cancelling an active item reduces the total by exactly its subtotal.
    #[test]
    fn prop_cancel_removes_exact_subtotal(
        mut items in prop::collection::vec(line_state_strategy(), 1..12),
        index in 0usize..12,
    ) {
        let index = index % items.len();
        prop_assume!(items[index].status == ItemStatus::Active);

        let total_before = active_total(&items);
        let subtotal = items[index].subtotal;

        items[index].status = ItemStatus::Cancelled;

        prop_assert_eq!(active_total(&items), total_before - subtotal);
    }

    /// A cart of positive quantities and non-negative prices always
    /// validates, and its total is the sum of its line subtotals.
    #[test]
    fn prop_cart_total_matches_line_subtotals(lines in cart_strategy()) {
        prop_assert!(validate_cart(&lines).is_ok());

        let expected: Decimal = lines
            .iter()
            .map(|line| line_subtotal(line.quantity, line.unit_price))
            .sum();

        prop_assert_eq!(cart_total(&lines), expected);
    }
}
