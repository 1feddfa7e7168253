//! Sale totals and status derivation from line-item states.
//!
//! A sale's total is always the sum of its active subtotals, and a sale is
//! cancelled exactly when it has no active items. Every write path that
//! flips an item status must re-derive both through these functions.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{ItemStatus, LineState, SaleStatus};

/// Errors for invalid status transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The sale or item is already cancelled.
    #[error("already cancelled")]
    AlreadyCancelled,

    /// The sale or item is not cancelled, so it cannot be restored.
    #[error("not cancelled")]
    NotCancelled,
}

/// Sum of subtotals over active items.
#[must_use]
pub fn active_total(items: &[LineState]) -> Decimal {
    items
        .iter()
        .filter(|item| item.status == ItemStatus::Active)
        .map(|item| item.subtotal)
        .sum()
}

/// Derives the sale status from its items: cancelled iff zero active items.
#[must_use]
pub fn derive_status(items: &[LineState]) -> SaleStatus {
    if items.iter().any(|item| item.status == ItemStatus::Active) {
        SaleStatus::Completed
    } else {
        SaleStatus::Cancelled
    }
}

/// Guards that an item can be cancelled.
///
/// # Errors
///
/// Returns `StatusError::AlreadyCancelled` for an inactive item.
pub const fn ensure_item_active(status: ItemStatus) -> Result<(), StatusError> {
    match status {
        ItemStatus::Active => Ok(()),
        ItemStatus::Cancelled => Err(StatusError::AlreadyCancelled),
    }
}

/// Guards that an item can be restored.
///
/// # Errors
///
/// Returns `StatusError::NotCancelled` for an item that is still active.
pub const fn ensure_item_cancelled(status: ItemStatus) -> Result<(), StatusError> {
    match status {
        ItemStatus::Cancelled => Ok(()),
        ItemStatus::Active => Err(StatusError::NotCancelled),
    }
}

/// Guards that a sale can be cancelled.
///
/// # Errors
///
/// Returns `StatusError::AlreadyCancelled` for a cancelled sale.
pub const fn ensure_sale_not_cancelled(status: SaleStatus) -> Result<(), StatusError> {
    match status {
        SaleStatus::Completed => Ok(()),
        SaleStatus::Cancelled => Err(StatusError::AlreadyCancelled),
    }
}

/// Guards that a sale can be restored.
///
/// # Errors
///
/// Returns `StatusError::NotCancelled` for a sale that is not cancelled.
pub const fn ensure_sale_cancelled(status: SaleStatus) -> Result<(), StatusError> {
    match status {
        SaleStatus::Cancelled => Ok(()),
        SaleStatus::Completed => Err(StatusError::NotCancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn active(subtotal: Decimal) -> LineState {
        LineState::new(ItemStatus::Active, subtotal)
    }

    fn cancelled(subtotal: Decimal) -> LineState {
        LineState::new(ItemStatus::Cancelled, subtotal)
    }

    #[test]
    fn test_active_total_skips_cancelled() {
        let items = vec![active(dec!(10.00)), cancelled(dec!(3.00))];
        assert_eq!(active_total(&items), dec!(10.00));
    }

    #[test]
    fn test_all_cancelled_total_is_zero() {
        let items = vec![cancelled(dec!(10.00)), cancelled(dec!(3.00))];
        assert_eq!(active_total(&items), Decimal::ZERO);
    }

    #[test]
    fn test_derive_status_mixed_is_completed() {
        let items = vec![active(dec!(10.00)), cancelled(dec!(3.00))];
        assert_eq!(derive_status(&items), SaleStatus::Completed);
    }

    #[test]
    fn test_derive_status_all_cancelled() {
        let items = vec![cancelled(dec!(10.00))];
        assert_eq!(derive_status(&items), SaleStatus::Cancelled);
    }

    #[test]
    fn test_derive_status_empty_is_cancelled() {
        assert_eq!(derive_status(&[]), SaleStatus::Cancelled);
    }

    #[test]
    fn test_item_guards() {
        assert!(ensure_item_active(ItemStatus::Active).is_ok());
        assert_eq!(
            ensure_item_active(ItemStatus::Cancelled),
            Err(StatusError::AlreadyCancelled)
        );
        assert!(ensure_item_cancelled(ItemStatus::Cancelled).is_ok());
        assert_eq!(
            ensure_item_cancelled(ItemStatus::Active),
            Err(StatusError::NotCancelled)
        );
    }

    #[test]
    fn test_sale_guards() {
        assert!(ensure_sale_not_cancelled(SaleStatus::Completed).is_ok());
        assert_eq!(
            ensure_sale_not_cancelled(SaleStatus::Cancelled),
            Err(StatusError::AlreadyCancelled)
        );
        assert!(ensure_sale_cancelled(SaleStatus::Cancelled).is_ok());
        assert_eq!(
            ensure_sale_cancelled(SaleStatus::Completed),
            Err(StatusError::NotCancelled)
        );
    }
}
