//! Domain types for the sale lifecycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ventra_shared::types::ProductId;

/// One line of a checkout cart, as submitted by the caller.
///
/// The unit price is the caller's price at checkout time, not the catalog's
/// current price; it becomes the immutable snapshot price on the stored
/// item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product being sold.
    pub product_id: ProductId,
    /// Quantity in the product's unit granularity.
    pub quantity: Decimal,
    /// Unit price at time of sale.
    pub unit_price: Decimal,
}

impl CartLine {
    /// Creates a new cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }
}

/// Status of a single sale line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Counted toward the sale total and the product's stock consumption.
    Active,
    /// Cancelled; its quantity has been returned to stock.
    Cancelled,
}

/// Status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// At least one line item is active.
    Completed,
    /// Every line item is cancelled.
    Cancelled,
}

/// The (status, subtotal) projection of a stored line item.
///
/// Everything total and status derivation needs, independent of how the
/// item is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineState {
    /// Current item status.
    pub status: ItemStatus,
    /// Stored subtotal (quantity x snapshot unit price).
    pub subtotal: Decimal,
}

impl LineState {
    /// Creates a line state.
    #[must_use]
    pub const fn new(status: ItemStatus, subtotal: Decimal) -> Self {
        Self { status, subtotal }
    }
}
