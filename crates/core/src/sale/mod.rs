//! Sale lifecycle domain logic.
//!
//! This module implements the pure rules of the sale engine:
//! - Cart validation for new sales
//! - Line subtotals and sale totals
//! - Status derivation from line-item states
//! - Status transition guards for cancel/restore

pub mod status;
pub mod types;
pub mod validation;

#[cfg(test)]
mod props;

pub use status::{
    StatusError, active_total, derive_status, ensure_item_active, ensure_item_cancelled,
    ensure_sale_cancelled, ensure_sale_not_cancelled,
};
pub use types::{CartLine, ItemStatus, LineState, SaleStatus};
pub use validation::{
    CartError, cart_total, ensure_unit_granularity, line_subtotal, validate_cart,
};
