//! Cart validation for new sales.

use rust_decimal::Decimal;
use thiserror::Error;
use ventra_shared::types::UnitKind;

use super::types::CartLine;

/// Validation errors for a submitted cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Cart has no lines.
    #[error("Cart must have at least one line")]
    EmptyCart,

    /// A line quantity is zero or negative.
    #[error("Line quantity must be positive")]
    NonPositiveQuantity,

    /// A line unit price is negative.
    #[error("Line unit price must not be negative")]
    NegativePrice,

    /// A fractional quantity was given for a whole-unit product.
    #[error("Whole-unit products cannot be sold in fractional quantities")]
    FractionalQuantity,
}

/// Validates a cart before any storage work begins.
///
/// # Errors
///
/// Returns an error if the cart is empty or any line carries a
/// non-positive quantity or negative unit price.
pub fn validate_cart(lines: &[CartLine]) -> Result<(), CartError> {
    if lines.is_empty() {
        return Err(CartError::EmptyCart);
    }

    for line in lines {
        if line.quantity <= Decimal::ZERO {
            return Err(CartError::NonPositiveQuantity);
        }
        if line.unit_price < Decimal::ZERO {
            return Err(CartError::NegativePrice);
        }
    }

    Ok(())
}

/// Checks a quantity against the product's unit granularity.
///
/// Weighed goods sell in fractional quantities; whole-unit products only in
/// integral ones.
///
/// # Errors
///
/// Returns `CartError::FractionalQuantity` for a fractional quantity on a
/// whole-unit product.
pub fn ensure_unit_granularity(kind: UnitKind, quantity: Decimal) -> Result<(), CartError> {
    if !kind.allows_fractional() && !quantity.fract().is_zero() {
        return Err(CartError::FractionalQuantity);
    }

    Ok(())
}

/// Subtotal of a single line: quantity x unit price.
#[must_use]
pub fn line_subtotal(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Total of a cart using the caller-supplied prices.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line_subtotal(line.quantity, line.unit_price))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use ventra_shared::types::ProductId;

    fn make_line(quantity: Decimal, unit_price: Decimal) -> CartLine {
        CartLine::new(ProductId::new(), quantity, unit_price)
    }

    #[test]
    fn test_valid_cart() {
        let lines = vec![make_line(dec!(2), dec!(5.00)), make_line(dec!(1), dec!(3.00))];
        assert!(validate_cart(&lines).is_ok());
        assert_eq!(cart_total(&lines), dec!(13.00));
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(validate_cart(&[]), Err(CartError::EmptyCart));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![make_line(dec!(0), dec!(5.00))];
        assert_eq!(validate_cart(&lines), Err(CartError::NonPositiveQuantity));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let lines = vec![make_line(dec!(-1), dec!(5.00))];
        assert_eq!(validate_cart(&lines), Err(CartError::NonPositiveQuantity));
    }

    #[test]
    fn test_negative_price_rejected() {
        let lines = vec![make_line(dec!(1), dec!(-0.01))];
        assert_eq!(validate_cart(&lines), Err(CartError::NegativePrice));
    }

    #[test]
    fn test_zero_price_allowed() {
        // Giveaways and promo lines are legal; only negative prices are not.
        let lines = vec![make_line(dec!(1), dec!(0))];
        assert!(validate_cart(&lines).is_ok());
    }

    #[test]
    fn test_fractional_quantity_subtotal() {
        // Weight-based lines: 0.350 kg at 12.00/kg.
        assert_eq!(line_subtotal(dec!(0.350), dec!(12.00)), dec!(4.2000));
    }

    #[test]
    fn test_unit_granularity() {
        assert!(ensure_unit_granularity(UnitKind::Unit, dec!(2)).is_ok());
        assert!(ensure_unit_granularity(UnitKind::Weight, dec!(0.350)).is_ok());
        assert_eq!(
            ensure_unit_granularity(UnitKind::Unit, dec!(0.5)),
            Err(CartError::FractionalQuantity)
        );
        // Trailing zeros are still integral.
        assert!(ensure_unit_granularity(UnitKind::Unit, dec!(2.000)).is_ok());
    }
}
