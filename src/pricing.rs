use serde::Serialize;
use utoipa::ToSchema;

/// Breakdown of a priced cart. `total` always equals `subtotal + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: f32,
    pub tax: f32,
    pub total: f32,
}

/// Prices a cart of `(unit_price, quantity)` lines.
pub fn order_totals(lines: &[(f32, i32)], tax_rate: f32) -> OrderTotals {
    let subtotal: f32 = lines
        .iter()
        .map(|(unit_price, quantity)| unit_price * *quantity as f32)
        .sum();
    let tax = subtotal * tax_rate;
    OrderTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Change handed back to the customer, never negative.
pub fn change_due(amount_paid: f32, total: f32) -> f32 {
    (amount_paid - total).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_lines_and_apply_tax() {
        let totals = order_totals(&[(120.0, 2), (45.5, 1)], 0.12);
        assert_eq!(totals.subtotal, 285.5);
        assert_eq!(totals.tax, 285.5 * 0.12);
        assert_eq!(totals.total, totals.subtotal + totals.tax);
    }

    #[test]
    fn empty_cart_prices_to_zero() {
        let totals = order_totals(&[], 0.12);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn zero_tax_rate_keeps_total_equal_to_subtotal() {
        let totals = order_totals(&[(99.0, 3)], 0.0);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn change_is_the_overpayment() {
        assert_eq!(change_due(500.0, 436.8), 500.0 - 436.8);
        assert_eq!(change_due(436.8, 436.8), 0.0);
    }

    #[test]
    fn change_clamps_at_zero_when_underpaid() {
        assert_eq!(change_due(100.0, 436.8), 0.0);
    }
}
