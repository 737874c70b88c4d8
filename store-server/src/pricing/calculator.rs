//! Cart Price Calculator
//!
//! All amounts are integer won; points use integer floor division.
//! Fractional points are always dropped, never rounded up.

use shared::models::{CartItem, ItemRefType};

/// Result of cart price calculation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// Number of lines
    pub item_count: i64,
    /// Sum of purchase-line amounts
    pub subtotal: i64,
    /// Sum of rental-line amounts
    pub rental: i64,
    /// `subtotal + rental` (shipping/discount are order-level and zero
    /// at cart scope)
    pub total: i64,
    /// Points the cart would earn if bought as-is
    pub points_earnable: i64,
}

/// Base amount one line contributes.
///
/// Rental lines charge `rental_price * rental_days * quantity`;
/// everything else charges the effective unit price (sale price wins
/// over list price) times quantity.
pub fn line_base_amount(item: &CartItem) -> i64 {
    match item.ref_type {
        ItemRefType::BookRental => {
            item.rental_price.unwrap_or(0) * item.rental_days * item.quantity
        }
        ItemRefType::BookPurchase | ItemRefType::Product => {
            item.effective_unit_price() * item.quantity
        }
    }
}

/// Points earned by one line: `base * rate / 100`, integer floor.
pub fn line_points(base_amount: i64, points_rate: i64) -> i64 {
    if base_amount <= 0 || points_rate <= 0 {
        return 0;
    }
    base_amount * points_rate / 100
}

/// Order-level total from its components
pub fn order_total(subtotal: i64, rental: i64, shipping: i64, discount: i64) -> i64 {
    subtotal + rental + shipping - discount
}

/// Recalculate cart totals from its lines.
///
/// The cart service persists this output onto the cart header after
/// every mutation so reads never recompute from scratch.
pub fn recalculate(items: &[CartItem]) -> CartTotals {
    let mut totals = CartTotals::default();

    for item in items {
        let base = line_base_amount(item);
        match item.ref_type {
            ItemRefType::BookRental => totals.rental += base,
            ItemRefType::BookPurchase | ItemRefType::Product => totals.subtotal += base,
        }
        totals.points_earnable += line_points(base, item.points_rate);
        totals.item_count += 1;
    }

    totals.total = order_total(totals.subtotal, totals.rental, 0, 0);
    totals
}

// ==================== Tests ====================
