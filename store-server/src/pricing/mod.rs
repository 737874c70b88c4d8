//! Cart Pricing Engine
//!
//! Pure arithmetic shared by cart recalculation and order placement.
//! Order totals must agree with what the cart quoted, so both go
//! through the same functions.

mod calculator;

pub use calculator::{line_base_amount, line_points, order_total, recalculate, CartTotals};
