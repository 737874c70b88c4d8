//! Cart Models
//!
//! One open cart per user. Totals live on the cart header and are
//! re-persisted by the pricing engine after every mutation so reads
//! never recompute them.

use serde::{Deserialize, Serialize};

use super::order::ItemRefType;

/// Cart header entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub item_count: i64,
    pub subtotal_amount: i64,
    pub rental_amount: i64,
    pub total_amount: i64,
    pub points_earnable: i64,
    pub updated_at: i64,
}

/// Cart line entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub user_id: i64,
    pub ref_type: ItemRefType,
    pub ref_id: i64,
    pub title: String,
    pub quantity: i64,
    pub rental_days: i64,
    pub list_price: i64,
    pub sale_price: Option<i64>,
    pub rental_price: Option<i64>,
    pub points_rate: i64,
    pub created_at: i64,
}

impl CartItem {
    /// Sale price wins over list price when present
    pub fn effective_unit_price(&self) -> i64 {
        self.sale_price.unwrap_or(self.list_price)
    }
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemCreate {
    pub ref_type: ItemRefType,
    pub ref_id: i64,
    pub title: String,
    pub quantity: i64,
    #[serde(default)]
    pub rental_days: i64,
    pub list_price: i64,
    pub sale_price: Option<i64>,
    pub rental_price: Option<i64>,
    #[serde(default)]
    pub points_rate: i64,
}

/// Quantity-change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i64,
}

/// Cart line identity consumed by an order, keyed the same way the
/// order snapshotted it at draft time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConsumedRef {
    pub ref_type: ItemRefType,
    pub ref_id: i64,
    pub rental_days: i64,
}

/// Cart header + lines (API view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}
