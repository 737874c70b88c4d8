//! Order Models
//!
//! The order header plus its line-item snapshots. Items are immutable
//! once placed so later catalog price changes can never alter an
//! existing order.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Fulfilling,
    Completed,
    Cancelled,
}

/// Payment state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    Ready,
    Paid,
    PartialRefunded,
    Refunded,
    Failed,
    Cancelled,
}

/// Rental fulfilment state (None for purchase-only orders)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RentalStatus {
    Preparing,
    Shipping,
    Delivered,
    ReturnRequested,
    Returning,
    Returned,
    Cancelled,
}

/// What an order/cart line refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ItemRefType {
    BookPurchase,
    BookRental,
    Product,
}

/// Order header entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_no: String,
    pub cart_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub rental_status: Option<RentalStatus>,
    pub item_count: i64,
    pub subtotal_amount: i64,
    pub discount_amount: i64,
    pub coupon_discount_amount: i64,
    pub shipping_amount: i64,
    pub rental_amount: i64,
    pub total_amount: i64,
    pub applied_coupon_issuance_id: Option<i64>,
    pub points_spent: i64,
    pub points_earned: i64,
    pub placed_at: i64,
    pub paid_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub updated_at: i64,
}

/// Order line item, a price/title snapshot at placement time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub ref_type: ItemRefType,
    pub ref_id: i64,
    pub title: String,
    pub quantity: i64,
    pub rental_days: i64,
    pub list_price: i64,
    pub sale_price: Option<i64>,
    pub unit_price: i64,
    pub line_total: i64,
    pub points_rate: i64,
    pub points_earned_item: i64,
}

/// Order header + items, the unit the checkout workflow locks and loads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAggregate {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderAggregate {
    /// True when the order carries any rental line
    pub fn has_rental(&self) -> bool {
        self.order.rental_amount > 0
            || self
                .items
                .iter()
                .any(|item| item.ref_type == ItemRefType::BookRental)
    }

    /// Pure payment transition.
    ///
    /// Marks the order PAID and, when it contains rentals, moves the
    /// rental pipeline to PREPARING. Does not persist anything.
    pub fn paid(mut self, now: i64) -> Self {
        self.order.payment_status = PaymentStatus::Paid;
        self.order.paid_at = Some(now);
        self.order.updated_at = now;
        if self.has_rental() {
            self.order.rental_status = Some(RentalStatus::Preparing);
        }
        self
    }

    /// `(ref_type, ref_id, rental_days)` tuples this order consumed
    /// from the cart, used for post-approval cart cleanup.
    pub fn consumed_refs(&self) -> Vec<super::cart::ConsumedRef> {
        self.items
            .iter()
            .map(|item| super::cart::ConsumedRef {
                ref_type: item.ref_type,
                ref_id: item.ref_id,
                rental_days: item.rental_days,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_order() -> Order {
        Order {
            id: 1,
            user_id: 10,
            order_no: "ORD20250101-1".to_string(),
            cart_id: 5,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Ready,
            rental_status: None,
            item_count: 1,
            subtotal_amount: 10_000,
            discount_amount: 0,
            coupon_discount_amount: 0,
            shipping_amount: 0,
            rental_amount: 0,
            total_amount: 10_000,
            applied_coupon_issuance_id: None,
            points_spent: 0,
            points_earned: 0,
            placed_at: 1_000,
            paid_at: None,
            cancelled_at: None,
            completed_at: None,
            updated_at: 1_000,
        }
    }

    fn purchase_item() -> OrderItem {
        OrderItem {
            id: 2,
            order_id: 1,
            ref_type: ItemRefType::BookPurchase,
            ref_id: 77,
            title: "Test Book".to_string(),
            quantity: 1,
            rental_days: 0,
            list_price: 10_000,
            sale_price: None,
            unit_price: 10_000,
            line_total: 10_000,
            points_rate: 0,
            points_earned_item: 0,
        }
    }

    #[test]
    fn test_paid_sets_payment_status_and_timestamp() {
        let agg = OrderAggregate {
            order: base_order(),
            items: vec![purchase_item()],
        };
        let paid = agg.paid(2_000);
        assert_eq!(paid.order.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.order.paid_at, Some(2_000));
        assert_eq!(paid.order.status, OrderStatus::Pending);
        assert!(paid.order.rental_status.is_none());
    }

    #[test]
    fn test_paid_starts_rental_pipeline_for_rental_item() {
        let mut item = purchase_item();
        item.ref_type = ItemRefType::BookRental;
        item.rental_days = 7;
        let agg = OrderAggregate {
            order: base_order(),
            items: vec![item],
        };
        let paid = agg.paid(2_000);
        assert_eq!(paid.order.rental_status, Some(RentalStatus::Preparing));
    }

    #[test]
    fn test_paid_starts_rental_pipeline_for_rental_amount() {
        let mut order = base_order();
        order.rental_amount = 3_000;
        let agg = OrderAggregate {
            order,
            items: vec![purchase_item()],
        };
        let paid = agg.paid(2_000);
        assert_eq!(paid.order.rental_status, Some(RentalStatus::Preparing));
    }

    #[test]
    fn test_consumed_refs_mirror_items() {
        let agg = OrderAggregate {
            order: base_order(),
            items: vec![purchase_item()],
        };
        let refs = agg.consumed_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_type, ItemRefType::BookPurchase);
        assert_eq!(refs[0].ref_id, 77);
        assert_eq!(refs[0].rental_days, 0);
    }
}
