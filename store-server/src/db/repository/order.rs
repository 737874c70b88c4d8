//! Order Repository
//!
//! Header + item snapshot persistence. `find_for_update` is the unit
//! of locking for checkout: its first statement is a write, so the
//! enclosing transaction holds the SQLite writer lock before any guard
//! runs against the loaded row.

use super::{RepoResult, Tx};
use shared::models::{Order, OrderAggregate, OrderItem};
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT id, user_id, order_no, cart_id, status, payment_status, rental_status, item_count, subtotal_amount, discount_amount, coupon_discount_amount, shipping_amount, rental_amount, total_amount, applied_coupon_issuance_id, points_spent, points_earned, placed_at, paid_at, cancelled_at, completed_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, ref_type, ref_id, title, quantity, rental_days, list_price, sale_price, unit_price, line_total, points_rate, points_earned_item FROM order_item";

/// Insert a freshly placed order with its item snapshots
pub async fn create(tx: &mut Tx<'_>, agg: &OrderAggregate) -> RepoResult<()> {
    let o = &agg.order;
    sqlx::query(
        "INSERT INTO orders (id, user_id, order_no, cart_id, status, payment_status, rental_status, item_count, subtotal_amount, discount_amount, coupon_discount_amount, shipping_amount, rental_amount, total_amount, applied_coupon_issuance_id, points_spent, points_earned, placed_at, paid_at, cancelled_at, completed_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(o.id)
    .bind(o.user_id)
    .bind(&o.order_no)
    .bind(o.cart_id)
    .bind(o.status)
    .bind(o.payment_status)
    .bind(o.rental_status)
    .bind(o.item_count)
    .bind(o.subtotal_amount)
    .bind(o.discount_amount)
    .bind(o.coupon_discount_amount)
    .bind(o.shipping_amount)
    .bind(o.rental_amount)
    .bind(o.total_amount)
    .bind(o.applied_coupon_issuance_id)
    .bind(o.points_spent)
    .bind(o.points_earned)
    .bind(o.placed_at)
    .bind(o.paid_at)
    .bind(o.cancelled_at)
    .bind(o.completed_at)
    .bind(o.updated_at)
    .execute(&mut **tx)
    .await?;

    for item in &agg.items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, ref_type, ref_id, title, quantity, rental_days, list_price, sale_price, unit_price, line_total, points_rate, points_earned_item) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.ref_type)
        .bind(item.ref_id)
        .bind(&item.title)
        .bind(item.quantity)
        .bind(item.rental_days)
        .bind(item.list_price)
        .bind(item.sale_price)
        .bind(item.unit_price)
        .bind(item.line_total)
        .bind(item.points_rate)
        .bind(item.points_earned_item)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Read an order with its items (ownership-scoped)
pub async fn find_by_id(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
) -> RepoResult<Option<OrderAggregate>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ? AND user_id = ?");
    let order: Option<Order> = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let items: Vec<OrderItem> = sqlx::query_as(&sql).bind(order_id).fetch_all(pool).await?;

    Ok(Some(OrderAggregate { order, items }))
}

/// Lock and load an order for the duration of the enclosing transaction.
///
/// The leading self-assigning UPDATE escalates the transaction to the
/// writer role immediately, serializing concurrent approval attempts
/// for the same order. Returns `None` when the order does not exist or
/// does not belong to `user_id`.
pub async fn find_for_update(
    tx: &mut Tx<'_>,
    user_id: i64,
    order_id: i64,
) -> RepoResult<Option<OrderAggregate>> {
    let touched = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = ? AND user_id = ?")
        .bind(order_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Ok(None);
    }

    let sql = format!("{ORDER_SELECT} WHERE id = ? AND user_id = ?");
    let order: Option<Order> = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let items: Vec<OrderItem> = sqlx::query_as(&sql)
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

    Ok(Some(OrderAggregate { order, items }))
}

/// Persist the payment transition produced by `OrderAggregate::paid`
pub async fn save_paid(tx: &mut Tx<'_>, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET payment_status = ?, rental_status = ?, paid_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(order.payment_status)
    .bind(order.rental_status)
    .bind(order.paid_at)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Persist draft-time adjustments (coupon application, points application)
pub async fn save_draft_adjustments(tx: &mut Tx<'_>, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET discount_amount = ?, coupon_discount_amount = ?, total_amount = ?, applied_coupon_issuance_id = ?, points_spent = ?, updated_at = ? WHERE id = ?",
    )
    .bind(order.discount_amount)
    .bind(order.coupon_discount_amount)
    .bind(order.total_amount)
    .bind(order.applied_coupon_issuance_id)
    .bind(order.points_spent)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
