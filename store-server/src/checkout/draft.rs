//! Draft-order operations
//!
//! Placing an order snapshots the selected cart lines; afterwards the
//! draft can only be mutated by coupon application, points application
//! and the approval workflow.

use chrono::Utc;
use serde::Deserialize;
use shared::models::{
    IssuanceStatus, Order, OrderAggregate, OrderItem, OrderStatus, PaymentStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{ensure_awaiting_payment, CheckoutError, CheckoutResult};
use crate::core::Config;
use crate::db::repository::{cart, coupon, order, points, RepoError};
use crate::pricing;

/// Place-order payload
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub cart_item_ids: Vec<i64>,
}

/// Snapshot the selected cart lines into a new draft order
/// (PENDING / READY). The lines stay in the cart until approval
/// removes them.
pub async fn place_order(
    pool: &SqlitePool,
    config: &Config,
    user_id: i64,
    req: &PlaceOrderRequest,
) -> CheckoutResult<OrderAggregate> {
    if req.cart_item_ids.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "no cart items selected".to_string(),
        ));
    }

    let now = now_millis();
    let open_cart = cart::find_or_create(pool, user_id, now).await?;
    let lines = cart::find_selectable_items(pool, user_id, &req.cart_item_ids).await?;
    if lines.len() != req.cart_item_ids.len() {
        return Err(CheckoutError::InvalidRequest(
            "selected cart items no longer exist".to_string(),
        ));
    }

    let totals = pricing::recalculate(&lines);
    let shipping = if totals.total >= config.free_shipping_threshold {
        0
    } else {
        config.shipping_fee
    };

    let order_id = snowflake_id();
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|line| {
            let base = pricing::line_base_amount(line);
            OrderItem {
                id: snowflake_id(),
                order_id,
                ref_type: line.ref_type,
                ref_id: line.ref_id,
                title: line.title.clone(),
                quantity: line.quantity,
                rental_days: line.rental_days,
                list_price: line.list_price,
                sale_price: line.sale_price,
                unit_price: line.effective_unit_price(),
                line_total: base,
                points_rate: line.points_rate,
                points_earned_item: pricing::line_points(base, line.points_rate),
            }
        })
        .collect();

    let agg = OrderAggregate {
        order: Order {
            id: order_id,
            user_id,
            order_no: next_order_no(),
            cart_id: open_cart.id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Ready,
            rental_status: None,
            item_count: items.len() as i64,
            subtotal_amount: totals.subtotal,
            discount_amount: 0,
            coupon_discount_amount: 0,
            shipping_amount: shipping,
            rental_amount: totals.rental,
            total_amount: pricing::order_total(totals.subtotal, totals.rental, shipping, 0),
            applied_coupon_issuance_id: None,
            points_spent: 0,
            points_earned: totals.points_earnable,
            placed_at: now,
            paid_at: None,
            cancelled_at: None,
            completed_at: None,
            updated_at: now,
        },
        items,
    };

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    order::create(&mut tx, &agg).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        user_id,
        order_id,
        order_no = %agg.order.order_no,
        total = agg.order.total_amount,
        "Order placed"
    );
    Ok(agg)
}

/// Attach a coupon issuance to a draft order.
///
/// Validation only; the redemption record is written at approval
/// time, inside the approval transaction.
pub async fn apply_coupon(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
    issuance_id: i64,
) -> CheckoutResult<OrderAggregate> {
    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let mut agg = order::find_for_update(&mut tx, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(order_id))?;
    ensure_awaiting_payment(&agg.order)?;

    if agg.order.applied_coupon_issuance_id.is_some() {
        return Err(CheckoutError::InvalidRequest(
            "a coupon is already applied to this order".to_string(),
        ));
    }

    let issuance = coupon::find_issuance_for_user(&mut tx, issuance_id, user_id)
        .await?
        .ok_or(CheckoutError::CouponIssuanceNotFound(issuance_id))?;
    match issuance.status {
        IssuanceStatus::Available => {}
        IssuanceStatus::Used => return Err(CheckoutError::CouponAlreadyRedeemed(issuance_id)),
        IssuanceStatus::Expired | IssuanceStatus::Revoked => {
            return Err(CheckoutError::CouponNotAvailable(issuance_id));
        }
    }
    if now > issuance.expires_at {
        return Err(CheckoutError::CouponExpired(issuance_id));
    }

    let campaign = coupon::find_coupon_in_tx(&mut tx, issuance.coupon_id)
        .await?
        .ok_or(CheckoutError::CouponIssuanceNotFound(issuance_id))?;

    let payable = agg.order.subtotal_amount + agg.order.rental_amount + agg.order.shipping_amount;
    if campaign.discount_amount > payable {
        return Err(CheckoutError::InvalidRequest(
            "coupon discount exceeds order total".to_string(),
        ));
    }

    agg.order.coupon_discount_amount = campaign.discount_amount;
    agg.order.discount_amount += campaign.discount_amount;
    agg.order.total_amount = pricing::order_total(
        agg.order.subtotal_amount,
        agg.order.rental_amount,
        agg.order.shipping_amount,
        agg.order.discount_amount,
    );
    agg.order.applied_coupon_issuance_id = Some(issuance_id);
    agg.order.updated_at = now;

    order::save_draft_adjustments(&mut tx, &agg.order).await?;
    tx.commit().await.map_err(RepoError::from)?;

    Ok(agg)
}

/// Reserve loyalty points against a draft order.
///
/// Pre-checks the balance for fast feedback; the authoritative check
/// re-runs under lock inside the approval transaction.
pub async fn apply_points(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
    amount: i64,
) -> CheckoutResult<OrderAggregate> {
    if amount <= 0 {
        return Err(CheckoutError::InvalidRequest(
            "points amount must be positive".to_string(),
        ));
    }

    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let mut agg = order::find_for_update(&mut tx, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(order_id))?;
    ensure_awaiting_payment(&agg.order)?;

    let balance = points::balance_in_tx(&mut tx, user_id).await?;
    if balance < amount {
        return Err(CheckoutError::InsufficientBalance {
            balance,
            requested: amount,
        });
    }

    agg.order.points_spent = amount;
    agg.order.updated_at = now;
    order::save_draft_adjustments(&mut tx, &agg.order).await?;
    tx.commit().await.map_err(RepoError::from)?;

    Ok(agg)
}

/// Date-prefixed order number, unique via the snowflake suffix
fn next_order_no() -> String {
    let date_str = Utc::now().format("%Y%m%d").to_string();
    format!("ORD{}-{}", date_str, snowflake_id())
}
