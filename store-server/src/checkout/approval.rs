//! Payment approval workflow
//!
//! The transactional saga that finalizes one order after the external
//! provider authorized the payment: redeem the applied coupon, debit
//! and credit the points ledger, record the payment, flip the order to
//! PAID and release the consumed cart lines, all inside one SQLite
//! transaction.
//!
//! # Approval Flow
//!
//! ```text
//! approve(req)
//!     ├─ 1. Begin transaction, lock + load the order
//!     ├─ 2. Guards: not cancelled, awaiting payment, amount matches
//!     ├─ 3. Redeem applied coupon (if any)
//!     ├─ 4. Spend reserved points (if any)
//!     ├─ 5. Record payment APPROVED
//!     ├─ 6. Apply paid() transition and persist
//!     ├─ 7. Credit earned points (persisted value)
//!     ├─ 8. Release consumed cart lines, re-persist cart totals
//!     └─ 9. Commit (or roll everything back on the first failure)
//! ```

use serde::{Deserialize, Serialize};
use shared::models::{OrderAggregate, OrderPayment, PaymentMethod};
use shared::util::{add_months, now_millis};
use sqlx::SqlitePool;

use super::{ensure_awaiting_payment, CheckoutError, CheckoutResult};
use crate::core::Config;
use crate::db::repository::{cart, order, payment, RepoError};
use crate::marketing::{coupons, points};
use crate::pricing;

/// Provider-confirmed approval input
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRequest {
    pub user_id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub provider: String,
    pub provider_tx_id: String,
    pub authorized_amount: i64,
}

/// Result of a committed approval
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub user_id: i64,
    pub order_id: i64,
    pub order: OrderAggregate,
    pub payment: OrderPayment,
}

/// Write the optimistic READY payment row when the provider handshake
/// begins. The row is flipped to APPROVED by [`approve`].
pub async fn ready_payment(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
    method: PaymentMethod,
    provider: &str,
    tx_id: &str,
) -> CheckoutResult<OrderPayment> {
    let agg = order::find_by_id(pool, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(order_id))?;
    ensure_awaiting_payment(&agg.order)?;

    let row = payment::insert_ready(
        pool,
        order_id,
        method,
        provider,
        tx_id,
        agg.order.total_amount,
        now_millis(),
    )
    .await?;
    Ok(row)
}

/// Approve an order payment atomically.
///
/// The three guards in step 2 make the operation retry-safe: a
/// duplicate provider callback for an already-approved order fails on
/// `OrderNotReadyForPayment` instead of double-applying effects. There
/// is no partial-approval state observable to callers: any failure
/// from step 3 onward rolls back every prior step.
pub async fn approve(
    pool: &SqlitePool,
    config: &Config,
    req: &ApprovalRequest,
) -> CheckoutResult<ApprovalOutcome> {
    if req.provider_tx_id.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "missing provider transaction id".to_string(),
        ));
    }
    if req.authorized_amount <= 0 {
        return Err(CheckoutError::InvalidRequest(
            "authorized amount must be positive".to_string(),
        ));
    }

    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    // 1. Lock and load the order for (user, order)
    let agg = order::find_for_update(&mut tx, req.user_id, req.order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(req.order_id))?;

    // 2. Pre-flight guards
    ensure_awaiting_payment(&agg.order)?;
    if req.authorized_amount != agg.order.total_amount {
        return Err(CheckoutError::PaymentAmountMismatch {
            expected: agg.order.total_amount,
            authorized: req.authorized_amount,
        });
    }

    // 3. Redeem the applied coupon; its failures abort the whole attempt
    if let Some(issuance_id) = agg.order.applied_coupon_issuance_id {
        coupons::redeem(
            &mut tx,
            req.user_id,
            issuance_id,
            req.order_id,
            agg.order.coupon_discount_amount,
            now,
        )
        .await?;
    }

    // 4. Debit reserved points under the same lock
    if agg.order.points_spent > 0 {
        points::spend(&mut tx, req.user_id, agg.order.points_spent, req.order_id, now).await?;
    }

    // 5. First terminal-state write of the transaction
    let payment_row = payment::record_approved(
        &mut tx,
        req.order_id,
        req.method,
        &req.provider,
        &req.provider_tx_id,
        req.authorized_amount,
        now,
    )
    .await?;

    // 6. Payment transition on the aggregate, then persist
    let paid = agg.paid(now);
    order::save_paid(&mut tx, &paid.order).await?;

    // 7. Credit earned points from the persisted aggregate
    if paid.order.points_earned > 0 {
        let expires_at = add_months(now, config.points_expiry_months);
        points::earn(
            &mut tx,
            req.user_id,
            paid.order.points_earned,
            req.order_id,
            Some(expires_at),
            now,
        )
        .await?;
    }

    // 8. Release the consumed cart lines and refresh cart totals.
    //    Best-effort tidying, but inside the transaction: a crash can
    //    never leave a paid order's items sitting in the active cart.
    let consumed = paid.consumed_refs();
    cart::delete_by_user_and_refs(&mut tx, req.user_id, &consumed).await?;
    let remaining = cart::list_items_in_tx(&mut tx, req.user_id).await?;
    let totals = pricing::recalculate(&remaining);
    cart::save_totals(
        &mut tx,
        req.user_id,
        totals.item_count,
        totals.subtotal,
        totals.rental,
        totals.total,
        totals.points_earnable,
        now,
    )
    .await?;

    // 9. Commit
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        user_id = req.user_id,
        order_id = req.order_id,
        payment_id = payment_row.id,
        amount = payment_row.amount,
        "Payment approved"
    );

    Ok(ApprovalOutcome {
        user_id: req.user_id,
        order_id: req.order_id,
        order: paid,
        payment: payment_row,
    })
}

/// Ownership-scoped order read
pub async fn get_order(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
) -> CheckoutResult<OrderAggregate> {
    order::find_by_id(pool, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(order_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::draft::{self, PlaceOrderRequest};
    use crate::db::repository::{cart as cart_repo, coupon as coupon_repo, points as points_repo};
    use crate::db::test_support::{memory_pool, seed_balance, seed_coupon, seed_issuance};
    use shared::models::{
        CartItemCreate, ItemRefType, OrderStatus, PaymentRecordStatus, PaymentStatus, RentalStatus,
    };
    use shared::util::now_millis;

    const USER: i64 = 1;
    const FAR_FUTURE: i64 = 4_000_000_000_000;

    fn test_config() -> Config {
        let mut config = Config::default();
        // The pricing scenarios below assume no shipping charge
        config.shipping_fee = 0;
        config.free_shipping_threshold = 0;
        config
    }

    fn purchase_line(ref_id: i64, quantity: i64, price: i64, points_rate: i64) -> CartItemCreate {
        CartItemCreate {
            ref_type: ItemRefType::BookPurchase,
            ref_id,
            title: format!("Book {ref_id}"),
            quantity,
            rental_days: 0,
            list_price: price,
            sale_price: None,
            rental_price: None,
            points_rate,
        }
    }

    fn rental_line(ref_id: i64, rental_price: i64, rental_days: i64) -> CartItemCreate {
        CartItemCreate {
            ref_type: ItemRefType::BookRental,
            ref_id,
            title: format!("Rental {ref_id}"),
            quantity: 1,
            rental_days,
            list_price: 0,
            sale_price: None,
            rental_price: Some(rental_price),
            points_rate: 0,
        }
    }

    /// Put lines in the user's cart and place an order from all of them
    async fn place_from_cart(
        pool: &sqlx::SqlitePool,
        lines: &[CartItemCreate],
    ) -> shared::models::OrderAggregate {
        let now = now_millis();
        let open_cart = cart_repo::find_or_create(pool, USER, now).await.unwrap();
        let mut tx = pool.begin().await.unwrap();
        for line in lines {
            cart_repo::upsert_item(&mut tx, open_cart.id, USER, line, now)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let items = cart_repo::list_items(pool, USER).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        draft::place_order(pool, &test_config(), USER, &PlaceOrderRequest { cart_item_ids: ids })
            .await
            .unwrap()
    }

    fn approval_request(order_id: i64, amount: i64) -> ApprovalRequest {
        ApprovalRequest {
            user_id: USER,
            order_id,
            method: PaymentMethod::Kakaopay,
            provider: "kakaopay".to_string(),
            provider_tx_id: "pg-tx-1".to_string(),
            authorized_amount: amount,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_approval() {
        // Order: subtotal 20 000, points earned 100 (one 10 000 line at
        // 1%), zero-amount coupon applied, 500 points reserved,
        // starting balance 1 000.
        let pool = memory_pool().await;
        seed_balance(&pool, USER, 1_000).await;
        seed_coupon(&pool, 10, 0, FAR_FUTURE, 12, 1).await;
        seed_issuance(&pool, 100, 10, USER, FAR_FUTURE).await;

        let agg = place_from_cart(
            &pool,
            &[purchase_line(1, 1, 10_000, 1), purchase_line(2, 1, 10_000, 0)],
        )
        .await;
        assert_eq!(agg.order.total_amount, 20_000);
        assert_eq!(agg.order.points_earned, 100);

        draft::apply_coupon(&pool, USER, agg.order.id, 100).await.unwrap();
        draft::apply_points(&pool, USER, agg.order.id, 500).await.unwrap();

        let outcome = approve(&pool, &test_config(), &approval_request(agg.order.id, 20_000))
            .await
            .unwrap();

        // Order PAID, payment APPROVED
        assert_eq!(outcome.order.order.payment_status, PaymentStatus::Paid);
        assert_eq!(outcome.order.order.status, OrderStatus::Pending);
        assert_eq!(outcome.payment.status, PaymentRecordStatus::Approved);
        assert!(outcome.payment.approved_at.is_some());

        // Balance 1 000 − 500 + 100 = 600, ledger reconciles
        assert_eq!(points_repo::balance_of(&pool, USER).await.unwrap(), 600);
        assert_eq!(points_repo::ledger_sum(&pool, USER).await.unwrap(), 600);

        // Coupon USED with a redemption row
        let status: String =
            sqlx::query_scalar("SELECT status FROM coupon_issuance WHERE id = 100")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "USED");
        let redemption = coupon_repo::find_redemption_by_issuance(&pool, 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(redemption.order_id, agg.order.id);

        // Cart emptied and header zeroed
        let items = cart_repo::list_items(&pool, USER).await.unwrap();
        assert!(items.is_empty());
        let cart = cart_repo::find_or_create(&pool, USER, now_millis()).await.unwrap();
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.total_amount, 0);
    }

    #[tokio::test]
    async fn test_second_approval_fails_idempotently() {
        let pool = memory_pool().await;
        seed_balance(&pool, USER, 1_000).await;

        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 1)]).await;
        draft::apply_points(&pool, USER, agg.order.id, 500).await.unwrap();

        let req = approval_request(agg.order.id, 10_000);
        approve(&pool, &test_config(), &req).await.unwrap();
        let balance_after_first = points_repo::balance_of(&pool, USER).await.unwrap();

        let result = approve(&pool, &test_config(), &req).await;
        assert!(matches!(
            result,
            Err(CheckoutError::OrderNotReadyForPayment(_))
        ));

        // No double debit/credit
        assert_eq!(
            points_repo::balance_of(&pool, USER).await.unwrap(),
            balance_after_first
        );
    }

    #[tokio::test]
    async fn test_amount_mismatch_fails() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;

        let result = approve(&pool, &test_config(), &approval_request(agg.order.id, 9_999)).await;
        assert!(matches!(
            result,
            Err(CheckoutError::PaymentAmountMismatch {
                expected: 10_000,
                authorized: 9_999
            })
        ));

        // Order untouched
        let order = get_order(&pool, USER, agg.order.id).await.unwrap();
        assert_eq!(order.order.payment_status, PaymentStatus::Ready);
    }

    #[tokio::test]
    async fn test_unknown_order_fails() {
        let pool = memory_pool().await;
        let result = approve(&pool, &test_config(), &approval_request(404, 10_000)).await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(404))));
    }

    #[tokio::test]
    async fn test_cancelled_order_fails() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;
        sqlx::query("UPDATE orders SET status = 'CANCELLED' WHERE id = ?")
            .bind(agg.order.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = approve(&pool, &test_config(), &approval_request(agg.order.id, 10_000)).await;
        assert!(matches!(
            result,
            Err(CheckoutError::OrderAlreadyCancelled(_))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_balance_rolls_back_everything() {
        let pool = memory_pool().await;
        seed_balance(&pool, USER, 100).await;
        seed_coupon(&pool, 10, 0, FAR_FUTURE, 12, 1).await;
        seed_issuance(&pool, 100, 10, USER, FAR_FUTURE).await;

        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 20_000, 0)]).await;
        draft::apply_coupon(&pool, USER, agg.order.id, 100).await.unwrap();

        // Reserve more points than the balance covers by bypassing the
        // draft pre-check (balance shrank after reservation).
        sqlx::query("UPDATE orders SET points_spent = 500 WHERE id = ?")
            .bind(agg.order.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = approve(&pool, &test_config(), &approval_request(agg.order.id, 20_000)).await;
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientBalance {
                balance: 100,
                requested: 500
            })
        ));

        // Full rollback: balance unchanged, coupon still AVAILABLE, no
        // APPROVED payment, order still READY, cart line still present.
        assert_eq!(points_repo::balance_of(&pool, USER).await.unwrap(), 100);
        let status: String =
            sqlx::query_scalar("SELECT status FROM coupon_issuance WHERE id = 100")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "AVAILABLE");
        let approved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_payment WHERE order_id = ? AND status = 'APPROVED'",
        )
        .bind(agg.order.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(approved, 0);
        let order = get_order(&pool, USER, agg.order.id).await.unwrap();
        assert_eq!(order.order.payment_status, PaymentStatus::Ready);
        assert_eq!(cart_repo::list_items(&pool, USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rental_order_moves_to_preparing() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[rental_line(7, 700, 10)]).await;
        assert_eq!(agg.order.rental_amount, 7_000);

        let outcome = approve(&pool, &test_config(), &approval_request(agg.order.id, 7_000))
            .await
            .unwrap();
        assert_eq!(outcome.order.order.rental_status, Some(RentalStatus::Preparing));
    }

    #[tokio::test]
    async fn test_purchase_order_keeps_rental_status_null() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;

        let outcome = approve(&pool, &test_config(), &approval_request(agg.order.id, 10_000))
            .await
            .unwrap();
        assert!(outcome.order.order.rental_status.is_none());
    }

    #[tokio::test]
    async fn test_ready_payment_writes_handshake_row_then_approval_flips_it() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;

        let ready = ready_payment(
            &pool,
            USER,
            agg.order.id,
            PaymentMethod::Tosspay,
            "tosspay",
            "pg-tx-1",
        )
        .await
        .unwrap();
        assert_eq!(ready.status, PaymentRecordStatus::Ready);
        assert_eq!(ready.amount, 10_000);

        let mut req = approval_request(agg.order.id, 10_000);
        req.method = PaymentMethod::Tosspay;
        req.provider = "tosspay".to_string();
        let outcome = approve(&pool, &test_config(), &req).await.unwrap();

        // Same row, flipped in place; no second payment record
        assert_eq!(outcome.payment.id, ready.id);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_payment WHERE order_id = ?")
            .bind(agg.order.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_approval_only_releases_consumed_cart_lines() {
        let pool = memory_pool().await;

        // Two lines in the cart, order only the first
        let now = now_millis();
        let open_cart = cart_repo::find_or_create(&pool, USER, now).await.unwrap();
        let mut tx = pool.begin().await.unwrap();
        cart_repo::upsert_item(&mut tx, open_cart.id, USER, &purchase_line(1, 1, 10_000, 0), now)
            .await
            .unwrap();
        cart_repo::upsert_item(&mut tx, open_cart.id, USER, &purchase_line(2, 1, 5_000, 0), now)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let items = cart_repo::list_items(&pool, USER).await.unwrap();
        let first_id = items.iter().find(|i| i.ref_id == 1).unwrap().id;
        let agg = draft::place_order(
            &pool,
            &test_config(),
            USER,
            &PlaceOrderRequest {
                cart_item_ids: vec![first_id],
            },
        )
        .await
        .unwrap();

        approve(&pool, &test_config(), &approval_request(agg.order.id, 10_000))
            .await
            .unwrap();

        let remaining = cart_repo::list_items(&pool, USER).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ref_id, 2);

        // Cart header reflects the remaining line
        let cart = cart_repo::find_or_create(&pool, USER, now_millis()).await.unwrap();
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.total_amount, 5_000);
    }

    #[tokio::test]
    async fn test_invalid_request_inputs() {
        let pool = memory_pool().await;
        let mut req = approval_request(1, 10_000);
        req.provider_tx_id = String::new();
        assert!(matches!(
            approve(&pool, &test_config(), &req).await,
            Err(CheckoutError::InvalidRequest(_))
        ));

        let mut req = approval_request(1, 10_000);
        req.authorized_amount = 0;
        assert!(matches!(
            approve(&pool, &test_config(), &req).await,
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_applied_coupon_redeemed_elsewhere_aborts_approval() {
        // The coupon was applied to this draft but meanwhile spent on a
        // different order. Approval must fail, not silently proceed.
        let pool = memory_pool().await;
        seed_coupon(&pool, 10, 0, FAR_FUTURE, 12, 1).await;
        seed_issuance(&pool, 100, 10, USER, FAR_FUTURE).await;

        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;
        draft::apply_coupon(&pool, USER, agg.order.id, 100).await.unwrap();

        sqlx::query("UPDATE coupon_issuance SET status = 'USED' WHERE id = 100")
            .execute(&pool)
            .await
            .unwrap();

        let result = approve(&pool, &test_config(), &approval_request(agg.order.id, 10_000)).await;
        assert!(matches!(
            result,
            Err(CheckoutError::CouponAlreadyRedeemed(100))
        ));
        let order = get_order(&pool, USER, agg.order.id).await.unwrap();
        assert_eq!(order.order.payment_status, PaymentStatus::Ready);
    }

    #[tokio::test]
    async fn test_get_order_scopes_by_owner() {
        let pool = memory_pool().await;
        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;

        assert!(get_order(&pool, USER, agg.order.id).await.is_ok());
        let result = get_order(&pool, 999, agg.order.id).await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_issuance_marked_used_before_applying_fails_at_apply() {
        let pool = memory_pool().await;
        seed_coupon(&pool, 10, 0, FAR_FUTURE, 12, 1).await;
        seed_issuance(&pool, 100, 10, USER, FAR_FUTURE).await;
        sqlx::query("UPDATE coupon_issuance SET status = 'USED' WHERE id = 100")
            .execute(&pool)
            .await
            .unwrap();

        let agg = place_from_cart(&pool, &[purchase_line(1, 1, 10_000, 0)]).await;
        let result = draft::apply_coupon(&pool, USER, agg.order.id, 100).await;
        assert!(matches!(
            result,
            Err(CheckoutError::CouponAlreadyRedeemed(100))
        ));
    }
}
