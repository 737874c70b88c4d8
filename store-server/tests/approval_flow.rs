//! End-to-end approval flow tests against a real database file.
//!
//! Exercises the public service surface the way the HTTP layer does:
//! cart → place order → claim/apply coupon → reserve points → provider
//! handshake → approval, plus the concurrent-redemption race.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use shared::models::{
    CartItemCreate, ItemRefType, PaymentMethod, PaymentRecordStatus, PaymentStatus,
};
use shared::util::now_millis;
use store_server::checkout::{self, ApprovalRequest, PlaceOrderRequest};
use store_server::gateway::{MockGateway, PaymentGateway};
use store_server::{cart, marketing, CheckoutError, Config};

const USER: i64 = 1;
const FAR_FUTURE: i64 = 4_000_000_000_000;

fn test_config() -> Config {
    let mut config = Config::default();
    config.shipping_fee = 0;
    config.free_shipping_threshold = 0;
    config
}

/// File-backed pool so multiple connections see the same database
/// (in-memory SQLite is per-connection).
async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let path = dir.path().join("store.db");
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn seed_coupon(pool: &SqlitePool, id: i64, discount: i64) {
    sqlx::query(
        "INSERT INTO coupon (id, name, discount_amount, ends_at, validity_months, per_user_limit, is_active, created_at) VALUES (?, 'Launch Coupon', ?, ?, 12, 1, 1, 0)",
    )
    .bind(id)
    .bind(discount)
    .bind(FAR_FUTURE)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_balance(pool: &SqlitePool, user_id: i64, balance: i64) {
    sqlx::query("INSERT INTO point_balance (user_id, balance, updated_at) VALUES (?, ?, 0)")
        .bind(user_id)
        .bind(balance)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO point_transaction (id, user_id, kind, amount_signed, created_at) VALUES (?, ?, 'ADJUST', ?, 0)",
    )
    .bind(shared::util::snowflake_id())
    .bind(user_id)
    .bind(balance)
    .execute(pool)
    .await
    .unwrap();
}

fn book_line(ref_id: i64, price: i64, points_rate: i64) -> CartItemCreate {
    CartItemCreate {
        ref_type: ItemRefType::BookPurchase,
        ref_id,
        title: format!("Book {ref_id}"),
        quantity: 1,
        rental_days: 0,
        list_price: price,
        sale_price: None,
        rental_price: None,
        points_rate,
    }
}

/// Full happy path: the numbers from the checkout scenario everyone
/// quotes: balance 1 000, spend 500, earn 100, end at 600.
#[tokio::test]
async fn full_flow_from_cart_to_approved_payment() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let config = test_config();
    seed_balance(&pool, USER, 1_000).await;
    seed_coupon(&pool, 77, 0).await;

    // Cart: 10 000 at 1% (earns 100) + plain 10 000 → total 20 000
    cart::add_item(&pool, USER, &book_line(1, 10_000, 1)).await.unwrap();
    let view = cart::add_item(&pool, USER, &book_line(2, 10_000, 0)).await.unwrap();
    assert_eq!(view.cart.total_amount, 20_000);

    // Place the order from both lines
    let ids: Vec<i64> = view.items.iter().map(|i| i.id).collect();
    let agg = checkout::place_order(&pool, &config, USER, &PlaceOrderRequest { cart_item_ids: ids })
        .await
        .unwrap();
    assert_eq!(agg.order.total_amount, 20_000);
    assert_eq!(agg.order.points_earned, 100);

    // Claim and apply the coupon, reserve 500 points
    let issued = marketing::coupons::issue_if_eligible(&pool, USER, &[77], now_millis())
        .await
        .unwrap();
    assert_eq!(issued.len(), 1);
    checkout::apply_coupon(&pool, USER, agg.order.id, issued[0].id).await.unwrap();
    checkout::apply_points(&pool, USER, agg.order.id, 500).await.unwrap();

    // Provider handshake through the gateway collaborator
    let gateway = MockGateway::new();
    let handshake = gateway.ready(&agg.order.order_no, 20_000).await.unwrap();
    let ready = checkout::ready_payment(
        &pool,
        USER,
        agg.order.id,
        PaymentMethod::Kakaopay,
        "kakaopay",
        &handshake.tx_id,
    )
    .await
    .unwrap();
    assert_eq!(ready.status, PaymentRecordStatus::Ready);

    // Provider-confirmed approval
    let auth = gateway.approve(&handshake.tx_id).await.unwrap();
    let outcome = checkout::approve(
        &pool,
        &config,
        &ApprovalRequest {
            user_id: USER,
            order_id: agg.order.id,
            method: PaymentMethod::Kakaopay,
            provider: "kakaopay".to_string(),
            provider_tx_id: auth.tx_id,
            authorized_amount: auth.authorized_amount,
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.order.order.payment_status, PaymentStatus::Paid);
    assert_eq!(outcome.payment.status, PaymentRecordStatus::Approved);
    assert_eq!(outcome.payment.id, ready.id);

    // Balance: 1 000 − 500 + 100 = 600
    let balance: i64 = sqlx::query_scalar("SELECT balance FROM point_balance WHERE user_id = ?")
        .bind(USER)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(balance, 600);

    // Coupon spent, cart emptied
    let status: String = sqlx::query_scalar("SELECT status FROM coupon_issuance WHERE id = ?")
        .bind(issued[0].id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "USED");
    let cart_view = cart::view(&pool, USER).await.unwrap();
    assert!(cart_view.items.is_empty());
    assert_eq!(cart_view.cart.total_amount, 0);
}

/// Two draft orders carrying the same coupon issuance (the two-tabs
/// race): at most one approval wins; the other rolls back entirely
/// with `CouponAlreadyRedeemed`.
#[tokio::test]
async fn concurrent_redemptions_of_one_issuance_approve_at_most_once() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let config = test_config();
    seed_coupon(&pool, 77, 1_000).await;

    let issued = marketing::coupons::issue_if_eligible(&pool, USER, &[77], now_millis())
        .await
        .unwrap();
    let issuance_id = issued[0].id;

    // Two independent draft orders, both with the issuance applied
    let mut orders = Vec::new();
    for ref_id in [1, 2] {
        let view = cart::add_item(&pool, USER, &book_line(ref_id, 10_000, 0)).await.unwrap();
        let line_id = view.items.iter().find(|i| i.ref_id == ref_id).unwrap().id;
        let agg = checkout::place_order(
            &pool,
            &config,
            USER,
            &PlaceOrderRequest {
                cart_item_ids: vec![line_id],
            },
        )
        .await
        .unwrap();
        checkout::apply_coupon(&pool, USER, agg.order.id, issuance_id).await.unwrap();
        orders.push(agg);
    }

    let request = |order_id: i64, tag: &str| ApprovalRequest {
        user_id: USER,
        order_id,
        method: PaymentMethod::Card,
        provider: "card".to_string(),
        provider_tx_id: format!("tx-{tag}"),
        authorized_amount: 9_000, // 10 000 − 1 000 coupon
    };

    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let config_a = config.clone();
    let config_b = config.clone();
    let req_a = request(orders[0].order.id, "a");
    let req_b = request(orders[1].order.id, "b");

    let (a, b) = tokio::join!(
        tokio::spawn(async move { checkout::approve(&pool_a, &config_a, &req_a).await }),
        tokio::spawn(async move { checkout::approve(&pool_b, &config_b, &req_b).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one approval may win the issuance");
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser,
        Err(CheckoutError::CouponAlreadyRedeemed(id)) if *id == issuance_id
    ));

    // Exactly one redemption row exists
    let redemptions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM coupon_redemption WHERE issuance_id = ?")
            .bind(issuance_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(redemptions, 1);

    // The losing order rolled back to READY with no approved payment
    let losing_order = results
        .iter()
        .zip(&orders)
        .find(|(r, _)| r.is_err())
        .map(|(_, o)| o)
        .unwrap();
    let reloaded = checkout::get_order(&pool, USER, losing_order.order.id).await.unwrap();
    assert_eq!(reloaded.order.payment_status, PaymentStatus::Ready);
    let approved: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_payment WHERE order_id = ? AND status = 'APPROVED'",
    )
    .bind(losing_order.order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(approved, 0);
}

/// A replayed provider callback must fail cleanly, leaving every
/// ledger untouched.
#[tokio::test]
async fn replayed_callback_is_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let config = test_config();
    seed_balance(&pool, USER, 1_000).await;

    let view = cart::add_item(&pool, USER, &book_line(1, 10_000, 5)).await.unwrap();
    let agg = checkout::place_order(
        &pool,
        &config,
        USER,
        &PlaceOrderRequest {
            cart_item_ids: vec![view.items[0].id],
        },
    )
    .await
    .unwrap();

    let req = ApprovalRequest {
        user_id: USER,
        order_id: agg.order.id,
        method: PaymentMethod::Tosspay,
        provider: "tosspay".to_string(),
        provider_tx_id: "tx-replay".to_string(),
        authorized_amount: 10_000,
    };
    checkout::approve(&pool, &config, &req).await.unwrap();
    let balance_after: i64 =
        sqlx::query_scalar("SELECT balance FROM point_balance WHERE user_id = ?")
            .bind(USER)
            .fetch_one(&pool)
            .await
            .unwrap();

    let replay = checkout::approve(&pool, &config, &req).await;
    assert!(matches!(
        replay,
        Err(CheckoutError::OrderNotReadyForPayment(_))
    ));

    let balance_now: i64 =
        sqlx::query_scalar("SELECT balance FROM point_balance WHERE user_id = ?")
            .bind(USER)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance_now, balance_after);

    // Still exactly one approved payment row
    let approved: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_payment WHERE order_id = ? AND status = 'APPROVED'",
    )
    .bind(agg.order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(approved, 1);
}
