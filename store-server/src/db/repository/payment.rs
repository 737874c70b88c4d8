//! Payment Repository
//!
//! 独立 order_payment 表，每单一条 READY 握手记录 + 终态记录。
//! Approval flips the READY row in place; a stray callback without a
//! handshake still gets an APPROVED row of its own.

use super::{RepoResult, Tx};
use shared::models::{OrderPayment, PaymentMethod, PaymentRecordStatus};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

const PAYMENT_SELECT: &str = "SELECT id, order_id, method, provider, tx_id, amount, status, approved_at, cancelled_at, created_at FROM order_payment";

/// Insert the optimistic READY row at handshake time
pub async fn insert_ready(
    pool: &SqlitePool,
    order_id: i64,
    method: PaymentMethod,
    provider: &str,
    tx_id: &str,
    amount: i64,
    now: i64,
) -> RepoResult<OrderPayment> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO order_payment (id, order_id, method, provider, tx_id, amount, status, created_at) VALUES (?, ?, ?, ?, ?, ?, 'READY', ?)",
    )
    .bind(id)
    .bind(order_id)
    .bind(method)
    .bind(provider)
    .bind(tx_id)
    .bind(amount)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row: OrderPayment = sqlx::query_as(&sql).bind(id).fetch_one(pool).await?;
    Ok(row)
}

/// Record the approved payment inside the approval transaction.
///
/// Flips the matching READY handshake row to APPROVED, or inserts a
/// fresh APPROVED row when no handshake preceded the callback.
pub async fn record_approved(
    tx: &mut Tx<'_>,
    order_id: i64,
    method: PaymentMethod,
    provider: &str,
    tx_id: &str,
    amount: i64,
    now: i64,
) -> RepoResult<OrderPayment> {
    let updated = sqlx::query(
        "UPDATE order_payment SET status = 'APPROVED', amount = ?, approved_at = ? WHERE order_id = ? AND tx_id = ? AND status = 'READY'",
    )
    .bind(amount)
    .bind(now)
    .bind(order_id)
    .bind(tx_id)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        let id = snowflake_id();
        sqlx::query(
            "INSERT INTO order_payment (id, order_id, method, provider, tx_id, amount, status, approved_at, created_at) VALUES (?, ?, ?, ?, ?, ?, 'APPROVED', ?, ?)",
        )
        .bind(id)
        .bind(order_id)
        .bind(method)
        .bind(provider)
        .bind(tx_id)
        .bind(amount)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? AND tx_id = ? AND status = ?");
    let row: OrderPayment = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(tx_id)
        .bind(PaymentRecordStatus::Approved)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row)
}

/// 按订单查询支付记录
pub async fn list_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderPayment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? ORDER BY created_at ASC");
    let rows: Vec<OrderPayment> = sqlx::query_as(&sql).bind(order_id).fetch_all(pool).await?;
    Ok(rows)
}
