//! Points Repository
//!
//! SQL primitives for the points ledger. Balance semantics (pre-check,
//! non-negativity, no-op on zero) live in `marketing::points`; these
//! functions only move rows.

use super::{RepoResult, Tx};
use shared::models::{PointTransaction, PointTxKind};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

const TX_SELECT: &str = "SELECT id, user_id, kind, amount_signed, expires_at, order_id, memo, created_at FROM point_transaction";

/// Ensure a balance projection row exists (write-first: this is the
/// statement that takes the transaction's writer lock).
pub async fn ensure_balance(tx: &mut Tx<'_>, user_id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO point_balance (user_id, balance, updated_at) VALUES (?, 0, ?)")
        .bind(user_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Read the balance inside the ledger transaction
pub async fn balance_in_tx(tx: &mut Tx<'_>, user_id: i64) -> RepoResult<i64> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM point_balance WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(balance.unwrap_or(0))
}

/// Read the balance outside any transaction (API reads, pre-checks)
pub async fn balance_of(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM point_balance WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(balance.unwrap_or(0))
}

/// Apply a signed delta to the balance projection
pub async fn adjust_balance(tx: &mut Tx<'_>, user_id: i64, delta: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE point_balance SET balance = balance + ?, updated_at = ? WHERE user_id = ?")
        .bind(delta)
        .bind(now)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Append an immutable ledger entry
pub async fn insert_transaction(
    tx: &mut Tx<'_>,
    user_id: i64,
    kind: PointTxKind,
    amount_signed: i64,
    expires_at: Option<i64>,
    order_id: Option<i64>,
    memo: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO point_transaction (id, user_id, kind, amount_signed, expires_at, order_id, memo, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(kind)
    .bind(amount_signed)
    .bind(expires_at)
    .bind(order_id)
    .bind(memo)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Recent ledger entries, newest first
pub async fn list_transactions(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> RepoResult<Vec<PointTransaction>> {
    let sql = format!("{TX_SELECT} WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?");
    let rows: Vec<PointTransaction> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Ledger sum for a user (reconciliation checks)
pub async fn ledger_sum(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let sum: Option<i64> = sqlx::query_scalar(
        "SELECT CAST(TOTAL(amount_signed) AS INTEGER) FROM point_transaction WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(sum.unwrap_or(0))
}
