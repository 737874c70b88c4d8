//! Coupon Repository
//!
//! SQL primitives for coupon campaigns, issuances and redemptions.
//! Eligibility and redemption rules live in `marketing::coupons`.

use super::{RepoResult, Tx};
use shared::models::{Coupon, CouponIssuance, CouponRedemption, IssuanceStatus};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

const COUPON_SELECT: &str = "SELECT id, name, discount_amount, ends_at, validity_months, per_user_limit, is_active, created_at FROM coupon";

const ISSUANCE_SELECT: &str = "SELECT id, coupon_id, user_id, issued_at, expires_at, status FROM coupon_issuance";

pub async fn find_coupon(pool: &SqlitePool, coupon_id: i64) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE id = ?");
    let row: Option<Coupon> = sqlx::query_as(&sql).bind(coupon_id).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn find_coupon_in_tx(tx: &mut Tx<'_>, coupon_id: i64) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE id = ?");
    let row: Option<Coupon> = sqlx::query_as(&sql)
        .bind(coupon_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

pub async fn count_issuances(pool: &SqlitePool, user_id: i64, coupon_id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM coupon_issuance WHERE user_id = ? AND coupon_id = ?",
    )
    .bind(user_id)
    .bind(coupon_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn insert_issuance(
    pool: &SqlitePool,
    coupon_id: i64,
    user_id: i64,
    issued_at: i64,
    expires_at: i64,
) -> RepoResult<CouponIssuance> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO coupon_issuance (id, coupon_id, user_id, issued_at, expires_at, status) VALUES (?, ?, ?, ?, ?, 'AVAILABLE')",
    )
    .bind(id)
    .bind(coupon_id)
    .bind(user_id)
    .bind(issued_at)
    .bind(expires_at)
    .execute(pool)
    .await?;

    let sql = format!("{ISSUANCE_SELECT} WHERE id = ?");
    let row: CouponIssuance = sqlx::query_as(&sql).bind(id).fetch_one(pool).await?;
    Ok(row)
}

pub async fn list_issuances_by_user(
    pool: &SqlitePool,
    user_id: i64,
) -> RepoResult<Vec<CouponIssuance>> {
    let sql = format!("{ISSUANCE_SELECT} WHERE user_id = ? ORDER BY issued_at DESC");
    let rows: Vec<CouponIssuance> = sqlx::query_as(&sql).bind(user_id).fetch_all(pool).await?;
    Ok(rows)
}

/// Ownership-scoped issuance lookup inside a transaction
pub async fn find_issuance_for_user(
    tx: &mut Tx<'_>,
    issuance_id: i64,
    user_id: i64,
) -> RepoResult<Option<CouponIssuance>> {
    let sql = format!("{ISSUANCE_SELECT} WHERE id = ? AND user_id = ?");
    let row: Option<CouponIssuance> = sqlx::query_as(&sql)
        .bind(issuance_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

/// Insert the redemption record.
///
/// The UNIQUE index on issuance_id makes this the serialization point
/// for concurrent redemption attempts; the loser surfaces as
/// [`super::RepoError::Duplicate`].
pub async fn insert_redemption(
    tx: &mut Tx<'_>,
    issuance_id: i64,
    order_id: i64,
    redeemed_amount: i64,
    redeemed_at: i64,
) -> RepoResult<CouponRedemption> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO coupon_redemption (id, issuance_id, order_id, redeemed_amount, redeemed_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(issuance_id)
    .bind(order_id)
    .bind(redeemed_amount)
    .bind(redeemed_at)
    .execute(&mut **tx)
    .await?;

    Ok(CouponRedemption {
        id,
        issuance_id,
        order_id,
        redeemed_amount,
        redeemed_at,
    })
}

pub async fn set_issuance_status(
    tx: &mut Tx<'_>,
    issuance_id: i64,
    status: IssuanceStatus,
) -> RepoResult<()> {
    sqlx::query("UPDATE coupon_issuance SET status = ? WHERE id = ?")
        .bind(status)
        .bind(issuance_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn find_redemption_by_issuance(
    pool: &SqlitePool,
    issuance_id: i64,
) -> RepoResult<Option<CouponRedemption>> {
    let row: Option<CouponRedemption> = sqlx::query_as(
        "SELECT id, issuance_id, order_id, redeemed_amount, redeemed_at FROM coupon_redemption WHERE issuance_id = ?",
    )
    .bind(issuance_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
