//! Coupon Ledger
//!
//! Issuance: at most `per_user_limit` grants per (user, coupon), never
//! past the campaign end. Redemption: at most once per issuance,
//! enforced by the redemption table's unique index rather than the
//! status pre-check alone.

use shared::models::{CouponIssuance, CouponRedemption, IssuanceStatus};
use shared::util::add_months;
use sqlx::SqlitePool;

use crate::checkout::{CheckoutError, CheckoutResult};
use crate::db::repository::{coupon, RepoError, Tx};

/// Grant the listed coupons to a user where eligible.
///
/// Per coupon: skipped when inactive, when the campaign has ended, or
/// when the user already holds the per-user limit. Re-invocation never
/// over-issues, so claim endpoints are idempotent up to the limit.
/// Returns only the issuances created by this call.
pub async fn issue_if_eligible(
    pool: &SqlitePool,
    user_id: i64,
    coupon_ids: &[i64],
    now: i64,
) -> CheckoutResult<Vec<CouponIssuance>> {
    let mut issued = Vec::new();

    for &coupon_id in coupon_ids {
        let Some(campaign) = coupon::find_coupon(pool, coupon_id).await? else {
            tracing::debug!(coupon_id, "Skipping unknown coupon");
            continue;
        };
        if !campaign.is_active || now >= campaign.ends_at {
            continue;
        }
        let held = coupon::count_issuances(pool, user_id, coupon_id).await?;
        if held >= campaign.per_user_limit {
            continue;
        }

        // Issuance validity never outlives the campaign itself
        let expires_at = add_months(now, campaign.validity_months as u32).min(campaign.ends_at);
        let issuance = coupon::insert_issuance(pool, coupon_id, user_id, now, expires_at).await?;
        tracing::info!(
            user_id,
            coupon_id,
            issuance_id = issuance.id,
            "Coupon issued"
        );
        issued.push(issuance);
    }

    Ok(issued)
}

/// Spend an issuance on an order, inside the caller's transaction.
///
/// Writes the redemption record and flips the issuance to USED. A
/// concurrent redeemer loses on the unique index and surfaces as
/// `CouponAlreadyRedeemed`.
pub async fn redeem(
    tx: &mut Tx<'_>,
    user_id: i64,
    issuance_id: i64,
    order_id: i64,
    redeemed_amount: i64,
    now: i64,
) -> CheckoutResult<CouponRedemption> {
    let issuance = coupon::find_issuance_for_user(tx, issuance_id, user_id)
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

    let redemption =
        match coupon::insert_redemption(tx, issuance_id, order_id, redeemed_amount, now).await {
            Ok(r) => r,
            Err(RepoError::Duplicate(_)) => {
                return Err(CheckoutError::CouponAlreadyRedeemed(issuance_id));
            }
            Err(e) => return Err(e.into()),
        };

    coupon::set_issuance_status(tx, issuance_id, IssuanceStatus::Used).await?;

    Ok(redemption)
}
