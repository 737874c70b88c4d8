//! Coupon API Handlers

use axum::{extract::State, Json};
use shared::models::{CouponClaim, CouponIssuance};

use crate::api::extract::CurrentUser;
use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::db::repository::coupon;
use crate::marketing::coupons;
use crate::utils::AppResult;

/// GET /api/coupons - 当前用户的优惠券
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<CouponIssuance>>> {
    let issuances = coupon::list_issuances_by_user(&state.pool, user.id).await?;
    Ok(Json(issuances))
}

/// POST /api/coupons/claim - 领取优惠券（幂等，超过限额不再发放）
pub async fn claim(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CouponClaim>,
) -> Result<Json<Vec<CouponIssuance>>, CheckoutError> {
    let issued = coupons::issue_if_eligible(
        &state.pool,
        user.id,
        &payload.coupon_ids,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(issued))
}
