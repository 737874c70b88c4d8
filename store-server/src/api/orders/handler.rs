//! Order API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::models::{OrderAggregate, OrderPayment};

use crate::api::extract::CurrentUser;
use crate::checkout::{self, CheckoutError, PlaceOrderRequest};
use crate::core::ServerState;
use crate::db::repository::payment;
use crate::utils::AppResult;

/// POST /api/orders - 从购物车下单（生成草稿订单）
pub async fn place(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<OrderAggregate>, CheckoutError> {
    let agg = checkout::place_order(&state.pool, &state.config, user.id, &payload).await?;
    Ok(Json(agg))
}

/// GET /api/orders/:id - 获取订单详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderAggregate>, CheckoutError> {
    let agg = checkout::get_order(&state.pool, user.id, id).await?;
    Ok(Json(agg))
}

#[derive(Deserialize)]
pub struct ApplyCouponRequest {
    pub issuance_id: i64,
}

/// POST /api/orders/:id/coupon - 套用优惠券（草稿阶段，仅校验）
pub async fn apply_coupon(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<Json<OrderAggregate>, CheckoutError> {
    let agg = checkout::apply_coupon(&state.pool, user.id, id, payload.issuance_id).await?;
    Ok(Json(agg))
}

#[derive(Deserialize)]
pub struct ApplyPointsRequest {
    pub amount: i64,
}

/// POST /api/orders/:id/points - 预留积分抵扣
pub async fn apply_points(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ApplyPointsRequest>,
) -> Result<Json<OrderAggregate>, CheckoutError> {
    let agg = checkout::apply_points(&state.pool, user.id, id, payload.amount).await?;
    Ok(Json(agg))
}

/// GET /api/orders/:id/payments - 订单支付记录
pub async fn list_payments(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<OrderPayment>>> {
    // Ownership check before exposing payment attempts
    checkout::get_order(&state.pool, user.id, id)
        .await
        .map_err(|_| crate::utils::AppError::NotFound(format!("Order {id}")))?;
    let payments = payment::list_by_order(&state.pool, id).await?;
    Ok(Json(payments))
}
