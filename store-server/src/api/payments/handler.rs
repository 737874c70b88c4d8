//! Payment API Handlers
//!
//! `/ready` starts the provider handshake and records the optimistic
//! READY payment row; `/approve` is the provider-confirmed callback
//! that drives the atomic approval workflow.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::models::{OrderPayment, OrderStatus, PaymentMethod, PaymentRecordStatus};
use validator::Validate;

use crate::api::extract::CurrentUser;
use crate::checkout::{self, ApprovalRequest, CheckoutError};
use crate::core::ServerState;

#[derive(Debug, Deserialize, Validate)]
pub struct ReadyPaymentRequest {
    pub order_id: i64,
    pub method: PaymentMethod,
    #[validate(length(min = 1))]
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct ReadyPaymentResponse {
    pub payment: OrderPayment,
    /// Where to send the customer to complete the provider approval
    pub redirect_url: String,
}

/// POST /api/payments/ready - 发起支付握手
pub async fn ready(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ReadyPaymentRequest>,
) -> Result<Json<ReadyPaymentResponse>, CheckoutError> {
    payload
        .validate()
        .map_err(|e| CheckoutError::InvalidRequest(e.to_string()))?;

    let agg = checkout::get_order(&state.pool, user.id, payload.order_id).await?;
    let handshake = state
        .gateway
        .ready(&agg.order.order_no, agg.order.total_amount)
        .await
        .map_err(|e| CheckoutError::InvalidRequest(e.to_string()))?;

    let payment = checkout::ready_payment(
        &state.pool,
        user.id,
        payload.order_id,
        payload.method,
        &payload.provider,
        &handshake.tx_id,
    )
    .await?;

    Ok(Json(ReadyPaymentResponse {
        payment,
        redirect_url: handshake.redirect_url,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApprovePaymentRequest {
    pub order_id: i64,
    pub method: PaymentMethod,
    #[validate(length(min = 1))]
    pub provider: String,
    #[validate(length(min = 1))]
    pub provider_tx_id: String,
    #[validate(range(min = 1))]
    pub authorized_amount: i64,
}

#[derive(Debug, Serialize)]
pub struct ApprovePaymentResponse {
    pub order_id: i64,
    pub payment_id: i64,
    pub payment_status: PaymentRecordStatus,
    pub order_status: OrderStatus,
}

/// POST /api/payments/approve - 支付审批（原子工作流）
pub async fn approve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ApprovePaymentRequest>,
) -> Result<Json<ApprovePaymentResponse>, CheckoutError> {
    payload
        .validate()
        .map_err(|e| CheckoutError::InvalidRequest(e.to_string()))?;

    let req = ApprovalRequest {
        user_id: user.id,
        order_id: payload.order_id,
        method: payload.method,
        provider: payload.provider,
        provider_tx_id: payload.provider_tx_id,
        authorized_amount: payload.authorized_amount,
    };
    let outcome = checkout::approve(&state.pool, &state.config, &req).await?;

    Ok(Json(ApprovePaymentResponse {
        order_id: outcome.order_id,
        payment_id: outcome.payment.id,
        payment_status: outcome.payment.status,
        order_status: outcome.order.order.status,
    }))
}
