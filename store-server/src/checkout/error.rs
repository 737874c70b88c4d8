//! Checkout error taxonomy
//!
//! Closed set of caller-visible failures for the order/payment
//! workflow. Every variant carries enough context for the caller to
//! decide what to show; the HTTP layer maps each to a stable
//! machine-readable code and a 4xx status. Storage faults are the only
//! 5xx class.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppResponse;

/// Checkout workflow errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    // ========== Not-found ==========
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Coupon issuance not found: {0}")]
    CouponIssuanceNotFound(i64),

    // ========== State-conflict ==========
    #[error("Order already cancelled: {0}")]
    OrderAlreadyCancelled(i64),

    #[error("Order is not awaiting payment: {0}")]
    OrderNotReadyForPayment(i64),

    #[error("Coupon issuance already redeemed: {0}")]
    CouponAlreadyRedeemed(i64),

    #[error("Coupon issuance not available: {0}")]
    CouponNotAvailable(i64),

    #[error("Coupon issuance expired: {0}")]
    CouponExpired(i64),

    // ========== Business-rule ==========
    #[error("Authorized amount {authorized} does not match order total {expected}")]
    PaymentAmountMismatch { expected: i64, authorized: i64 },

    #[error("Insufficient point balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },

    // ========== Invalid-input ==========
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ========== Storage ==========
    #[error("Storage error: {0}")]
    Repo(#[from] RepoError),
}

impl CheckoutError {
    /// Stable wire code, switchable by API clients
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CheckoutError::CouponIssuanceNotFound(_) => "COUPON_ISSUANCE_NOT_FOUND",
            CheckoutError::OrderAlreadyCancelled(_) => "ORDER_ALREADY_CANCELLED",
            CheckoutError::OrderNotReadyForPayment(_) => "ORDER_NOT_READY_FOR_PAYMENT",
            CheckoutError::CouponAlreadyRedeemed(_) => "COUPON_ALREADY_REDEEMED",
            CheckoutError::CouponNotAvailable(_) => "COUPON_NOT_AVAILABLE",
            CheckoutError::CouponExpired(_) => "COUPON_EXPIRED",
            CheckoutError::PaymentAmountMismatch { .. } => "PAYMENT_AMOUNT_MISMATCH",
            CheckoutError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            CheckoutError::InvalidRequest(_) => "INVALID_REQUEST",
            CheckoutError::Repo(_) => "STORAGE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CheckoutError::OrderNotFound(_) | CheckoutError::CouponIssuanceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CheckoutError::OrderAlreadyCancelled(_)
            | CheckoutError::OrderNotReadyForPayment(_)
            | CheckoutError::CouponAlreadyRedeemed(_)
            | CheckoutError::CouponNotAvailable(_)
            | CheckoutError::CouponExpired(_) => StatusCode::CONFLICT,
            CheckoutError::PaymentAmountMismatch { .. }
            | CheckoutError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        if let CheckoutError::Repo(ref e) = self {
            tracing::error!(target: "checkout", error = %e, "Storage error in checkout");
        }
        let status = self.status();
        let body = Json(AppResponse::<()> {
            code: self.code().to_string(),
            message: self.to_string(),
            data: None,
        });
        (status, body).into_response()
    }
}

/// Result type for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
