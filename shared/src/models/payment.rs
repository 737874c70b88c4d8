//! Payment Models
//!
//! Append-only payment-attempt log per order. A READY row is written
//! when the provider handshake begins; APPROVED is written only inside
//! the approval transaction, after every downstream effect.

use serde::{Deserialize, Serialize};

/// External payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    Kakaopay,
    Tosspay,
    Card,
}

/// Payment attempt state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentRecordStatus {
    Ready,
    Approved,
    PartialCancelled,
    Cancelled,
    Failed,
}

/// Payment attempt entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderPayment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub provider: String,
    pub tx_id: String,
    pub amount: i64,
    pub status: PaymentRecordStatus,
    pub approved_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
}
