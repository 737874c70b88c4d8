//! Points Models
//!
//! Append-only signed ledger plus one mutable balance projection per
//! user. `sum(amount_signed) == balance` is the reconciliation
//! invariant; the balance never goes negative.

use serde::{Deserialize, Serialize};

/// Current balance projection (row-locked for every spend/earn)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointBalance {
    pub user_id: i64,
    pub balance: i64,
    pub updated_at: i64,
}

/// Ledger entry kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PointTxKind {
    Earn,
    Spend,
    Expire,
    Adjust,
}

/// Immutable ledger fact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointTransaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: PointTxKind,
    pub amount_signed: i64,
    pub expires_at: Option<i64>,
    pub order_id: Option<i64>,
    pub memo: Option<String>,
    pub created_at: i64,
}

/// Balance + recent movements (API view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsView {
    pub balance: i64,
    pub transactions: Vec<PointTransaction>,
}
