//! Coupon Models
//!
//! A coupon is the campaign definition; an issuance is one grant to one
//! user, consumable at most once; a redemption is the permanent record
//! that an issuance was spent on a specific order. The unique
//! constraint on `coupon_redemption.issuance_id` is the at-most-once
//! guarantee.

use serde::{Deserialize, Serialize};

/// Coupon campaign entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: i64,
    pub name: String,
    pub discount_amount: i64,
    pub ends_at: i64,
    pub validity_months: i64,
    pub per_user_limit: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Issuance lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum IssuanceStatus {
    Available,
    Used,
    Expired,
    Revoked,
}

/// One coupon grant to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponIssuance {
    pub id: i64,
    pub coupon_id: i64,
    pub user_id: i64,
    pub issued_at: i64,
    pub expires_at: i64,
    pub status: IssuanceStatus,
}

/// Permanent record of a spent issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponRedemption {
    pub id: i64,
    pub issuance_id: i64,
    pub order_id: i64,
    pub redeemed_amount: i64,
    pub redeemed_at: i64,
}

/// Claim-coupons payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponClaim {
    pub coupon_ids: Vec<i64>,
}
