//! Marketing ledgers
//!
//! Coupon issuance/redemption and the loyalty-points ledger. Both
//! expose transaction-scoped operations consumed by the checkout
//! workflow, plus pool-scoped entry points for the API.

pub mod coupons;
pub mod points;
