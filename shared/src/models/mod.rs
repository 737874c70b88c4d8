//! Data models
//!
//! Shared between store-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); all money amounts are
//! integer won; all timestamps are epoch milliseconds.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod points;

// Re-exports
pub use cart::*;
pub use coupon::*;
pub use order::*;
pub use payment::*;
pub use points::*;
