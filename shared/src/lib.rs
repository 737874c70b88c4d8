//! Shared types for the bookstore backend
//!
//! Domain models and utility types shared between store-server and
//! API clients: orders, cart, coupons, points, payments.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
