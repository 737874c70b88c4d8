//! HTTP API
//!
//! Thin axum handlers over the domain services. Identity is supplied
//! by an upstream gateway and trusted unconditionally (see
//! [`extract::CurrentUser`]).

pub mod extract;

mod cart;
mod coupons;
mod health;
mod orders;
mod payments;
mod points;

use axum::Router;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(coupons::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(points::router())
}
