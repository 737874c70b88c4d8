//! Coupon API 模块

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/coupons", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_mine))
        .route("/claim", post(handler::claim))
}
