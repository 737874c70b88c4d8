//! Order API 模块

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::place))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/coupon", post(handler::apply_coupon))
        .route("/{id}/points", post(handler::apply_points))
        .route("/{id}/payments", get(handler::list_payments))
}
