//! Payment API 模块

mod handler;

use axum::{routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/ready", post(handler::ready))
        .route("/approve", post(handler::approve))
}
