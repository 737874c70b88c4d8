//! Points API 模块

mod handler;

use axum::{routing::get, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/points", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::view))
}
