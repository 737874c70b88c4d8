//! Cart API 模块

mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::view))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{id}",
            put(handler::update_item).delete(handler::delete_item),
        )
}
