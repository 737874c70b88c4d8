//! Cart API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::{CartItemCreate, CartItemUpdate, CartView};

use crate::api::extract::CurrentUser;
use crate::cart;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/cart - 获取当前购物车（含持久化合计）
pub async fn view(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartView>> {
    let view = cart::view(&state.pool, user.id).await?;
    Ok(Json(view))
}

/// POST /api/cart/items - 添加购物车条目
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemCreate>,
) -> AppResult<Json<CartView>> {
    let view = cart::add_item(&state.pool, user.id, &payload).await?;
    Ok(Json(view))
}

/// PUT /api/cart/items/:id - 修改数量
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<Json<CartView>> {
    let view = cart::set_quantity(&state.pool, user.id, id, payload.quantity).await?;
    Ok(Json(view))
}

/// DELETE /api/cart/items/:id - 删除条目
pub async fn delete_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<CartView>> {
    let view = cart::remove_item(&state.pool, user.id, id).await?;
    Ok(Json(view))
}
