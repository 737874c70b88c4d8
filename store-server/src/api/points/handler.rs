//! Points API Handlers

use axum::{extract::State, Json};
use shared::models::PointsView;

use crate::api::extract::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::points;
use crate::utils::AppResult;

const RECENT_TRANSACTIONS: i64 = 50;

/// GET /api/points - 余额 + 最近积分流水
pub async fn view(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<PointsView>> {
    let balance = points::balance_of(&state.pool, user.id).await?;
    let transactions =
        points::list_transactions(&state.pool, user.id, RECENT_TRANSACTIONS).await?;
    Ok(Json(PointsView {
        balance,
        transactions,
    }))
}
