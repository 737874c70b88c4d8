//! Cart service
//!
//! Owns the pricing side effect: every mutation recomputes totals via
//! the pricing engine and persists them onto the cart header in the
//! same transaction, so reads never recompute from the lines.

use shared::models::{CartItemCreate, CartView};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::db::repository::{cart as repo, RepoError, RepoResult};
use crate::pricing;

/// Cart header + lines for the API
pub async fn view(pool: &SqlitePool, user_id: i64) -> RepoResult<CartView> {
    let cart = repo::find_or_create(pool, user_id, now_millis()).await?;
    let items = repo::list_items(pool, user_id).await?;
    Ok(CartView { cart, items })
}

/// Add a line (or grow an identical one), then refresh totals
pub async fn add_item(
    pool: &SqlitePool,
    user_id: i64,
    data: &CartItemCreate,
) -> RepoResult<CartView> {
    if data.quantity <= 0 {
        return Err(RepoError::Validation("quantity must be positive".to_string()));
    }
    let now = now_millis();
    let cart = repo::find_or_create(pool, user_id, now).await?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    repo::upsert_item(&mut tx, cart.id, user_id, data, now).await?;
    refresh_totals(&mut tx, user_id, now).await?;
    tx.commit().await.map_err(RepoError::from)?;

    view(pool, user_id).await
}

/// Change a line's quantity, then refresh totals
pub async fn set_quantity(
    pool: &SqlitePool,
    user_id: i64,
    item_id: i64,
    quantity: i64,
) -> RepoResult<CartView> {
    if quantity <= 0 {
        return Err(RepoError::Validation("quantity must be positive".to_string()));
    }
    let now = now_millis();
    repo::find_or_create(pool, user_id, now).await?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    let updated = repo::update_quantity(&mut tx, user_id, item_id, quantity).await?;
    if !updated {
        return Err(RepoError::NotFound(format!("Cart item {item_id}")));
    }
    refresh_totals(&mut tx, user_id, now).await?;
    tx.commit().await.map_err(RepoError::from)?;

    view(pool, user_id).await
}

/// Remove a line, then refresh totals
pub async fn remove_item(pool: &SqlitePool, user_id: i64, item_id: i64) -> RepoResult<CartView> {
    let now = now_millis();
    repo::find_or_create(pool, user_id, now).await?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    let deleted = repo::delete_item(&mut tx, user_id, item_id).await?;
    if !deleted {
        return Err(RepoError::NotFound(format!("Cart item {item_id}")));
    }
    refresh_totals(&mut tx, user_id, now).await?;
    tx.commit().await.map_err(RepoError::from)?;

    view(pool, user_id).await
}

/// Recompute and persist header totals from the current lines
async fn refresh_totals(
    tx: &mut crate::db::repository::Tx<'_>,
    user_id: i64,
    now: i64,
) -> RepoResult<()> {
    let items = repo::list_items_in_tx(tx, user_id).await?;
    let totals = pricing::recalculate(&items);
    repo::save_totals(
        tx,
        user_id,
        totals.item_count,
        totals.subtotal,
        totals.rental,
        totals.total,
        totals.points_earnable,
        now,
    )
    .await
}
