//! Cart Repository
//!
//! One open cart per user (UNIQUE user_id); lines are keyed by
//! (cart_id, ref_type, ref_id, rental_days) so the same book can sit
//! in the cart both as a purchase and as a rental.

use super::{RepoResult, Tx};
use shared::models::{Cart, CartItem, CartItemCreate, ConsumedRef};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

const CART_SELECT: &str = "SELECT id, user_id, item_count, subtotal_amount, rental_amount, total_amount, points_earnable, updated_at FROM cart";

const ITEM_SELECT: &str = "SELECT id, cart_id, user_id, ref_type, ref_id, title, quantity, rental_days, list_price, sale_price, rental_price, points_rate, created_at FROM cart_item";

/// Fetch the user's open cart, creating an empty one on first touch
pub async fn find_or_create(pool: &SqlitePool, user_id: i64, now: i64) -> RepoResult<Cart> {
    sqlx::query(
        "INSERT OR IGNORE INTO cart (id, user_id, item_count, subtotal_amount, rental_amount, total_amount, points_earnable, updated_at) VALUES (?, ?, 0, 0, 0, 0, 0, ?)",
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{CART_SELECT} WHERE user_id = ?");
    let cart: Cart = sqlx::query_as(&sql).bind(user_id).fetch_one(pool).await?;
    Ok(cart)
}

pub async fn list_items(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartItem>> {
    let sql = format!("{ITEM_SELECT} WHERE user_id = ? ORDER BY created_at, id");
    let rows: Vec<CartItem> = sqlx::query_as(&sql).bind(user_id).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn list_items_in_tx(tx: &mut Tx<'_>, user_id: i64) -> RepoResult<Vec<CartItem>> {
    let sql = format!("{ITEM_SELECT} WHERE user_id = ? ORDER BY created_at, id");
    let rows: Vec<CartItem> = sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

/// Load the cart lines selected for checkout
pub async fn find_selectable_items(
    pool: &SqlitePool,
    user_id: i64,
    ids: &[i64],
) -> RepoResult<Vec<CartItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let sql = format!("{ITEM_SELECT} WHERE user_id = ? AND id IN ({placeholders}) ORDER BY created_at, id");
    let mut query = sqlx::query_as::<_, CartItem>(&sql).bind(user_id);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

/// Upsert a line; an existing (ref_type, ref_id, rental_days) line
/// accumulates quantity instead of duplicating.
pub async fn upsert_item(
    tx: &mut Tx<'_>,
    cart_id: i64,
    user_id: i64,
    data: &CartItemCreate,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cart_item (id, cart_id, user_id, ref_type, ref_id, title, quantity, rental_days, list_price, sale_price, rental_price, points_rate, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT (cart_id, ref_type, ref_id, rental_days) DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(snowflake_id())
    .bind(cart_id)
    .bind(user_id)
    .bind(data.ref_type)
    .bind(data.ref_id)
    .bind(&data.title)
    .bind(data.quantity)
    .bind(data.rental_days)
    .bind(data.list_price)
    .bind(data.sale_price)
    .bind(data.rental_price)
    .bind(data.points_rate)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Set a line's quantity; returns false when the line is not the user's
pub async fn update_quantity(
    tx: &mut Tx<'_>,
    user_id: i64,
    item_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE cart_item SET quantity = ? WHERE id = ? AND user_id = ?")
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_item(tx: &mut Tx<'_>, user_id: i64, item_id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM cart_item WHERE id = ? AND user_id = ?")
        .bind(item_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove the lines an order consumed, keyed exactly the way the order
/// snapshotted them at draft time.
pub async fn delete_by_user_and_refs(
    tx: &mut Tx<'_>,
    user_id: i64,
    refs: &[ConsumedRef],
) -> RepoResult<u64> {
    let mut deleted = 0;
    for r in refs {
        let result = sqlx::query(
            "DELETE FROM cart_item WHERE user_id = ? AND ref_type = ? AND ref_id = ? AND rental_days = ?",
        )
        .bind(user_id)
        .bind(r.ref_type)
        .bind(r.ref_id)
        .bind(r.rental_days)
        .execute(&mut **tx)
        .await?;
        deleted += result.rows_affected();
    }
    Ok(deleted)
}

/// Persist recalculated totals onto the cart header
pub async fn save_totals(
    tx: &mut Tx<'_>,
    user_id: i64,
    item_count: i64,
    subtotal_amount: i64,
    rental_amount: i64,
    total_amount: i64,
    points_earnable: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE cart SET item_count = ?, subtotal_amount = ?, rental_amount = ?, total_amount = ?, points_earnable = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(item_count)
    .bind(subtotal_amount)
    .bind(rental_amount)
    .bind(total_amount)
    .bind(points_earnable)
    .bind(now)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
