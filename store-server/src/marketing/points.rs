//! Points Ledger
//!
//! Spend/earn against the per-user balance projection, appending a
//! signed ledger entry for every movement. The first statement of each
//! operation is a write, so the enclosing transaction holds the SQLite
//! writer lock from before the balance pre-check until commit, so the
//! balance can never be driven negative by an interleaved spend.

use shared::models::PointTxKind;

use crate::checkout::{CheckoutError, CheckoutResult};
use crate::db::repository::{points, Tx};

/// Debit points for an order inside the caller's transaction.
///
/// No-op for `amount <= 0` (zero-amount ledger entries are never
/// written). Fails with `InsufficientBalance` and writes nothing when
/// the balance cannot cover the amount.
pub async fn spend(
    tx: &mut Tx<'_>,
    user_id: i64,
    amount: i64,
    order_id: i64,
    now: i64,
) -> CheckoutResult<()> {
    if amount <= 0 {
        return Ok(());
    }

    points::ensure_balance(tx, user_id, now).await?;
    let balance = points::balance_in_tx(tx, user_id).await?;
    if balance < amount {
        return Err(CheckoutError::InsufficientBalance {
            balance,
            requested: amount,
        });
    }

    points::adjust_balance(tx, user_id, -amount, now).await?;
    points::insert_transaction(
        tx,
        user_id,
        PointTxKind::Spend,
        -amount,
        None,
        Some(order_id),
        None,
        now,
    )
    .await?;

    tracing::debug!(user_id, order_id, amount, "Points spent");
    Ok(())
}

/// Credit points earned by an order inside the caller's transaction.
///
/// A user without a balance row starts from zero. No-op for
/// `amount <= 0`.
pub async fn earn(
    tx: &mut Tx<'_>,
    user_id: i64,
    amount: i64,
    order_id: i64,
    expires_at: Option<i64>,
    now: i64,
) -> CheckoutResult<()> {
    if amount <= 0 {
        return Ok(());
    }

    points::ensure_balance(tx, user_id, now).await?;
    points::adjust_balance(tx, user_id, amount, now).await?;
    points::insert_transaction(
        tx,
        user_id,
        PointTxKind::Earn,
        amount,
        expires_at,
        Some(order_id),
        None,
        now,
    )
    .await?;

    tracing::debug!(user_id, order_id, amount, "Points earned");
    Ok(())
}
