//! Checkout
//!
//! Draft-order operations and the payment approval workflow: the one
//! place money, points and coupon effects meet. Every multi-entity
//! mutation here runs inside a single SQLite transaction; any failure
//! rolls the whole attempt back.

pub mod approval;
pub mod draft;
mod error;

pub use approval::{approve, get_order, ready_payment, ApprovalOutcome, ApprovalRequest};
pub use draft::{apply_coupon, apply_points, place_order, PlaceOrderRequest};
pub use error::{CheckoutError, CheckoutResult};

use shared::models::{Order, OrderStatus, PaymentStatus};

/// Shared guard: the order must still be a payable draft.
///
/// Checked by every draft mutation and by the approval workflow; the
/// payment-status check is what makes a duplicate approval call fail
/// cleanly instead of double-applying effects.
pub(crate) fn ensure_awaiting_payment(order: &Order) -> CheckoutResult<()> {
    if order.status == OrderStatus::Cancelled {
        return Err(CheckoutError::OrderAlreadyCancelled(order.id));
    }
    if order.payment_status != PaymentStatus::Ready {
        return Err(CheckoutError::OrderNotReadyForPayment(order.id));
    }
    Ok(())
}
