//! Payment gateway collaborator
//!
//! The provider handshake/approval happens out-of-band (user-facing
//! redirect); the core only consumes the confirmed transaction id and
//! authorized amount. The real client lives outside this service;
//! only the contract and a mock ship here.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Gateway failure surface
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Provider rejected the request: {0}")]
    Rejected(String),
}

/// Handshake result: the provider's transaction id plus where to send
/// the customer to approve the payment
#[derive(Debug, Clone)]
pub struct GatewayHandshake {
    pub tx_id: String,
    pub redirect_url: String,
}

/// Provider-confirmed authorization
#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    pub tx_id: String,
    pub authorized_amount: i64,
}

/// Contract the checkout flow consumes
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Begin the provider handshake for an order amount
    async fn ready(&self, order_no: &str, amount: i64) -> Result<GatewayHandshake, GatewayError>;

    /// Confirm an authorization previously prepared with [`ready`]
    ///
    /// [`ready`]: PaymentGateway::ready
    async fn approve(&self, tx_id: &str) -> Result<GatewayAuthorization, GatewayError>;
}

/// In-memory gateway for development and tests: every handshake is
/// remembered and approves for exactly the prepared amount.
#[derive(Default)]
pub struct MockGateway {
    prepared: Mutex<HashMap<String, i64>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn ready(&self, order_no: &str, amount: i64) -> Result<GatewayHandshake, GatewayError> {
        if amount <= 0 {
            return Err(GatewayError::Rejected("non-positive amount".to_string()));
        }
        let tx_id = format!("mock-{}", uuid::Uuid::new_v4());
        self.prepared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tx_id.clone(), amount);
        Ok(GatewayHandshake {
            redirect_url: format!("https://pay.example.test/approve/{order_no}/{tx_id}"),
            tx_id,
        })
    }

    async fn approve(&self, tx_id: &str) -> Result<GatewayAuthorization, GatewayError> {
        let amount = self
            .prepared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tx_id)
            .copied()
            .ok_or_else(|| GatewayError::Rejected(format!("unknown transaction {tx_id}")))?;
        Ok(GatewayAuthorization {
            tx_id: tx_id.to_string(),
            authorized_amount: amount,
        })
    }
}
