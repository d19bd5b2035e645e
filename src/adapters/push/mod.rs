pub mod expo;

use crate::domain::notification::DeliveryTicket;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A fault affecting a whole batch submission, as opposed to a per-message
/// error ticket. The dispatcher degrades the batch and carries on.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Push gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Push gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Push gateway response was malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait PushGateway: Send + Sync + std::fmt::Debug {
    /// Submits one batch of messages and returns one ticket per message,
    /// in submission order.
    ///
    /// # Errors
    /// Returns `GatewayError` when the batch as a whole could not be
    /// delivered or the response could not be read.
    async fn submit(&self, messages: &[Value]) -> Result<Vec<DeliveryTicket>, GatewayError>;
}
