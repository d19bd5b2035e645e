use crate::adapters::push::{GatewayError, PushGateway};
use crate::config::GatewayConfig;
use crate::domain::notification::DeliveryTicket;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the Expo push API. One call submits one batch and
/// returns the tickets in message order, per the provider contract.
#[derive(Debug)]
pub struct ExpoPushGateway {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExpoPushResponse {
    data: Option<Vec<DeliveryTicket>>,
}

impl ExpoPushGateway {
    /// Builds the gateway client with the configured per-batch timeout.
    ///
    /// # Errors
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { http, url: config.url.clone() })
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    #[tracing::instrument(level = "debug", skip(self, messages), fields(batch_size = messages.len()))]
    async fn submit(&self, messages: &[Value]) -> Result<Vec<DeliveryTicket>, GatewayError> {
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(messages)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let parsed: ExpoPushResponse =
            response.json().await.map_err(|e| GatewayError::Malformed(e.to_string()))?;

        parsed.data.ok_or_else(|| GatewayError::Malformed("response carried no ticket data".into()))
    }
}
