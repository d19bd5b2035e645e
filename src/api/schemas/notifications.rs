use crate::domain::notification::{DeliveryTicket, DispatchResult, NotificationRequest};
use crate::domain::token::is_valid_token;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Body shared by the send and broadcast endpoints.
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl SendNotificationRequest {
    /// Validates the request shape before any gateway call is made.
    ///
    /// # Errors
    /// Returns a caller-facing message if the token list is empty or the
    /// title or body is missing.
    pub fn validate(&self) -> Result<(), String> {
        if self.tokens.is_empty() {
            return Err("A non-empty tokens array is required".into());
        }
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err("Both title and body are required".into());
        }
        Ok(())
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, NotificationRequest) {
        let request =
            NotificationRequest { title: self.title, body: self.body, data: self.data, options: self.options };
        (self.tokens, request)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub success: bool,
    pub message: String,
    pub sent: usize,
    pub errors: usize,
    pub invalid_tokens: Vec<String>,
    pub results: Vec<DeliveryTicket>,
}

impl DispatchResponse {
    /// Builds the relay response body; `ok_message` is the phrasing used
    /// when the dispatch reported success.
    #[must_use]
    pub fn from_result(result: DispatchResult, ok_message: &str) -> Self {
        let message = if result.success {
            ok_message.to_owned()
        } else {
            result.error.clone().unwrap_or_else(|| "Dispatch failed".to_owned())
        };
        Self {
            success: result.success,
            message,
            sent: result.sent,
            errors: result.errors,
            invalid_tokens: result.invalid_tokens,
            results: result.tickets,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTokenRequest {
    pub user_id: Uuid,
    pub token: String,
}

impl RegisterTokenRequest {
    /// Validates the token registration payload.
    ///
    /// # Errors
    /// Returns an error if the token does not look like an Expo push token.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_token(self.token.trim()) {
            return Err("Token is not a valid Expo push token".into());
        }
        Ok(())
    }
}
