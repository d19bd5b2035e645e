use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error kind the gateway reports when a device has permanently dropped off
/// the push service. This is the only kind that triggers token deletion;
/// rate limiting and malformed-message errors are transient and must not.
pub const DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

/// One notification as requested by a caller, before it is resolved against
/// any device token. Transient, never persisted.
#[derive(Debug, Clone, Default)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub data: Map<String, Value>,
    pub options: Map<String, Value>,
}

/// Builds the gateway message for one token: fixed fields and defaults
/// first, then the caller's options applied on top.
#[must_use]
pub fn build_message(token: &str, request: &NotificationRequest) -> Value {
    let mut message = Map::new();
    message.insert("to".into(), Value::String(token.to_owned()));
    message.insert("sound".into(), Value::String("default".into()));
    message.insert("title".into(), Value::String(request.title.clone()));
    message.insert("body".into(), Value::String(request.body.clone()));
    message.insert("data".into(), Value::Object(request.data.clone()));
    message.insert("priority".into(), Value::String("default".into()));
    message.insert("channelId".into(), Value::String("default".into()));
    apply_overrides(&mut message, &request.options);
    Value::Object(message)
}

/// Applies `overrides` on top of an already-populated message.
///
/// Override precedence is part of the dispatch contract: a caller-supplied
/// `sound`, `priority`, `channelId`, `badge`, or any other key always wins
/// over the defaults installed by [`build_message`].
pub fn apply_overrides(message: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        message.insert(key.clone(), value.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

/// Machine-readable error details attached to an error ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The gateway's per-message delivery outcome. Mirrors the Expo push ticket
/// wire shape so it deserializes straight off the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTicket {
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<TicketDetails>,
}

impl DeliveryTicket {
    #[must_use]
    pub const fn ok(id: Option<String>) -> Self {
        Self { status: TicketStatus::Ok, id, message: None, details: None }
    }

    #[must_use]
    pub fn error(kind: &str, message: &str) -> Self {
        Self {
            status: TicketStatus::Error,
            id: None,
            message: Some(message.to_owned()),
            details: Some(TicketDetails { error: Some(kind.to_owned()) }),
        }
    }

    /// Synthetic ticket standing in for a message whose whole batch failed
    /// at the transport level. Carries no error kind, so it can never be
    /// mistaken for a token-invalidity signal.
    #[must_use]
    pub fn transport_error(message: &str) -> Self {
        Self { status: TicketStatus::Error, id: None, message: Some(message.to_owned()), details: None }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self.status, TicketStatus::Ok)
    }

    /// The machine-readable error kind, if the gateway supplied one.
    #[must_use]
    pub fn error_kind(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.error.as_deref())
    }
}

/// Aggregate outcome of one dispatch call.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub success: bool,
    pub error: Option<String>,
    pub sent: usize,
    pub errors: usize,
    pub invalid_tokens: Vec<String>,
    pub tickets: Vec<DeliveryTicket>,
}

impl DispatchResult {
    /// A dispatch that was rejected before any gateway call was made.
    #[must_use]
    pub fn rejected(reason: &str) -> Self {
        Self {
            success: false,
            error: Some(reason.to_owned()),
            sent: 0,
            errors: 0,
            invalid_tokens: Vec::new(),
            tickets: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_options(options: Map<String, Value>) -> NotificationRequest {
        NotificationRequest {
            title: "Evening Prayer".into(),
            body: "The chapel opens at 7pm".into(),
            data: Map::new(),
            options,
        }
    }

    #[test]
    fn test_message_defaults() {
        let message = build_message("ExpoPushToken[abc]", &request_with_options(Map::new()));
        assert_eq!(message["to"], json!("ExpoPushToken[abc]"));
        assert_eq!(message["sound"], json!("default"));
        assert_eq!(message["priority"], json!("default"));
        assert_eq!(message["channelId"], json!("default"));
        assert!(message.get("badge").is_none());
    }

    #[test]
    fn test_options_override_defaults() {
        let mut options = Map::new();
        options.insert("sound".into(), json!(null));
        options.insert("priority".into(), json!("high"));
        options.insert("badge".into(), json!(3));
        let message = build_message("ExpoPushToken[abc]", &request_with_options(options));
        assert_eq!(message["sound"], json!(null));
        assert_eq!(message["priority"], json!("high"));
        assert_eq!(message["badge"], json!(3));
        // Untouched defaults survive.
        assert_eq!(message["channelId"], json!("default"));
    }

    #[test]
    fn test_ticket_wire_shape_round_trip() {
        let ticket: DeliveryTicket = serde_json::from_value(json!({
            "status": "error",
            "message": "device gone",
            "details": { "error": "DeviceNotRegistered" }
        }))
        .expect("ticket should deserialize");
        assert_eq!(ticket.status, TicketStatus::Error);
        assert_eq!(ticket.error_kind(), Some(DEVICE_NOT_REGISTERED));
    }

    #[test]
    fn test_transport_ticket_has_no_error_kind() {
        let ticket = DeliveryTicket::transport_error("connection reset");
        assert_eq!(ticket.status, TicketStatus::Error);
        assert_eq!(ticket.error_kind(), None);
    }
}
