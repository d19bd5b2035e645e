use serde_json::{Map, Value};
use uuid::Uuid;

/// The slice of a user record this service reads: the registered device
/// tokens and the per-category notification preference flags. Everything
/// else on the user document belongs to the surrounding application.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub push_tokens: Vec<String>,
    pub notification_settings: Map<String, Value>,
}

impl UserRecord {
    /// Whether this user has the given notification category enabled.
    /// An absent flag means enabled; only an explicit `false` opts out.
    #[must_use]
    pub fn allows(&self, category: &str) -> bool {
        self.notification_settings.get(category).and_then(Value::as_bool).unwrap_or(true)
    }
}
