use crate::domain::notification::NotificationRequest;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::macros::format_description;

/// A published daily devotional, keyed by its `YYYY-MM-DD` date string.
#[derive(Debug, Clone)]
pub struct Devotional {
    pub date: String,
    pub title: String,
    pub verse: String,
    pub content: String,
}

impl Devotional {
    /// The notification sent for this devotional: title and verse up front,
    /// with enough data for the app to open the devotional screen.
    #[must_use]
    pub fn to_request(&self) -> NotificationRequest {
        let mut data = Map::new();
        data.insert("type".into(), Value::String("devotional".into()));
        data.insert("date".into(), Value::String(self.date.clone()));
        NotificationRequest {
            title: self.title.clone(),
            body: self.verse.clone(),
            data,
            options: Map::new(),
        }
    }
}

/// Formats the `YYYY-MM-DD` lookup key for a moment in time. The caller is
/// responsible for shifting `moment` into the congregation's time zone
/// before asking for "today".
#[must_use]
pub fn date_key(moment: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]");
    moment.format(&format).unwrap_or_default()
}
