use crate::config::DevotionalConfig;
use crate::domain::devotional::date_key;
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::store::{DevotionalStore, UserStore, user_stream};
use crate::services::token_cleanup::{TokenCleanup, TokenOwners};
use futures::TryStreamExt;
use std::sync::Arc;
use time::{OffsetDateTime, Time, UtcOffset};
use tracing::Instrument;

/// Sends the daily devotional push to every subscribed user at a fixed
/// local time, then prunes tokens the gateway reported as unregistered.
#[derive(Debug)]
pub struct DevotionalWorker {
    users: Arc<dyn UserStore>,
    devotionals: Arc<dyn DevotionalStore>,
    dispatcher: Arc<NotificationDispatcher>,
    cleanup: TokenCleanup,
    config: DevotionalConfig,
}

impl DevotionalWorker {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        devotionals: Arc<dyn DevotionalStore>,
        dispatcher: Arc<NotificationDispatcher>,
        cleanup: TokenCleanup,
        config: DevotionalConfig,
    ) -> Self {
        Self { users, devotionals, dispatcher, cleanup, config }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        while !*shutdown.borrow() {
            let delay = delay_until(
                OffsetDateTime::now_utc(),
                self.config.send_hour,
                self.config.send_minute,
                self.config.utc_offset_hours,
            );
            tracing::info!(next_run_in_secs = delay.as_secs(), "Devotional send scheduled");

            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    if let Err(e) = self.run_once()
                        .instrument(tracing::info_span!("devotional_run"))
                        .await
                    {
                        tracing::error!(error = %e, "Devotional run failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("Devotional worker shutting down...");
    }

    /// One scheduled send: load today's devotional, scan the population
    /// page by page collecting tokens from users whose preference flag
    /// allows it, dispatch once globally, then clean up invalid tokens
    /// using the ownership map built during the scan.
    ///
    /// # Errors
    /// Returns an error if the devotional lookup or the user scan fails.
    /// Dispatch and cleanup degrade internally instead of failing the run.
    pub async fn run_once(&self) -> anyhow::Result<()> {
        let offset = UtcOffset::from_hms(self.config.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
        let today = date_key(OffsetDateTime::now_utc().to_offset(offset));

        let Some(devotional) = self.devotionals.devotional_for(&today).await? else {
            tracing::info!(date = %today, "No devotional published today, nothing to send");
            return Ok(());
        };

        let mut tokens: Vec<String> = Vec::new();
        let mut owners: TokenOwners = TokenOwners::new();
        let mut users_scanned = 0usize;

        let stream = user_stream(Arc::clone(&self.users), self.config.page_size);
        futures::pin_mut!(stream);
        while let Some(user) = stream.try_next().await? {
            users_scanned += 1;
            if !user.allows(&self.config.category) {
                continue;
            }
            for token in &user.push_tokens {
                // Last writer wins if two user records share a token.
                owners.insert(token.clone(), user.id);
                tokens.push(token.clone());
            }
        }

        let request = devotional.to_request();
        let result = self.dispatcher.dispatch(&tokens, &request).await;

        let summary = if result.invalid_tokens.is_empty() {
            Default::default()
        } else {
            self.cleanup.cleanup(&result.invalid_tokens, &owners).await
        };

        tracing::info!(
            date = %today,
            users = users_scanned,
            tokens = tokens.len(),
            sent = result.sent,
            errors = result.errors,
            pruned = summary.tokens_removed,
            cleanup_failures = summary.failures,
            "Devotional run complete"
        );
        Ok(())
    }
}

/// Time until the next occurrence of `hour:minute` in the configured fixed
/// UTC offset, measured from `now`.
fn delay_until(now: OffsetDateTime, hour: u8, minute: u8, offset_hours: i8) -> std::time::Duration {
    let offset = UtcOffset::from_hms(offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
    let local = now.to_offset(offset);
    let send_time = Time::from_hms(hour, minute, 0).unwrap_or(Time::MIDNIGHT);

    let mut target = local.replace_time(send_time);
    if target <= local {
        target += time::Duration::days(1);
    }

    std::time::Duration::try_from(target - local).unwrap_or(std::time::Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_delay_until_later_today() {
        let now = datetime!(2026-08-25 06:00 UTC);
        assert_eq!(delay_until(now, 7, 0, 0).as_secs(), 3600);
    }

    #[test]
    fn test_delay_until_rolls_to_tomorrow() {
        let now = datetime!(2026-08-25 08:00 UTC);
        assert_eq!(delay_until(now, 7, 0, 0).as_secs(), 23 * 3600);
    }

    #[test]
    fn test_delay_until_honors_offset() {
        // 06:00 UTC is 08:00 at UTC+2, so the 07:00 local send is tomorrow.
        let now = datetime!(2026-08-25 06:00 UTC);
        assert_eq!(delay_until(now, 7, 0, 2).as_secs(), 23 * 3600);
    }

    #[test]
    fn test_exact_send_time_schedules_next_day() {
        let now = datetime!(2026-08-25 07:00 UTC);
        assert_eq!(delay_until(now, 7, 0, 0).as_secs(), 24 * 3600);
    }
}
