use crate::error::Result;
use crate::services::store::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Side-table mapping each token to its owning user, built by the caller
/// while scanning the population. If two users somehow carry the same
/// token, the last writer wins; cleanup assumes one owner per token.
pub type TokenOwners = HashMap<String, Uuid>;

#[derive(Clone, Debug)]
struct Metrics {
    removed: Counter<u64>,
    failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("steeple-push");
        Self {
            removed: meter
                .u64_counter("token_cleanup_removed_total")
                .with_description("Total number of invalid push tokens removed from user records")
                .build(),
            failures: meter
                .u64_counter("token_cleanup_failures_total")
                .with_description("Total number of per-user cleanup updates that failed")
                .build(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub users_updated: usize,
    pub tokens_removed: usize,
    pub failures: usize,
}

/// Removes permanently-invalid tokens from their owners' stored token sets.
///
/// Best-effort with no rollback: a token that fails to be removed stays
/// invalid and reappears in the next dispatch result, so the next run
/// retries it naturally.
#[derive(Debug)]
pub struct TokenCleanup {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl TokenCleanup {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    /// Groups `invalid_tokens` by owner and issues one token-set update per
    /// affected user. Updates run concurrently and all of them settle
    /// before returning; one user's failure never cancels another's write.
    #[tracing::instrument(level = "debug", skip(self, invalid_tokens, owners), fields(tokens = invalid_tokens.len()))]
    pub async fn cleanup(&self, invalid_tokens: &[String], owners: &TokenOwners) -> CleanupSummary {
        let mut grouped: HashMap<Uuid, Vec<String>> = HashMap::new();
        for token in invalid_tokens {
            match owners.get(token) {
                Some(user_id) => grouped.entry(*user_id).or_default().push(token.clone()),
                None => tracing::debug!(token = %token, "Invalid token has no known owner, skipping"),
            }
        }

        let updates = grouped.into_iter().map(|(user_id, doomed)| {
            let store = Arc::clone(&self.store);
            async move { (user_id, Self::prune_user(store, user_id, doomed).await) }
        });
        let outcomes = futures::future::join_all(updates).await;

        let mut summary = CleanupSummary::default();
        for (user_id, outcome) in outcomes {
            match outcome {
                Ok(0) => {}
                Ok(removed) => {
                    summary.users_updated += 1;
                    summary.tokens_removed += removed;
                }
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %user_id, "Token cleanup failed for user, will retry on a later run");
                    summary.failures += 1;
                }
            }
        }

        self.metrics.removed.add(summary.tokens_removed as u64, &[]);
        if summary.failures > 0 {
            self.metrics.failures.add(summary.failures as u64, &[]);
        }
        summary
    }

    async fn prune_user(store: Arc<dyn UserStore>, user_id: Uuid, doomed: Vec<String>) -> Result<usize> {
        let current = store.load_tokens(user_id).await?;
        let before = current.len();
        let remaining: Vec<String> = current.into_iter().filter(|token| !doomed.contains(token)).collect();
        let removed = before - remaining.len();

        // Skipping the no-op write keeps a second pass over the same token
        // set from touching the store at all.
        if removed > 0 {
            store.replace_tokens(user_id, &remaining).await?;
        }
        Ok(removed)
    }
}
