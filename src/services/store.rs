use crate::domain::devotional::Devotional;
use crate::domain::user::UserRecord;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Per-user token storage. Partitioned by user id, so callers never need a
/// lock: each user's token set is read and written independently.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// One page of users in stable id order, starting after `cursor`.
    /// A page shorter than `limit` signals the end of the population.
    async fn fetch_page(&self, cursor: Option<Uuid>, limit: i64) -> Result<Vec<UserRecord>>;

    async fn load_tokens(&self, user_id: Uuid) -> Result<Vec<String>>;

    /// Replaces the user's token set wholesale. Idempotent.
    async fn replace_tokens(&self, user_id: Uuid, tokens: &[String]) -> Result<()>;

    /// Adds one token to the user's set if not already present.
    async fn add_token(&self, user_id: Uuid, token: &str) -> Result<()>;
}

#[async_trait]
pub trait DevotionalStore: Send + Sync + std::fmt::Debug {
    /// The devotional published for an exact `YYYY-MM-DD` date, if any.
    async fn devotional_for(&self, date: &str) -> Result<Option<Devotional>>;
}

struct PageState {
    store: Arc<dyn UserStore>,
    cursor: Option<Uuid>,
    buffered: VecDeque<UserRecord>,
    done: bool,
}

/// Lazily walks the whole user population one page at a time, so a caller
/// can scan every user without holding the population in memory at once.
/// Finite; not restartable within a run.
pub fn user_stream(store: Arc<dyn UserStore>, page_size: i64) -> impl Stream<Item = Result<UserRecord>> {
    let state = PageState { store, cursor: None, buffered: VecDeque::new(), done: false };

    futures::stream::try_unfold(state, move |mut state| async move {
        if let Some(user) = state.buffered.pop_front() {
            return Ok(Some((user, state)));
        }
        if state.done {
            return Ok(None);
        }

        let page = state.store.fetch_page(state.cursor, page_size).await?;
        if (page.len() as i64) < page_size {
            state.done = true;
        }
        state.cursor = page.last().map(|user| user.id);
        state.buffered = page.into();

        match state.buffered.pop_front() {
            Some(user) => Ok(Some((user, state))),
            None => Ok(None),
        }
    })
}
