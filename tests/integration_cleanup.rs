mod common;

use common::InMemoryUserStore;
use serde_json::Map;
use std::sync::Arc;
use steeple_push::services::store::UserStore;
use steeple_push::services::token_cleanup::{TokenCleanup, TokenOwners};
use uuid::Uuid;

fn store_with_user(tokens: &[&str]) -> (Arc<InMemoryUserStore>, Uuid) {
    let store = Arc::new(InMemoryUserStore::default());
    let user_id = Uuid::new_v4();
    let tokens: Vec<String> = tokens.iter().map(|t| (*t).to_owned()).collect();
    store.insert_user(user_id, &tokens, Map::new());
    (store, user_id)
}

#[tokio::test]
async fn test_removes_invalid_tokens_from_owner() {
    common::setup_tracing();
    let (store, u1) = store_with_user(&["X", "Y", "Z"]);
    let cleanup = TokenCleanup::new(Arc::clone(&store) as Arc<dyn UserStore>);

    let invalid = vec!["X".to_string(), "Y".to_string()];
    let owners: TokenOwners = invalid.iter().map(|t| (t.clone(), u1)).collect();
    let summary = cleanup.cleanup(&invalid, &owners).await;

    assert_eq!(store.tokens_of(u1), vec!["Z".to_string()]);
    assert_eq!(summary.users_updated, 1);
    assert_eq!(summary.tokens_removed, 2);
    assert_eq!(summary.failures, 0);
}

#[tokio::test]
async fn test_cleanup_is_idempotent() {
    common::setup_tracing();
    let (store, u1) = store_with_user(&["X", "Z"]);
    let cleanup = TokenCleanup::new(Arc::clone(&store) as Arc<dyn UserStore>);

    let invalid = vec!["X".to_string()];
    let owners: TokenOwners = [("X".to_string(), u1)].into();

    let first = cleanup.cleanup(&invalid, &owners).await;
    assert_eq!(first.tokens_removed, 1);

    let second = cleanup.cleanup(&invalid, &owners).await;
    assert_eq!(second.tokens_removed, 0);
    assert_eq!(second.users_updated, 0);
    assert_eq!(second.failures, 0);
    assert_eq!(store.tokens_of(u1), vec!["Z".to_string()]);
}

#[tokio::test]
async fn test_one_users_failure_does_not_block_another() {
    common::setup_tracing();
    let store = Arc::new(InMemoryUserStore::default());
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    store.insert_user(user_a, &["A1".to_string()], Map::new());
    store.insert_user(user_b, &["B1".to_string(), "B2".to_string()], Map::new());
    store.fail_updates_for(user_a);

    let cleanup = TokenCleanup::new(Arc::clone(&store) as Arc<dyn UserStore>);
    let invalid = vec!["A1".to_string(), "B1".to_string()];
    let owners: TokenOwners = [("A1".to_string(), user_a), ("B1".to_string(), user_b)].into();
    let summary = cleanup.cleanup(&invalid, &owners).await;

    assert_eq!(summary.failures, 1);
    assert_eq!(summary.users_updated, 1);
    // A's set is untouched, B's update still landed.
    assert_eq!(store.tokens_of(user_a), vec!["A1".to_string()]);
    assert_eq!(store.tokens_of(user_b), vec!["B2".to_string()]);
}

#[tokio::test]
async fn test_tokens_without_an_owner_are_skipped() {
    common::setup_tracing();
    let (store, u1) = store_with_user(&["X"]);
    let cleanup = TokenCleanup::new(Arc::clone(&store) as Arc<dyn UserStore>);

    let invalid = vec!["orphan-token".to_string()];
    let summary = cleanup.cleanup(&invalid, &TokenOwners::new()).await;

    assert_eq!(summary, Default::default());
    assert_eq!(store.tokens_of(u1), vec!["X".to_string()]);
}
