#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, Once};
use std::time::Duration;
use steeple_push::adapters::push::{GatewayError, PushGateway};
use steeple_push::api::AppState;
use steeple_push::domain::devotional::Devotional;
use steeple_push::domain::notification::{DEVICE_NOT_REGISTERED, DeliveryTicket};
use steeple_push::domain::user::UserRecord;
use steeple_push::error::AppError;
use steeple_push::services::store::{DevotionalStore, UserStore};
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("steeple_push=debug".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

#[must_use]
pub fn token(i: usize) -> String {
    format!("ExponentPushToken[device-{i}]")
}

#[must_use]
pub fn ok_tickets(n: usize) -> Vec<DeliveryTicket> {
    (0..n).map(|i| DeliveryTicket::ok(Some(format!("ticket-{i}")))).collect()
}

/// Gateway double that replays a script of per-batch outcomes. When the
/// script runs out it acknowledges every message with an ok ticket. All
/// submitted batches are recorded for inspection.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<Vec<DeliveryTicket>, GatewayError>>>,
    pub batches: Mutex<Vec<Vec<Value>>>,
}

impl ScriptedGateway {
    pub fn push_outcome(&self, outcome: Result<Vec<DeliveryTicket>, GatewayError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn submitted_recipients(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .filter_map(|message| message["to"].as_str().map(str::to_owned))
            .collect()
    }
}

#[async_trait]
impl PushGateway for ScriptedGateway {
    async fn submit(&self, messages: &[Value]) -> Result<Vec<DeliveryTicket>, GatewayError> {
        self.batches.lock().unwrap().push(messages.to_vec());
        match self.script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(ok_tickets(messages.len())),
        }
    }
}

/// Gateway double that reports `DeviceNotRegistered` for a chosen set of
/// tokens and delivers everything else.
#[derive(Debug, Default)]
pub struct FlaggingGateway {
    pub dead_tokens: HashSet<String>,
    pub batches: Mutex<Vec<Vec<Value>>>,
}

impl FlaggingGateway {
    #[must_use]
    pub fn with_dead_tokens(dead: &[String]) -> Self {
        Self { dead_tokens: dead.iter().cloned().collect(), batches: Mutex::new(Vec::new()) }
    }

    pub fn submitted_recipients(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .filter_map(|message| message["to"].as_str().map(str::to_owned))
            .collect()
    }
}

#[async_trait]
impl PushGateway for FlaggingGateway {
    async fn submit(&self, messages: &[Value]) -> Result<Vec<DeliveryTicket>, GatewayError> {
        self.batches.lock().unwrap().push(messages.to_vec());
        Ok(messages
            .iter()
            .map(|message| {
                let to = message["to"].as_str().unwrap_or_default();
                if self.dead_tokens.contains(to) {
                    DeliveryTicket::error(DEVICE_NOT_REGISTERED, "device is not registered")
                } else {
                    DeliveryTicket::ok(None)
                }
            })
            .collect())
    }
}

/// In-memory user store with per-user failure injection.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
    fail_for: Mutex<HashSet<Uuid>>,
    page_calls: Mutex<usize>,
}

impl InMemoryUserStore {
    pub fn insert_user(&self, id: Uuid, tokens: &[String], settings: Map<String, Value>) {
        self.users.lock().unwrap().push(UserRecord {
            id,
            push_tokens: tokens.to_vec(),
            notification_settings: settings,
        });
    }

    pub fn fail_updates_for(&self, id: Uuid) {
        self.fail_for.lock().unwrap().insert(id);
    }

    pub fn tokens_of(&self, id: Uuid) -> Vec<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .map(|user| user.push_tokens.clone())
            .unwrap_or_default()
    }

    pub fn page_calls(&self) -> usize {
        *self.page_calls.lock().unwrap()
    }

    fn check_failure(&self, id: Uuid) -> steeple_push::error::Result<()> {
        if self.fail_for.lock().unwrap().contains(&id) {
            return Err(AppError::Internal);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn fetch_page(&self, cursor: Option<Uuid>, limit: i64) -> steeple_push::error::Result<Vec<UserRecord>> {
        *self.page_calls.lock().unwrap() += 1;
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by_key(|user| user.id);
        Ok(users
            .into_iter()
            .filter(|user| cursor.is_none_or(|c| user.id > c))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn load_tokens(&self, user_id: Uuid) -> steeple_push::error::Result<Vec<String>> {
        self.check_failure(user_id)?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.push_tokens.clone())
            .ok_or(AppError::NotFound)
    }

    async fn replace_tokens(&self, user_id: Uuid, tokens: &[String]) -> steeple_push::error::Result<()> {
        self.check_failure(user_id)?;
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|user| user.id == user_id).ok_or(AppError::NotFound)?;
        user.push_tokens = tokens.to_vec();
        Ok(())
    }

    async fn add_token(&self, user_id: Uuid, token: &str) -> steeple_push::error::Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|user| user.id == user_id).ok_or(AppError::NotFound)?;
        if !user.push_tokens.iter().any(|existing| existing == token) {
            user.push_tokens.push(token.to_owned());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDevotionalStore {
    devotionals: Mutex<HashMap<String, Devotional>>,
}

impl InMemoryDevotionalStore {
    pub fn publish(&self, devotional: Devotional) {
        self.devotionals.lock().unwrap().insert(devotional.date.clone(), devotional);
    }
}

#[async_trait]
impl DevotionalStore for InMemoryDevotionalStore {
    async fn devotional_for(&self, date: &str) -> steeple_push::error::Result<Option<Devotional>> {
        Ok(self.devotionals.lock().unwrap().get(date).cloned())
    }
}

/// Binds the relay on an ephemeral port and returns its base URL.
pub async fn spawn_app(state: AppState) -> String {
    let router = steeple_push::api::app_router(state, Duration::from_secs(5));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}
