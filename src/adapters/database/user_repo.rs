use crate::adapters::database::DbPool;
use crate::domain::user::UserRecord;
use crate::error::{AppError, Result};
use crate::services::store::UserStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: DbPool,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    push_tokens: Vec<String>,
    notification_settings: sqlx::types::Json<Map<String, Value>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self { id: row.id, push_tokens: row.push_tokens, notification_settings: row.notification_settings.0 }
    }
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Fetches one page of users in stable id order, starting after `cursor`.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, cursor: Option<Uuid>, limit: i64) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, push_tokens, notification_settings
            FROM users
            WHERE ($1::uuid IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn load_tokens(&self, user_id: Uuid) -> Result<Vec<String>> {
        let row: Option<(Vec<String>,)> = sqlx::query_as("SELECT push_tokens FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(tokens,)| tokens).ok_or(AppError::NotFound)
    }

    /// Replaces a user's stored token set. Idempotent: rewriting the same
    /// set is a no-op at the data level.
    #[tracing::instrument(level = "debug", skip(self, tokens))]
    async fn replace_tokens(&self, user_id: Uuid, tokens: &[String]) -> Result<()> {
        let result = sqlx::query("UPDATE users SET push_tokens = $2 WHERE id = $1")
            .bind(user_id)
            .bind(tokens)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Adds a token to a user's set if not already present (set semantics,
    /// insertion order irrelevant).
    #[tracing::instrument(level = "debug", skip(self))]
    async fn add_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET push_tokens = (
                SELECT COALESCE(array_agg(DISTINCT t), '{}')
                FROM unnest(array_append(push_tokens, $2)) AS t
            )
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
