use crate::adapters::database::DbPool;
use crate::domain::devotional::Devotional;
use crate::error::Result;
use crate::services::store::DevotionalStore;
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub struct DevotionalRepository {
    pool: DbPool,
}

#[derive(Debug, sqlx::FromRow)]
struct DevotionalRow {
    date: String,
    title: String,
    verse: String,
    content: String,
}

impl From<DevotionalRow> for Devotional {
    fn from(row: DevotionalRow) -> Self {
        Self { date: row.date, title: row.title, verse: row.verse, content: row.content }
    }
}

impl DevotionalRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DevotionalStore for DevotionalRepository {
    /// Looks up the devotional published for an exact `YYYY-MM-DD` date.
    /// No row is an expected outcome, not an error.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn devotional_for(&self, date: &str) -> Result<Option<Devotional>> {
        let row = sqlx::query_as::<_, DevotionalRow>(
            "SELECT date, title, verse, content FROM devotionals WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Devotional::from))
    }
}
