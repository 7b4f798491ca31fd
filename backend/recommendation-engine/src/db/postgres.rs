use super::EventStore;
use crate::error::Result;
use crate::models::{CatalogueEntry, InteractionEvent};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// PostgreSQL-backed event store
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the embedded migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(max_connections, "Event store connected and migrated");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn record_catalogue_entry(
        &self,
        product_id: &str,
        product_name: &str,
        category: &str,
    ) -> Result<CatalogueEntry> {
        let entry = sqlx::query_as::<_, CatalogueEntry>(
            r#"
            INSERT INTO product_catalogue (product_id, product_name, category, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING product_id, product_name, category, created_at
            "#,
        )
        .bind(product_id)
        .bind(product_name)
        .bind(category)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn record_interaction(
        &self,
        user_id: &str,
        product_id: &str,
        category: &str,
    ) -> Result<InteractionEvent> {
        let event = sqlx::query_as::<_, InteractionEvent>(
            r#"
            INSERT INTO user_product_interactions (user_id, product_id, category, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, product_id, category, created_at
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(category)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn list_catalogue(&self) -> Result<Vec<CatalogueEntry>> {
        let entries = sqlx::query_as::<_, CatalogueEntry>(
            r#"
            SELECT product_id, product_name, category, created_at
            FROM product_catalogue
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn list_interactions(&self) -> Result<Vec<InteractionEvent>> {
        let events = sqlx::query_as::<_, InteractionEvent>(
            r#"
            SELECT user_id, product_id, category, created_at
            FROM user_product_interactions
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn find_catalogue_by_ids(&self, product_ids: &[String]) -> Result<Vec<CatalogueEntry>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entries = sqlx::query_as::<_, CatalogueEntry>(
            r#"
            SELECT product_id, product_name, category, created_at
            FROM product_catalogue
            WHERE product_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
