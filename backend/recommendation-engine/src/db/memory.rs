use super::EventStore;
use crate::error::Result;
use crate::models::{CatalogueEntry, InteractionEvent};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

/// Process-local event store used when no database is configured, and in tests.
///
/// Records are kept in insertion order; listing walks them backwards so equal
/// timestamps still come out most-recent-first.
#[derive(Default)]
pub struct InMemoryEventStore {
    catalogue: RwLock<Vec<CatalogueEntry>>,
    interactions: RwLock<Vec<InteractionEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn record_catalogue_entry(
        &self,
        product_id: &str,
        product_name: &str,
        category: &str,
    ) -> Result<CatalogueEntry> {
        let entry = CatalogueEntry {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
        };
        self.catalogue.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn record_interaction(
        &self,
        user_id: &str,
        product_id: &str,
        category: &str,
    ) -> Result<InteractionEvent> {
        let event = InteractionEvent {
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
        };
        self.interactions.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_catalogue(&self) -> Result<Vec<CatalogueEntry>> {
        Ok(self.catalogue.read().await.iter().rev().cloned().collect())
    }

    async fn list_interactions(&self) -> Result<Vec<InteractionEvent>> {
        Ok(self.interactions.read().await.iter().rev().cloned().collect())
    }

    async fn find_catalogue_by_ids(&self, product_ids: &[String]) -> Result<Vec<CatalogueEntry>> {
        Ok(self
            .catalogue
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| product_ids.contains(&entry.product_id))
            .cloned()
            .collect())
    }
}
