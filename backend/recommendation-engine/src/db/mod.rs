//! Event store for the recommendation trainers.
//!
//! Two append-only collections: catalogue entries and user-product
//! interactions. Writes fail loud with `StorageUnavailable`; there is no
//! internal retry. Listing returns the full log most-recent-first, which is
//! all the trainers need.

mod memory;
mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

use crate::error::Result;
use crate::models::{CatalogueEntry, InteractionEvent};
use async_trait::async_trait;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a catalogue entry stamped with the current time
    async fn record_catalogue_entry(
        &self,
        product_id: &str,
        product_name: &str,
        category: &str,
    ) -> Result<CatalogueEntry>;

    /// Append an interaction event stamped with the current time
    async fn record_interaction(
        &self,
        user_id: &str,
        product_id: &str,
        category: &str,
    ) -> Result<InteractionEvent>;

    /// All catalogue entries, most recent first
    async fn list_catalogue(&self) -> Result<Vec<CatalogueEntry>>;

    /// All interaction events, most recent first
    async fn list_interactions(&self) -> Result<Vec<InteractionEvent>>;

    /// Catalogue entries whose product id is in `product_ids`, most recent first
    async fn find_catalogue_by_ids(&self, product_ids: &[String]) -> Result<Vec<CatalogueEntry>>;
}
