//! Ingestion/query gateway
//!
//! The single entry point the HTTP layer talks to. Validates request fields,
//! then hands off to the event store (writes) or a recommender (reads) and
//! passes the result straight back. Holds no state of its own.

use crate::db::EventStore;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    CatalogueEntry, CategoryRecommendationQuery, InteractionEvent,
    InteractionRecommendationQuery, RecordInteractionRequest, SeedProductRequest,
};
use crate::services::category::CategoryRecommender;
use crate::services::interaction::InteractionRecommender;
use std::sync::Arc;
use tracing::{error, warn};
use validator::Validate;

#[derive(Clone)]
pub struct RecommendationGateway {
    store: Arc<dyn EventStore>,
    category: Arc<CategoryRecommender>,
    interaction: Arc<InteractionRecommender>,
    default_neighbors: usize,
}

impl RecommendationGateway {
    pub fn new(
        store: Arc<dyn EventStore>,
        category: Arc<CategoryRecommender>,
        interaction: Arc<InteractionRecommender>,
        default_neighbors: usize,
    ) -> Self {
        Self {
            store,
            category,
            interaction,
            default_neighbors,
        }
    }

    pub fn category_recommender(&self) -> &Arc<CategoryRecommender> {
        &self.category
    }

    pub fn interaction_recommender(&self) -> &Arc<InteractionRecommender> {
        &self.interaction
    }

    pub async fn record_interaction(
        &self,
        request: &RecordInteractionRequest,
    ) -> Result<InteractionEvent> {
        require_fields(request)?;

        let result = self
            .store
            .record_interaction(
                field(&request.user_id),
                field(&request.product_id),
                field(&request.category),
            )
            .await;

        metrics::record_event("interaction", result.is_ok());
        if let Err(e) = &result {
            error!(error = %e, "Failed to record interaction");
        }
        result
    }

    pub async fn record_catalogue_entry(
        &self,
        request: &SeedProductRequest,
    ) -> Result<CatalogueEntry> {
        require_fields(request)?;

        let result = self
            .store
            .record_catalogue_entry(
                field(&request.product_id),
                field(&request.product_name),
                field(&request.category),
            )
            .await;

        metrics::record_event("catalogue", result.is_ok());
        if let Err(e) = &result {
            error!(error = %e, "Failed to record catalogue entry");
        }
        result
    }

    pub async fn list_interactions(&self) -> Result<Vec<InteractionEvent>> {
        self.store.list_interactions().await
    }

    pub async fn list_catalogue(&self) -> Result<Vec<CatalogueEntry>> {
        self.store.list_catalogue().await
    }

    /// Products co-viewed with the query product.
    ///
    /// `category` is required for parity with the storefront contract but does
    /// not influence the neighbours.
    pub fn interaction_recommendations(
        &self,
        query: &InteractionRecommendationQuery,
    ) -> Result<Vec<String>> {
        require_fields(query)?;

        let n = query.limit.unwrap_or(self.default_neighbors);
        let product_ids = self.interaction.recommend(field(&query.product_id), n);
        metrics::record_recommendation("interaction", product_ids.len());
        Ok(product_ids)
    }

    /// Products clustered with the query category; empty until the category
    /// model has been trained once.
    pub fn category_recommendations(
        &self,
        query: &CategoryRecommendationQuery,
    ) -> Result<Vec<String>> {
        require_fields(query)?;

        let product_ids = match self.category.recommend(field(&query.category)) {
            Ok(ids) => ids,
            Err(AppError::ModelNotReady(reason)) => {
                warn!(%reason, "Serving empty category recommendations");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        metrics::record_recommendation("category", product_ids.len());
        Ok(product_ids)
    }

    /// Catalogue details for recommended ids.
    pub async fn resolve_products(&self, product_ids: &[String]) -> Result<Vec<CatalogueEntry>> {
        self.store.find_catalogue_by_ids(product_ids).await
    }
}

/// Turn validator field errors into one `ValidationError` naming them all.
fn require_fields<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        AppError::ValidationError(fields)
    })
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}
