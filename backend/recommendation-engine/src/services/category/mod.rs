//! Category recommender
//!
//! Clusters catalogue products by the text of their category and answers
//! "which products sit in the same cluster as this category?".
//!
//! Training: TF-IDF over category strings, then k-means (fixed seed). The
//! model keeps the vocabulary, the centroids and each product's cluster.
//! Querying embeds the category with the trained vocabulary and returns every
//! product assigned to the nearest centroid. Result order carries no meaning.

mod kmeans;
mod tfidf;

pub use kmeans::KMeans;
pub use tfidf::TfidfVectorizer;

use crate::db::EventStore;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{CatalogueEntry, TrainOutcome};
use crate::services::model_slot::ModelSlot;
use crate::services::model_store::{ModelStore, CATEGORY_MODEL_FILE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_CLUSTERS: usize = 5;
const KMEANS_SEED: u64 = 42;
const MODEL_NAME: &str = "category";

/// Fitted category clustering snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryModel {
    vectorizer: TfidfVectorizer,
    kmeans: KMeans,
    /// product_id -> clusters of its catalogue entries
    assignments: BTreeMap<String, BTreeSet<usize>>,
    trained_at: DateTime<Utc>,
}

impl CategoryModel {
    /// Fit over a catalogue snapshot.
    ///
    /// Entries without a category are dropped. A product seeded more than once
    /// keeps every cluster its entries fall into.
    pub fn fit(entries: &[CatalogueEntry], num_clusters: usize) -> Result<Self> {
        let products: Vec<&CatalogueEntry> = entries
            .iter()
            .filter(|entry| !entry.category.trim().is_empty())
            .collect();

        if products.is_empty() {
            return Err(AppError::TrainingFailure(
                "catalogue has no categorized products".to_string(),
            ));
        }

        let categories: Vec<&str> = products.iter().map(|p| p.category.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&categories);
        let matrix = vectorizer.transform_many(&categories);
        let kmeans = KMeans::fit(&matrix, num_clusters, KMEANS_SEED)?;

        let mut assignments: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for (product, row) in products.iter().zip(matrix.rows()) {
            assignments
                .entry(product.product_id.clone())
                .or_default()
                .insert(kmeans.predict(row));
        }

        Ok(Self {
            vectorizer,
            kmeans,
            assignments,
            trained_at: Utc::now(),
        })
    }

    /// Every product with at least one entry in the cluster nearest to
    /// `category`, each listed once.
    pub fn recommend(&self, category: &str) -> Vec<String> {
        let query = self.vectorizer.transform(category);
        let cluster = self.kmeans.predict(query.view());

        self.assignments
            .iter()
            .filter(|(_, clusters)| clusters.contains(&cluster))
            .map(|(product_id, _)| product_id.clone())
            .collect()
    }

    pub fn n_clusters(&self) -> usize {
        self.kmeans.n_clusters()
    }

    pub fn n_products(&self) -> usize {
        self.assignments.len()
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

pub struct CategoryRecommender {
    store: Arc<dyn EventStore>,
    model_store: Option<ModelStore>,
    num_clusters: usize,
    slot: ModelSlot<CategoryModel>,
}

impl CategoryRecommender {
    pub fn new(
        store: Arc<dyn EventStore>,
        model_store: Option<ModelStore>,
        num_clusters: usize,
    ) -> Self {
        Self {
            store,
            model_store,
            num_clusters,
            slot: ModelSlot::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    /// Restore the last persisted model, if any.
    pub async fn warm_start(&self) -> Result<bool> {
        let Some(model_store) = &self.model_store else {
            return Ok(false);
        };

        match model_store.load::<CategoryModel>(CATEGORY_MODEL_FILE).await? {
            Some(model) => {
                info!(
                    clusters = model.n_clusters(),
                    products = model.n_products(),
                    trained_at = %model.trained_at(),
                    "Restored category model"
                );
                self.slot.replace(model);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Retrain from the current catalogue and swap the new model in.
    ///
    /// On any error the previous model keeps serving.
    pub async fn train(&self) -> Result<TrainOutcome> {
        let Some(_guard) = self.slot.try_begin_training() else {
            warn!("Category training already in progress, skipping");
            metrics::record_training(MODEL_NAME, TrainOutcome::Skipped.as_str(), None);
            return Ok(TrainOutcome::Skipped);
        };

        let start = Instant::now();
        let result = self.fit_and_swap().await;

        match &result {
            Ok(()) => metrics::record_training(
                MODEL_NAME,
                TrainOutcome::Trained.as_str(),
                Some(start.elapsed().as_secs_f64()),
            ),
            Err(_) => metrics::record_training(MODEL_NAME, "failed", None),
        }

        result.map(|_| TrainOutcome::Trained)
    }

    async fn fit_and_swap(&self) -> Result<()> {
        let entries = self.store.list_catalogue().await?;
        let num_clusters = self.num_clusters;

        let model =
            tokio::task::spawn_blocking(move || CategoryModel::fit(&entries, num_clusters))
                .await??;

        if let Some(model_store) = &self.model_store {
            model_store.save(CATEGORY_MODEL_FILE, &model).await?;
        }

        info!(
            clusters = model.n_clusters(),
            products = model.n_products(),
            "Category model trained"
        );
        self.slot.replace(model);
        Ok(())
    }

    /// Products clustered with `category`; `ModelNotReady` before the first
    /// successful training.
    pub fn recommend(&self, category: &str) -> Result<Vec<String>> {
        let model = self.slot.current().ok_or_else(|| {
            AppError::ModelNotReady("category model has not been trained".to_string())
        })?;

        Ok(model.recommend(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryEventStore;
    use crate::models::InteractionEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Catalogue that can be switched off to simulate an outage
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryEventStore,
        down: AtomicBool,
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn record_catalogue_entry(
            &self,
            product_id: &str,
            product_name: &str,
            category: &str,
        ) -> Result<CatalogueEntry> {
            self.inner
                .record_catalogue_entry(product_id, product_name, category)
                .await
        }

        async fn record_interaction(
            &self,
            user_id: &str,
            product_id: &str,
            category: &str,
        ) -> Result<InteractionEvent> {
            self.inner.record_interaction(user_id, product_id, category).await
        }

        async fn list_catalogue(&self) -> Result<Vec<CatalogueEntry>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::StorageUnavailable("catalogue offline".into()));
            }
            self.inner.list_catalogue().await
        }

        async fn list_interactions(&self) -> Result<Vec<InteractionEvent>> {
            self.inner.list_interactions().await
        }

        async fn find_catalogue_by_ids(
            &self,
            product_ids: &[String],
        ) -> Result<Vec<CatalogueEntry>> {
            self.inner.find_catalogue_by_ids(product_ids).await
        }
    }

    fn entry(product_id: &str, category: &str) -> CatalogueEntry {
        CatalogueEntry {
            product_id: product_id.to_string(),
            product_name: format!("product {}", product_id),
            category: category.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn shoes_and_electronics_land_in_separate_clusters() {
        let entries = vec![
            entry("p1", "Shoes"),
            entry("p2", "Shoes"),
            entry("p3", "Electronics"),
        ];
        let model = CategoryModel::fit(&entries, 2).unwrap();

        let mut shoes = model.recommend("Shoes");
        shoes.sort();
        assert_eq!(shoes, vec!["p1", "p2"]);
        assert_eq!(model.recommend("Electronics"), vec!["p3"]);
    }

    #[test]
    fn blank_categories_are_dropped() {
        let entries = vec![entry("p1", "Shoes"), entry("p2", "  ")];
        let model = CategoryModel::fit(&entries, 5).unwrap();
        assert_eq!(model.n_products(), 1);
        assert_eq!(model.n_clusters(), 1);
    }

    #[test]
    fn reseeded_product_appears_under_each_category() {
        // most recent first
        let entries = vec![
            entry("p1", "Electronics"),
            entry("p2", "Shoes"),
            entry("p1", "Shoes"),
        ];
        let model = CategoryModel::fit(&entries, 2).unwrap();

        assert_eq!(model.n_products(), 2);
        assert_eq!(model.recommend("Shoes"), vec!["p1", "p2"]);
        assert_eq!(model.recommend("Electronics"), vec!["p1"]);
    }

    #[test]
    fn repeated_entries_list_a_product_once() {
        let entries = vec![entry("p1", "Shoes"), entry("p1", "Shoes"), entry("p2", "Shoes")];
        let model = CategoryModel::fit(&entries, 5).unwrap();
        assert_eq!(model.recommend("Shoes"), vec!["p1", "p2"]);
    }

    #[test]
    fn empty_catalogue_fails_training() {
        assert!(matches!(
            CategoryModel::fit(&[], 5),
            Err(AppError::TrainingFailure(_))
        ));
    }

    #[tokio::test]
    async fn untrained_recommender_reports_not_ready() {
        let store = Arc::new(InMemoryEventStore::new());
        let recommender = CategoryRecommender::new(store, None, DEFAULT_CLUSTERS);
        assert!(matches!(
            recommender.recommend("Shoes"),
            Err(AppError::ModelNotReady(_))
        ));
    }

    #[tokio::test]
    async fn failed_retrain_keeps_previous_model() {
        let store = Arc::new(FlakyStore::default());
        store
            .inner
            .record_catalogue_entry("p1", "Runner", "Shoes")
            .await
            .unwrap();
        let recommender = CategoryRecommender::new(store.clone(), None, DEFAULT_CLUSTERS);
        assert_eq!(recommender.train().await.unwrap(), TrainOutcome::Trained);

        store.down.store(true, Ordering::SeqCst);
        assert!(matches!(
            recommender.train().await,
            Err(AppError::StorageUnavailable(_))
        ));

        assert_eq!(recommender.recommend("Shoes").unwrap(), vec!["p1"]);
    }

    #[tokio::test]
    async fn persisted_model_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryEventStore::new());
        store.record_catalogue_entry("p1", "Runner", "Shoes").await.unwrap();
        store.record_catalogue_entry("p2", "Phone", "Electronics").await.unwrap();

        let trained = CategoryRecommender::new(
            store.clone(),
            Some(ModelStore::new(dir.path())),
            2,
        );
        trained.train().await.unwrap();

        let restored = CategoryRecommender::new(store, Some(ModelStore::new(dir.path())), 2);
        assert!(restored.warm_start().await.unwrap());
        assert_eq!(restored.recommend("Shoes").unwrap(), vec!["p1"]);
    }
}
