//! Interaction recommender
//!
//! Item-based nearest neighbours over co-interaction patterns.
//!
//! Algorithm:
//! 1. Count interaction events per (product, user) pair; repeat views add up
//! 2. Each product row is its vector of per-user counts
//! 3. For a query product, rank every other product by cosine distance
//!
//! Products and users are indexed in sorted order, and equal distances fall
//! back to row order, so a given model always answers the same way.
//!
//! The matrix is dense in memory and in the persisted blob, so size grows
//! with products × users; a sparse layout is needed before large catalogues.

use crate::db::EventStore;
use crate::error::Result;
use crate::metrics;
use crate::models::{InteractionEvent, TrainOutcome};
use crate::services::model_slot::ModelSlot;
use crate::services::model_store::{ModelStore, INTERACTION_MODEL_FILE};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_NEIGHBORS: usize = 5;
const MODEL_NAME: &str = "interaction";

/// Fitted product × user interaction snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionModel {
    /// Row labels, sorted
    products: Vec<String>,
    /// Column labels, sorted
    users: Vec<String>,
    /// Interaction counts, one row per product
    matrix: Array2<f64>,
    /// L2 norm of each product row
    norms: Array1<f64>,
    trained_at: DateTime<Utc>,
}

impl InteractionModel {
    /// Build the count matrix; `None` for an empty event log.
    pub fn fit(events: &[InteractionEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let mut products: Vec<String> = events.iter().map(|e| e.product_id.clone()).collect();
        products.sort();
        products.dedup();
        let mut users: Vec<String> = events.iter().map(|e| e.user_id.clone()).collect();
        users.sort();
        users.dedup();

        let product_index: BTreeMap<&str, usize> = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();
        let user_index: BTreeMap<&str, usize> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), i))
            .collect();

        let mut matrix = Array2::<f64>::zeros((products.len(), users.len()));
        for event in events {
            let row = product_index[event.product_id.as_str()];
            let col = user_index[event.user_id.as_str()];
            matrix[[row, col]] += 1.0;
        }

        let norms = matrix
            .axis_iter(Axis(0))
            .map(|row| row.dot(&row).sqrt())
            .collect();

        Some(Self {
            products,
            users,
            matrix,
            norms,
            trained_at: Utc::now(),
        })
    }

    pub fn n_products(&self) -> usize {
        self.products.len()
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.position(product_id).is_some()
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.products
            .binary_search_by(|p| p.as_str().cmp(product_id))
            .ok()
    }

    /// Up to `n` nearest products by cosine distance, never `product_id`
    /// itself. Unknown products yield an empty list.
    pub fn nearest(&self, product_id: &str, n: usize) -> Vec<String> {
        let Some(query) = self.position(product_id) else {
            return Vec::new();
        };

        // never ask for more neighbours than other rows exist
        let width = n.min(self.products.len().saturating_sub(1));
        if width == 0 {
            return Vec::new();
        }

        let query_row = self.matrix.row(query);
        let query_norm = self.norms[query];

        let mut scored: Vec<(f64, usize)> = self
            .matrix
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(i, _)| *i != query)
            .map(|(i, row)| {
                let denom = query_norm * self.norms[i];
                let distance = if denom > 0.0 {
                    1.0 - query_row.dot(&row) / denom
                } else {
                    1.0
                };
                (distance, i)
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        scored
            .into_iter()
            .take(width)
            .map(|(_, i)| self.products[i].clone())
            .collect()
    }
}

pub struct InteractionRecommender {
    store: Arc<dyn EventStore>,
    model_store: Option<ModelStore>,
    slot: ModelSlot<InteractionModel>,
}

impl InteractionRecommender {
    pub fn new(store: Arc<dyn EventStore>, model_store: Option<ModelStore>) -> Self {
        Self {
            store,
            model_store,
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

        match model_store
            .load::<InteractionModel>(INTERACTION_MODEL_FILE)
            .await?
        {
            Some(model) => {
                info!(
                    products = model.n_products(),
                    users = model.n_users(),
                    trained_at = %model.trained_at(),
                    "Restored interaction model"
                );
                self.slot.replace(model);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Retrain from the full interaction log.
    ///
    /// An empty log is a no-op: whatever model was serving keeps serving.
    pub async fn train(&self) -> Result<TrainOutcome> {
        let Some(_guard) = self.slot.try_begin_training() else {
            warn!("Interaction training already in progress, skipping");
            metrics::record_training(MODEL_NAME, TrainOutcome::Skipped.as_str(), None);
            return Ok(TrainOutcome::Skipped);
        };

        let start = Instant::now();
        let result = self.fit_and_swap().await;

        match &result {
            Ok(TrainOutcome::Trained) => metrics::record_training(
                MODEL_NAME,
                TrainOutcome::Trained.as_str(),
                Some(start.elapsed().as_secs_f64()),
            ),
            Ok(outcome) => metrics::record_training(MODEL_NAME, outcome.as_str(), None),
            Err(_) => metrics::record_training(MODEL_NAME, "failed", None),
        }

        result
    }

    async fn fit_and_swap(&self) -> Result<TrainOutcome> {
        let events = self.store.list_interactions().await?;
        let event_count = events.len();

        let fitted = tokio::task::spawn_blocking(move || InteractionModel::fit(&events)).await?;
        let Some(model) = fitted else {
            info!("No interaction data found, keeping current model");
            return Ok(TrainOutcome::NoData);
        };

        if let Some(model_store) = &self.model_store {
            model_store.save(INTERACTION_MODEL_FILE, &model).await?;
        }

        info!(
            events = event_count,
            products = model.n_products(),
            users = model.n_users(),
            "Interaction model trained"
        );
        self.slot.replace(model);
        Ok(TrainOutcome::Trained)
    }

    /// Similar products for `product_id`; empty when untrained or cold-start.
    pub fn recommend(&self, product_id: &str, n: usize) -> Vec<String> {
        let Some(model) = self.slot.current() else {
            debug!(product_id, "Interaction model not trained yet");
            return Vec::new();
        };

        model.nearest(product_id, n)
    }
}
