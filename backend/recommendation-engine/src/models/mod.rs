use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A product made available for recommendation by the storefront.
///
/// The authoritative product record lives in the storefront; entries here are
/// an append-only log and may repeat a `product_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogueEntry {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// One user viewing one product. Repeats are kept as a frequency signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InteractionEvent {
    pub user_id: String,
    pub product_id: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /ai/interactions`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecordInteractionRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub product_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
}

/// Body of `POST /ai/products`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SeedProductRequest {
    #[validate(required, length(min = 1))]
    pub product_name: Option<String>,
    #[validate(required, length(min = 1))]
    pub product_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
}

/// Query of `GET /ai/interaction-recommendations`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InteractionRecommendationQuery {
    #[validate(required, length(min = 1))]
    pub product_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// Query of `GET /ai/category-recommendations`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryRecommendationQuery {
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub product_ids: Vec<String>,
    pub products: Vec<CatalogueEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of asking a recommender to retrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainOutcome {
    /// A new model was fitted and swapped in.
    Trained,
    /// Another run for the same recommender was already in flight.
    Skipped,
    /// Nothing to train on; the previous model keeps serving.
    NoData,
}

impl TrainOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainOutcome::Trained => "trained",
            TrainOutcome::Skipped => "skipped",
            TrainOutcome::NoData => "no_data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_fail_validation() {
        let req = RecordInteractionRequest {
            user_id: Some(String::new()),
            product_id: Some("p1".into()),
            category: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("user_id"));
        assert!(fields.contains_key("category"));
        assert!(!fields.contains_key("product_id"));
    }

    #[test]
    fn train_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&TrainOutcome::NoData).unwrap();
        assert_eq!(json, "\"no_data\"");
        assert_eq!(TrainOutcome::Skipped.as_str(), "skipped");
    }
}
