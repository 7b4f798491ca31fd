//! Recommendation services
//!
//! - `category`: TF-IDF + k-means category clustering
//! - `interaction`: co-interaction nearest neighbours
//! - `gateway`: validation and delegation for the HTTP layer
//! - `model_slot` / `model_store`: current-model swapping and persistence

pub mod category;
pub mod gateway;
pub mod interaction;
pub mod model_slot;
pub mod model_store;

pub use category::{CategoryModel, CategoryRecommender};
pub use gateway::RecommendationGateway;
pub use interaction::{InteractionModel, InteractionRecommender};
pub use model_slot::ModelSlot;
pub use model_store::ModelStore;
