pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use client::RecommendationClient;
pub use config::Config;
pub use db::{EventStore, InMemoryEventStore, PgEventStore};
pub use error::{AppError, Result};
pub use jobs::TrainingScheduler;
pub use middleware::ClientSecretMiddleware;
pub use services::{
    CategoryRecommender, InteractionRecommender, ModelStore, RecommendationGateway,
};
