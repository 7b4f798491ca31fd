use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // PostgreSQL event log; unset falls back to the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Shared secret expected in the Client-Header-Secret header
    pub client_header_secret: Option<String>,

    // Directory holding the serialized model blobs
    pub model_dir: PathBuf,

    // Category recommender
    pub category_clusters: usize,
    pub category_train_interval_secs: u64,
    pub category_initial_delay_secs: u64,

    // Interaction recommender
    pub interaction_neighbors: usize,
    pub interaction_train_interval_secs: u64,
    pub interaction_initial_delay_secs: u64,

    // Observability
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 5000)?
            .set_default("database_max_connections", 10)?
            .set_default("model_dir", "ai-models")?
            .set_default("category_clusters", 5)?
            .set_default("category_train_interval_secs", 30)?
            .set_default("category_initial_delay_secs", 0)?
            .set_default("interaction_neighbors", 5)?
            .set_default("interaction_train_interval_secs", 35)?
            .set_default("interaction_initial_delay_secs", 0)?
            .set_default("log_level", "info")?
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.category_clusters == 0 {
            return Err(anyhow!("Category clusters must be at least 1"));
        }

        if self.interaction_neighbors == 0 {
            return Err(anyhow!("Interaction neighbors must be at least 1"));
        }

        if self.category_train_interval_secs == 0 || self.interaction_train_interval_secs == 0 {
            return Err(anyhow!("Training intervals must be greater than 0"));
        }

        if matches!(self.database_url.as_deref(), Some("")) {
            return Err(anyhow!("Database URL must not be empty when set"));
        }

        Ok(())
    }

    pub fn category_schedule(&self) -> JobSchedule {
        JobSchedule {
            interval: Duration::from_secs(self.category_train_interval_secs),
            initial_delay: Duration::from_secs(self.category_initial_delay_secs),
        }
    }

    pub fn interaction_schedule(&self) -> JobSchedule {
        JobSchedule {
            interval: Duration::from_secs(self.interaction_train_interval_secs),
            initial_delay: Duration::from_secs(self.interaction_initial_delay_secs),
        }
    }
}

/// Cadence of one periodic training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    pub interval: Duration,
    pub initial_delay: Duration,
}
