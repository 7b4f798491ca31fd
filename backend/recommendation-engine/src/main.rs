use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recommendation_engine::{
    CategoryRecommender, ClientSecretMiddleware, Config, EventStore, InMemoryEventStore,
    InteractionRecommender, ModelStore, PgEventStore, RecommendationGateway, TrainingScheduler,
};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},actix_web=info,recommendation_engine=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting recommendation-engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    if config.client_header_secret.is_none() {
        warn!("CLIENT_HEADER_SECRET is not set - every protected route will reject requests");
    }

    // Initialize event store
    let store: Arc<dyn EventStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgEventStore::connect(url, config.database_max_connections)
                .await
                .context("Failed to connect event store")?,
        ),
        None => {
            warn!("DATABASE_URL is not set - using in-memory event store (development only)");
            Arc::new(InMemoryEventStore::new())
        }
    };

    // Initialize recommenders, restoring persisted models when present
    let model_store = ModelStore::new(config.model_dir.clone());
    let category = Arc::new(CategoryRecommender::new(
        store.clone(),
        Some(model_store.clone()),
        config.category_clusters,
    ));
    let interaction = Arc::new(InteractionRecommender::new(
        store.clone(),
        Some(model_store),
    ));

    if let Err(e) = category.warm_start().await {
        warn!(error = %e, "Could not restore category model, waiting for first training run");
    }
    if let Err(e) = interaction.warm_start().await {
        warn!(error = %e, "Could not restore interaction model, waiting for first training run");
    }

    // Start background training
    let scheduler = TrainingScheduler::start(
        category.clone(),
        config.category_schedule(),
        interaction.clone(),
        config.interaction_schedule(),
    );

    let gateway = web::Data::new(RecommendationGateway::new(
        store,
        category,
        interaction,
        config.interaction_neighbors,
    ));
    let secret = config.client_header_secret.clone();

    info!("Starting HTTP server on {}:{}", config.http_host, config.http_port);

    let server_result = HttpServer::new(move || {
        App::new()
            .app_data(gateway.clone())
            .wrap(ClientSecretMiddleware::new(secret.clone()))
            .wrap(TracingLogger::default())
            .configure(recommendation_engine::handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error");

    info!("HTTP server stopped, shutting down training scheduler");
    scheduler.shutdown().await;

    server_result
}
