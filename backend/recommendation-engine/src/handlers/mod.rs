pub mod events;
pub mod recommendations;
pub mod training;

use actix_web::{web, HttpResponse};

pub use events::{get_interactions, get_products, save_interaction, seed_product};
pub use recommendations::{get_category_recommendations, get_interaction_recommendations};
pub use training::trigger_training;

/// Mount every `/ai` route plus health and metrics.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(crate::metrics::metrics_handler))
        .service(
            web::scope("/ai")
                .service(save_interaction)
                .service(get_interactions)
                .service(seed_product)
                .service(get_products)
                .service(get_interaction_recommendations)
                .service(get_category_recommendations)
                .service(trigger_training),
        );
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "recommendation-engine"
    }))
}
