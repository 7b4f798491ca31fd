use crate::error::{AppError, Result};
use crate::services::RecommendationGateway;
use actix_web::{post, web, HttpResponse};
use serde_json::json;

/// Run one training pass on demand. A pass already in flight for the same
/// model reports `skipped`.
#[post("/train/{model}")]
pub async fn trigger_training(
    gateway: web::Data<RecommendationGateway>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let model = path.into_inner();
    let outcome = match model.as_str() {
        "category" => gateway.category_recommender().train().await?,
        "interaction" => gateway.interaction_recommender().train().await?,
        other => return Err(AppError::NotFound(format!("Unknown model: {}", other))),
    };

    Ok(HttpResponse::Ok().json(json!({
        "model": model,
        "outcome": outcome,
    })))
}
