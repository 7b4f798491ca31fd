use crate::error::{AppError, Result};
use crate::models::{MessageResponse, RecordInteractionRequest, SeedProductRequest};
use crate::services::RecommendationGateway;
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

#[post("/interactions")]
pub async fn save_interaction(
    gateway: web::Data<RecommendationGateway>,
    body: web::Json<RecordInteractionRequest>,
) -> Result<HttpResponse> {
    gateway.record_interaction(&body).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Interaction saved successfully".to_string(),
    }))
}

#[get("/interactions")]
pub async fn get_interactions(gateway: web::Data<RecommendationGateway>) -> Result<HttpResponse> {
    let interactions = gateway.list_interactions().await?;
    if interactions.is_empty() {
        return Err(AppError::NotFound("No interactions found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "interactions": interactions })))
}

#[post("/products")]
pub async fn seed_product(
    gateway: web::Data<RecommendationGateway>,
    body: web::Json<SeedProductRequest>,
) -> Result<HttpResponse> {
    gateway.record_catalogue_entry(&body).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Product saved successfully".to_string(),
    }))
}

#[get("/products")]
pub async fn get_products(gateway: web::Data<RecommendationGateway>) -> Result<HttpResponse> {
    let products = gateway.list_catalogue().await?;
    if products.is_empty() {
        return Err(AppError::NotFound("No products found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "products": products })))
}
