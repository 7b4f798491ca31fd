use crate::error::Result;
use crate::models::{
    CategoryRecommendationQuery, InteractionRecommendationQuery, RecommendationResponse,
};
use crate::services::RecommendationGateway;
use actix_web::{get, web, HttpResponse};

#[get("/interaction-recommendations")]
pub async fn get_interaction_recommendations(
    gateway: web::Data<RecommendationGateway>,
    query: web::Query<InteractionRecommendationQuery>,
) -> Result<HttpResponse> {
    let product_ids = gateway.interaction_recommendations(&query)?;
    let products = gateway.resolve_products(&product_ids).await?;

    Ok(HttpResponse::Ok().json(RecommendationResponse {
        product_ids,
        products,
    }))
}

#[get("/category-recommendations")]
pub async fn get_category_recommendations(
    gateway: web::Data<RecommendationGateway>,
    query: web::Query<CategoryRecommendationQuery>,
) -> Result<HttpResponse> {
    let product_ids = gateway.category_recommendations(&query)?;
    let products = gateway.resolve_products(&product_ids).await?;

    Ok(HttpResponse::Ok().json(RecommendationResponse {
        product_ids,
        products,
    }))
}
