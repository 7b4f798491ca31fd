use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::Value;
use std::sync::Arc;

use recommendation_engine::middleware::CLIENT_SECRET_HEADER;
use recommendation_engine::{
    handlers, CategoryRecommender, ClientSecretMiddleware, EventStore, InMemoryEventStore,
    InteractionRecommender, RecommendationGateway,
};

const SECRET: &str = "test-secret";

fn build_gateway() -> RecommendationGateway {
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let category = Arc::new(CategoryRecommender::new(store.clone(), None, 2));
    let interaction = Arc::new(InteractionRecommender::new(store.clone(), None));
    RecommendationGateway::new(store, category, interaction, 5)
}

macro_rules! init_app {
    ($gateway:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($gateway))
                .wrap(ClientSecretMiddleware::new(Some(SECRET.to_string())))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! expect_rejected {
    ($app:expr, $req:expr) => {
        match test::try_call_service(&$app, $req).await {
            Ok(resp) => panic!("expected rejection, got {}", resp.status()),
            Err(err) => err,
        }
    };
}

#[actix_web::test]
async fn write_without_secret_is_rejected() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::post()
        .uri("/ai/interactions")
        .set_json(serde_json::json!({"user_id": "u1", "product_id": "p1", "category": "Shoes"}))
        .to_request();
    let err = expect_rejected!(app, req);
    assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn write_with_wrong_secret_is_rejected() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::post()
        .uri("/ai/products")
        .insert_header((CLIENT_SECRET_HEADER, "nope"))
        .set_json(serde_json::json!({
            "product_name": "Runner",
            "product_id": "p1",
            "category": "Shoes"
        }))
        .to_request();
    let err = expect_rejected!(app, req);
    assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Invalid token!");
}

#[actix_web::test]
async fn event_listing_requires_secret() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::get().uri("/ai/interactions").to_request();
    let err = expect_rejected!(app, req);
    assert_eq!(err.to_string(), "Token is missing!");
}

#[actix_web::test]
async fn recommendation_reads_skip_secret() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::get()
        .uri("/ai/category-recommendations?category=Shoes")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["product_ids"], serde_json::json!([]));

    let req = test::TestRequest::get()
        .uri("/ai/interaction-recommendations?product_id=p1&category=Shoes")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn missing_fields_return_400_naming_them() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::post()
        .uri("/ai/interactions")
        .insert_header((CLIENT_SECRET_HEADER, SECRET))
        .set_json(serde_json::json!({"product_id": "p1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "category, user_id required");

    let req = test::TestRequest::get()
        .uri("/ai/interaction-recommendations?product_id=p1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_listings_return_404() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::get()
        .uri("/ai/products")
        .insert_header((CLIENT_SECRET_HEADER, SECRET))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn seed_train_and_query_category_recommendations() {
    let app = init_app!(build_gateway());

    for (id, name, category) in [
        ("p1", "Runner", "Shoes"),
        ("p2", "Trail", "Shoes"),
        ("p3", "Phone", "Electronics"),
    ] {
        let req = test::TestRequest::post()
            .uri("/ai/products")
            .insert_header((CLIENT_SECRET_HEADER, SECRET))
            .set_json(serde_json::json!({
                "product_name": name,
                "product_id": id,
                "category": category
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri("/ai/train/category")
        .insert_header((CLIENT_SECRET_HEADER, SECRET))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "trained");

    let req = test::TestRequest::get()
        .uri("/ai/category-recommendations?category=Shoes")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;

    let mut ids: Vec<String> = serde_json::from_value(body["product_ids"].clone()).unwrap();
    ids.sort();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn unknown_model_cannot_be_trained() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::post()
        .uri("/ai/train/everything")
        .insert_header((CLIENT_SECRET_HEADER, SECRET))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn health_is_public() {
    let app = init_app!(build_gateway());

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
