//! Storefront-side client for the recommendation engine
//!
//! Used by the storefront's background tasks when a product is created or
//! viewed. Calls are best-effort: any failure is logged and reported as
//! `false`, never raised, so a recommendation outage cannot break the
//! storefront request that triggered it.

use crate::middleware::CLIENT_SECRET_HEADER;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct InteractionPayload<'a> {
    user_id: &'a str,
    product_id: &'a str,
    category: &'a str,
}

#[derive(Serialize)]
struct CataloguePayload<'a> {
    product_name: &'a str,
    product_id: &'a str,
    category: &'a str,
}

#[derive(Clone)]
pub struct RecommendationClient {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

impl RecommendationClient {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// Report that `user_id` viewed `product_id`.
    pub async fn log_user_interaction(
        &self,
        user_id: &str,
        product_id: &str,
        category: &str,
    ) -> bool {
        let payload = InteractionPayload {
            user_id,
            product_id,
            category,
        };
        self.post("/ai/interactions", &payload, "interaction").await
    }

    /// Register a newly created product with the engine's catalogue.
    pub async fn seed_product_catalogue(
        &self,
        product_name: &str,
        product_id: &str,
        category: &str,
    ) -> bool {
        let payload = CataloguePayload {
            product_name,
            product_id,
            category,
        };
        self.post("/ai/products", &payload, "catalogue entry").await
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T, what: &str) -> bool {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header(CLIENT_SECRET_HEADER, &self.secret)
            .json(payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match response {
            Ok(_) => {
                debug!(url = %url, "Sent {} to recommendation engine", what);
                true
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to send {} to recommendation engine", what);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn interaction_is_posted_with_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/interactions"))
            .and(header(CLIENT_SECRET_HEADER, "s3cret"))
            .and(body_json(serde_json::json!({
                "user_id": "7",
                "product_id": "42",
                "category": "Shoes"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = RecommendationClient::new(server.uri(), "s3cret");
        assert!(client.log_user_interaction("7", "42", "Shoes").await);
    }

    #[tokio::test]
    async fn server_error_is_reported_as_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RecommendationClient::new(format!("{}/", server.uri()), "s3cret");
        assert!(!client.seed_product_catalogue("Runner", "42", "Shoes").await);
    }

    #[tokio::test]
    async fn unreachable_engine_is_reported_as_false() {
        let client = RecommendationClient::new("http://127.0.0.1:1", "s3cret");
        assert!(!client.log_user_interaction("7", "42", "Shoes").await);
    }
}
