//! Shared-secret check for storefront-to-engine calls
//!
//! Every request must carry `Client-Header-Secret` matching the deployment
//! secret, except:
//! - `GET /ai/interaction-recommendations`
//! - `GET /ai/category-recommendations`
//! - `GET /health`
//!
//! With no secret configured, every protected request is rejected.

use crate::error::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

pub const CLIENT_SECRET_HEADER: &str = "Client-Header-Secret";

const EXEMPT_GET_ROUTES: &[&str] = &[
    "/ai/interaction-recommendations",
    "/ai/category-recommendations",
    "/health",
];

#[derive(Clone)]
pub struct ClientSecretMiddleware {
    secret: Option<Arc<str>>,
}

impl ClientSecretMiddleware {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}

fn is_exempt(method: &Method, path: &str) -> bool {
    *method == Method::GET && EXEMPT_GET_ROUTES.contains(&path)
}

fn check_secret(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    let provided = provided
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Token is missing!".to_string()))?;

    match expected {
        Some(expected) if expected == provided => Ok(()),
        _ => Err(AppError::Authentication("Invalid token!".to_string())),
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientSecretMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientSecretMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientSecretMiddlewareService {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct ClientSecretMiddlewareService<S> {
    service: Rc<S>,
    secret: Option<Arc<str>>,
}

impl<S, B> Service<ServiceRequest> for ClientSecretMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            if !is_exempt(req.method(), req.path()) {
                let provided = req
                    .headers()
                    .get(CLIENT_SECRET_HEADER)
                    .and_then(|h| h.to_str().ok());

                check_secret(secret.as_deref(), provided).map_err(|e| {
                    tracing::warn!(
                        path = %req.path(),
                        reason = %e,
                        "Rejected unauthenticated request"
                    );
                    Error::from(e)
                })?;
            }

            service.call(req).await
        })
    }
}
