pub mod client_secret;

pub use client_secret::{ClientSecretMiddleware, CLIENT_SECRET_HEADER};
