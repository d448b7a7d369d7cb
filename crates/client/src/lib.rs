//! HTTP client layer for the lineops backend API.
//!
//! Structure mirrors the request path: entity services
//! ([`service::EntityService`], built by [`registry::ServiceRegistry`])
//! sit on top of the [`cache::QueryCache`], which sits on top of the
//! [`gateway::ApiGateway`]. The digital-form service additionally
//! implements the `lineops-workflow` persistence seams.

pub mod auth;
pub mod cache;
pub mod config;
pub mod forms;
pub mod gateway;
pub mod notify;
pub mod registry;
pub mod service;

pub use config::ClientConfig;
pub use gateway::{ApiGateway, GatewayError};
pub use registry::ServiceRegistry;
pub use service::ServiceError;
