//! Remote data gateway over the backend REST API.
//!
//! Thin [`reqwest`] wrapper that attaches the session cookie, speaks
//! JSON both ways, and applies the session-refresh contract: a 401
//! carrying the error code `AUTH_TOKEN_NOT_FOUND` triggers exactly one
//! `POST /auth/refresh` followed by one replay of the original request.
//! There are no other automatic retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;

/// Error code the backend uses when the access-token cookie is missing
/// or expired but the session may still be refreshable.
pub const CODE_AUTH_TOKEN_NOT_FOUND: &str = "AUTH_TOKEN_NOT_FOUND";

const REFRESH_PATH: &str = "/auth/refresh";

/// Errors from the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status with a structured error body.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        /// Server-supplied error code, `UNKNOWN` when the body had none.
        code: String,
        message: String,
    },

    /// A 2xx response body could not be decoded into the expected type.
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    fn is_refreshable(&self) -> bool {
        matches!(
            self,
            GatewayError::Api { status, code, .. }
                if *status == StatusCode::UNAUTHORIZED.as_u16()
                    && code == CODE_AUTH_TOKEN_NOT_FOUND
        )
    }
}

/// Reactions to session-level events, supplied by the embedding UI.
pub trait SessionHooks: Send + Sync {
    /// The session could not be refreshed; the client should navigate
    /// back to the root route (login).
    fn on_session_expired(&self);
}

/// Hooks that do nothing. Default for headless use and tests.
#[derive(Debug, Default)]
pub struct NoopSessionHooks;

impl SessionHooks for NoopSessionHooks {
    fn on_session_expired(&self) {}
}

/// HTTP gateway for a single backend origin.
pub struct ApiGateway {
    client: reqwest::Client,
    base_url: String,
    hooks: Arc<dyn SessionHooks>,
}

impl ApiGateway {
    /// Build a gateway from configuration.
    ///
    /// The cookie store carries the backend's HTTP-only `accessToken`
    /// cookie across requests; the configured timeout applies to every
    /// request including the refresh and replay.
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        Self::with_timeout(&config.api_base_url, config.request_timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hooks: Arc::new(NoopSessionHooks),
        })
    }

    /// Replace the session hooks (UI redirect wiring).
    pub fn with_hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.send(Method::GET, path, None, None).await?;
        self.decode(path, response).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let response = self.send(Method::GET, path, Some(query), None).await?;
        self.decode(path, response).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let body = serde_json::to_value(body).map_err(invalid_body)?;
        let response = self.send(Method::POST, path, None, Some(body)).await?;
        self.decode(path, response).await
    }

    /// POST with no request body, discarding the response body.
    pub async fn post_empty(&self, path: &str) -> Result<(), GatewayError> {
        self.send(Method::POST, path, None, None).await?;
        Ok(())
    }

    /// POST a body, discarding the response body.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), GatewayError> {
        let body = serde_json::to_value(body).map_err(invalid_body)?;
        self.send(Method::POST, path, None, Some(body)).await?;
        Ok(())
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), GatewayError> {
        let body = serde_json::to_value(body).map_err(invalid_body)?;
        self.send(Method::PUT, path, None, Some(body)).await?;
        Ok(())
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<(), GatewayError> {
        let body = serde_json::to_value(body).map_err(invalid_body)?;
        self.send(Method::PATCH, path, None, Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        self.send(Method::DELETE, path, None, None).await?;
        Ok(())
    }

    // ---- internals ----

    /// Execute a request, applying the single refresh-and-retry rule.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .execute(method.clone(), path, query, body.as_ref())
            .await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let err = Self::parse_error(response).await;
        if !err.is_refreshable() {
            return Err(err);
        }

        tracing::debug!(path, "Access token missing, attempting session refresh");
        let refreshed = match self.execute(Method::POST, REFRESH_PATH, None, None).await {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh request failed");
                false
            }
        };
        if !refreshed {
            self.hooks.on_session_expired();
            return Err(err);
        }

        // Replay the original request exactly once.
        let retry = self.execute(method, path, query, body.as_ref()).await?;
        if retry.status().is_success() {
            return Ok(retry);
        }
        let retry_err = Self::parse_error(retry).await;
        tracing::warn!(path, error = %retry_err, "Replay after refresh failed");
        self.hooks.on_session_expired();
        Err(retry_err)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Parse a non-2xx response body into a structured error. Bodies
    /// that are not the backend's `{ error, code }` shape degrade to
    /// the raw text with code `UNKNOWN`.
    async fn parse_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => {
                let code = json
                    .get("code")
                    .and_then(|v| v.as_str())
                    .unwrap_or("UNKNOWN")
                    .to_string();
                let message = json
                    .get("error")
                    .or_else(|| json.get("message"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(&text)
                    .to_string();
                (code, message)
            }
            Err(_) => ("UNKNOWN".to_string(), text),
        };
        GatewayError::Api {
            status,
            code,
            message,
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        response.json::<T>().await.map_err(|source| GatewayError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

fn invalid_body(err: serde_json::Error) -> GatewayError {
    GatewayError::Api {
        status: 0,
        code: "SERIALIZE".into(),
        message: format!("Failed to serialize request body: {err}"),
    }
}
