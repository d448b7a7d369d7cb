use std::time::Duration;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API origin (default: `http://localhost:8080`).
    pub api_base_url: String,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `API_BASE_URL`         | `http://localhost:8080` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Self {
        let api_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            api_base_url,
            request_timeout_secs,
        }
    }

    /// Base URL pointed at a specific origin (tests, multi-backend setups).
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_secs: 30,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
