/// Proxy configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; collector
/// URLs are optional and forwarding is a no-op while they are unset.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deployment environment label reported by `/api/health`.
    pub environment: String,
    /// External metrics collector, target of `/api/metrics`.
    pub metrics_collector_url: Option<String>,
    /// External log collector, target of `/api/logs`.
    pub log_collector_url: Option<String>,
    /// External CSP report sink, target of `/api/csp-report`.
    pub csp_report_url: Option<String>,
}

impl ProxyConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3001`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `APP_ENV`               | `development`           |
    /// | `METRICS_COLLECTOR_URL` | unset                   |
    /// | `LOG_COLLECTOR_URL`     | unset                   |
    /// | `CSP_REPORT_URL`        | unset                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            environment,
            metrics_collector_url: std::env::var("METRICS_COLLECTOR_URL").ok(),
            log_collector_url: std::env::var("LOG_COLLECTOR_URL").ok(),
            csp_report_url: std::env::var("CSP_REPORT_URL").ok(),
        }
    }
}
