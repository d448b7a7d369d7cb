use std::sync::Arc;
use std::time::Instant;

use crate::config::ProxyConfig;
use crate::forward::Forwarder;

/// Shared application state for the proxy.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub forwarder: Forwarder,
    /// Process start time, used for the uptime figure in `/api/health`.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            forwarder: Forwarder::new(),
            started_at: Instant::now(),
        }
    }
}
