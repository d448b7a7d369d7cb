//! Best-effort delivery of telemetry payloads to external collectors.

use std::time::Duration;

use axum::body::Bytes;

/// Delivery attempts give up quickly; the caller has already been
/// answered by the time these fire.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget HTTP forwarder.
///
/// Payloads are posted to their collector on a background task. The
/// caller never observes delivery failures; they are logged and
/// dropped.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .expect("Failed to build forwarder HTTP client");
        Self { client }
    }

    /// Forward `body` to `target`, if one is configured.
    ///
    /// Spawns the delivery and returns immediately. The original
    /// `Content-Type` is passed through so non-JSON payloads (CSP
    /// reports) survive intact.
    pub fn forward(
        &self,
        target: Option<&str>,
        kind: &'static str,
        content_type: Option<String>,
        body: Bytes,
    ) {
        let Some(url) = target else {
            tracing::debug!(kind, "No collector configured, dropping payload");
            return;
        };

        let client = self.client.clone();
        let url = url.to_string();

        tokio::spawn(async move {
            let mut request = client.post(&url).body(body);
            if let Some(ct) = content_type {
                request = request.header(reqwest::header::CONTENT_TYPE, ct);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(kind, url, "Payload forwarded");
                }
                Ok(response) => {
                    tracing::warn!(
                        kind,
                        url,
                        status = %response.status(),
                        "Collector rejected payload"
                    );
                }
                Err(e) => {
                    tracing::warn!(kind, url, error = %e, "Collector delivery failed");
                }
            }
        });
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}
