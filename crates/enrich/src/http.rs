//! HTTP-backed classifier adapter.
//!
//! Posts `{"text": ...}` to a classification endpoint and reads a label or
//! annotation back. Every failure path returns `None` — the adapter absorbs
//! transport errors, bad statuses, and unparseable bodies itself so callers
//! never see them.

use async_trait::async_trait;
use charloom_core::enrichment::Classifier;
use std::time::Duration;
use tracing::debug;

/// A best-effort HTTP classifier.
pub struct HttpClassifier {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpClassifier {
    /// Create a classifier with its own short timeout. Adapter
    /// unavailability must stall the turn by at most this long.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    /// Pull a usable annotation out of a response body. Accepts the common
    /// shapes classification services return: `{"label": ...}`,
    /// `{"annotation": ...}`, or a bare JSON string.
    fn extract_label(body: &serde_json::Value) -> Option<String> {
        let candidate = body
            .get("label")
            .or_else(|| body.get("annotation"))
            .or_else(|| body.get("result"))
            .and_then(|v| v.as_str())
            .or_else(|| body.as_str());

        candidate
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str) -> Option<String> {
        let response = match self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(adapter = %self.name, error = %e, "Adapter request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(
                adapter = %self.name,
                status = response.status().as_u16(),
                "Adapter returned non-success status"
            );
            return None;
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(adapter = %self.name, error = %e, "Adapter returned malformed body");
                return None;
            }
        };

        Self::extract_label(&body)
    }
}
