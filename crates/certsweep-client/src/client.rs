//! HTTP probe client for the remote certificate lookup service.

use crate::error::Result;
use async_trait::async_trait;
use certsweep_core::{EndpointConfig, ProbeConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// How much of an undecodable body is kept for diagnostics.
const BODY_SNIPPET_CHARS: usize = 500;

/// Raw reply from one lookup request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded (or undecodable) response body
    pub body: RawBody,
}

/// Response body, decoded leniently.
///
/// The service sometimes mislabels the content type, so the body text is
/// parsed as JSON regardless of what the headers declare.
#[derive(Debug, Clone)]
pub enum RawBody {
    /// Body decoded as JSON
    Json(JsonValue),
    /// Body could not be decoded as JSON under any interpretation
    Undecodable {
        /// Declared content type of the reply
        content_type: String,
        /// Leading fragment of the body text
        snippet: String,
        /// Decoder error message
        error: String,
    },
}

/// One network lookup per certificate number.
///
/// Implementations must tolerate being called concurrently; the executor
/// fans a whole batch out through a single shared client.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Look up a single certificate number for the given subject name.
    async fn probe(&self, name: &str, cert_no: &str) -> Result<RawResponse>;
}

/// JSON body of a lookup request.
#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    #[serde(rename = "applySource")]
    apply_source: &'a str,
    #[serde(rename = "certificateNo")]
    certificate_no: &'a str,
    #[serde(rename = "athleteRealName")]
    athlete_real_name: &'a str,
    #[serde(rename = "pageNo")]
    page_no: u32,
}

/// `ProbeClient` backed by reqwest.
///
/// Applies a fixed per-call timeout and a small fixed delay before each
/// request so the remote service is not overwhelmed.
pub struct HttpProbeClient {
    client: Client,
    endpoint: EndpointConfig,
    request_delay: Duration,
}

impl HttpProbeClient {
    /// Create a client for the given endpoint and probing behavior.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn new(endpoint: EndpointConfig, probe: &ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(probe.timeout_secs))
            .user_agent(probe.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            request_delay: Duration::from_millis(probe.request_delay_ms),
        })
    }

    fn operation_query(&self) -> [(&'static str, &str); 5] {
        [
            ("m", self.endpoint.module.as_str()),
            ("c", self.endpoint.controller.as_str()),
            ("a", self.endpoint.action.as_str()),
            ("v", self.endpoint.api_version.as_str()),
            ("os_source", self.endpoint.os_source.as_str()),
        ]
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn probe(&self, name: &str, cert_no: &str) -> Result<RawResponse> {
        // Fixed pacing delay, applied before every request
        tokio::time::sleep(self.request_delay).await;

        let body = LookupRequest {
            apply_source: &self.endpoint.apply_source,
            certificate_no: cert_no,
            athlete_real_name: name,
            page_no: 1,
        };

        let response = self
            .client
            .post(&self.endpoint.base_url)
            .query(&self.operation_query())
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        // Read the text first: the service is known to mislabel the content
        // type, so decoding must not depend on it.
        let text = response.text().await?;

        let body = match serde_json::from_str::<JsonValue>(&text) {
            Ok(value) => RawBody::Json(value),
            Err(err) => {
                tracing::debug!(
                    cert_no = %cert_no,
                    content_type = %content_type,
                    "response body is not decodable JSON"
                );
                RawBody::Undecodable {
                    content_type,
                    snippet: text.chars().take(BODY_SNIPPET_CHARS).collect(),
                    error: err.to_string(),
                }
            }
        };

        Ok(RawResponse { status, body })
    }
}
