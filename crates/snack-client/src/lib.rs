//! Clients for the snack prediction and feedback services.
//!
//! The session controller only sees the two seams defined here:
//! - [`Predictor`]: preferences in, ranked recommendations out
//! - [`FeedbackSink`]: record that the user accepted a snack
//!
//! [`HttpSnackClient`] implements both over the service's JSON API
//! (`POST /predict`, `POST /feedback`, `GET /health`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use model::{PreferenceInput, RecommendationList, SnackId};

pub mod config;

pub use config::ClientConfig;

/// Errors that can occur when talking to the snack service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to reach snack service: {0}")]
    ConnectionError(String),

    #[error("Request to snack service timed out")]
    Timeout,

    #[error("{endpoint} returned HTTP {status}")]
    RequestFailed { endpoint: &'static str, status: u16 },

    #[error("Invalid response from snack service: {0}")]
    InvalidResponse(String),

    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    fn from_reqwest(endpoint: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::InvalidResponse(format!("{endpoint}: {err}"))
        } else if let Some(status) = err.status() {
            ClientError::RequestFailed {
                endpoint,
                status: status.as_u16(),
            }
        } else {
            ClientError::ConnectionError(err.to_string())
        }
    }
}

/// Remote function `predict(input) -> RecommendationList`.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Ranked recommendations for `input`, best first.
    async fn predict(&self, input: &PreferenceInput) -> Result<RecommendationList, ClientError>;
}

/// Remote function `record_feedback(id) -> ack`.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record_feedback(&self, id: SnackId) -> Result<FeedbackAck, ClientError>;
}

/// Acknowledgement body of `POST /feedback`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedbackAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    recommendations: RecommendationList,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest {
    snack_id: SnackId,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP/JSON client for the snack service.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpSnackClient {
    http: Client,
    base_url: String,
}

impl HttpSnackClient {
    /// Build a client for the service described by `config`.
    ///
    /// No request is made here; an unreachable service shows up on the
    /// first call.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        info!("Snack service client configured for {}", base_url);
        Ok(Self { http, base_url })
    }

    /// Get the base URL this client sends requests to.
    pub fn service_address(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; true when the service reports `"ok"`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest("/health", e))?;
        let body: HealthResponse = check_status("/health", response)?
            .json()
            .await
            .map_err(|e| ClientError::from_reqwest("/health", e))?;
        Ok(body.status == "ok")
    }
}

fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    error!("{} failed with HTTP {}", endpoint, status);
    Err(ClientError::RequestFailed {
        endpoint,
        status: status.as_u16(),
    })
}

#[async_trait]
impl Predictor for HttpSnackClient {
    async fn predict(&self, input: &PreferenceInput) -> Result<RecommendationList, ClientError> {
        debug!("Requesting predictions for {}", input);
        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(input)
            .send()
            .await
            .map_err(|e| {
                error!("Transport error while predicting: {}", e);
                ClientError::from_reqwest("/predict", e)
            })?;

        let body: PredictResponse = check_status("/predict", response)?
            .json()
            .await
            .map_err(|e| ClientError::from_reqwest("/predict", e))?;

        debug!("Received {} recommendations", body.recommendations.len());
        Ok(body.recommendations)
    }
}

#[async_trait]
impl FeedbackSink for HttpSnackClient {
    async fn record_feedback(&self, id: SnackId) -> Result<FeedbackAck, ClientError> {
        debug!("Recording feedback for snack {}", id);
        let response = self
            .http
            .post(format!("{}/feedback", self.base_url))
            .json(&FeedbackRequest { snack_id: id })
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest("/feedback", e))?;

        let response = check_status("/feedback", response)?;
        // Some deployments answer 204 with no body
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(FeedbackAck::default());
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::from_reqwest("/feedback", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::default().with_base_url("http://localhost:8000/api/");
        let client = HttpSnackClient::new(&config).unwrap();
        assert_eq!(client.service_address(), "http://localhost:8000/api");
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        for url in ["not a url", "ftp://snacks.example.com"] {
            let config = ClientConfig::default().with_base_url(url);
            let err = HttpSnackClient::new(&config).unwrap_err();
            assert!(matches!(err, ClientError::InvalidUrl { .. }), "{url}: {err}");
        }
    }

    #[test]
    fn test_feedback_request_wire_shape() {
        let body = serde_json::to_value(FeedbackRequest { snack_id: 12 }).unwrap();
        assert_eq!(body, serde_json::json!({ "snack_id": 12 }));
    }
}
