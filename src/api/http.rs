//! reqwest-backed [`PlantApi`] implementation.
//!
//! Thin HTTP wrapper: one request per trait method, status check, then a
//! pure `parse_body` step kept separate for testability.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    ChatReply, ChatRequest, ComprehensivePrediction, FeatureImportance, HealthStatus, ModelsStatus, PlantStatus,
    SensorReadings,
};
use super::{ApiError, PlantApi};
use crate::config::ClientConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpPlantApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlantApi {
    /// Build a client with timeouts taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to initialize.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        debug!(path, "GET");
        let request = self.http.get(self.url(path)).query(query);
        read_response(request.send().await).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        debug!(path, "POST");
        let request = self.http.post(self.url(path)).json(body);
        read_response(request.send().await).await
    }
}

async fn read_response<T: DeserializeOwned>(
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, ApiError> {
    let response = sent.map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    parse_body(status, &text)
}

#[async_trait::async_trait]
impl PlantApi for HttpPlantApi {
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("/", &[]).await
    }

    async fn plant_status(&self) -> Result<PlantStatus, ApiError> {
        self.get_json("/api/plant-status", &[]).await
    }

    async fn predict_comprehensive(&self, params: &SensorReadings) -> Result<ComprehensivePrediction, ApiError> {
        self.post_json("/api/predict-comprehensive", params).await
    }

    async fn models_status(&self) -> Result<ModelsStatus, ApiError> {
        self.get_json("/api/models/status", &[]).await
    }

    async fn feature_importance(&self, model: &str) -> Result<FeatureImportance, ApiError> {
        self.get_json("/api/feature-importance", &[("model", model)]).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.post_json("/api/chat", request).await
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body: body.to_owned() });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
