//! Backend API: the HTTP collaborator behind both controllers.
//!
//! DESIGN
//! ======
//! `PlantApi` is the seam between controller logic and the network. The
//! production implementation is [`http::HttpPlantApi`]; tests swap in a
//! scripted mock. Every method returns `Result` so the HTTP layer stays
//! honest about failures. Controllers decide how to degrade.
//!
//! ERROR HANDLING
//! ==============
//! Callers never see a panic from this module. Non-success status codes
//! map to [`ApiError::Status`], transport failures to [`ApiError::Request`],
//! undecodable bodies to [`ApiError::Parse`].

pub mod http;
pub mod types;

pub use http::HttpPlantApi;
use types::{
    ChatReply, ChatRequest, ComprehensivePrediction, FeatureImportance, HealthStatus, ModelsStatus, PlantStatus,
    SensorReadings,
};

/// Model whose feature ranking is fetched on every refresh.
pub const FEATURE_IMPORTANCE_MODEL: &str = "energy_regressor";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Short stable code for log fields.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_REQUEST",
            Self::Status { .. } => "E_STATUS",
            Self::Parse(_) => "E_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// PLANT API TRAIT
// =============================================================================

/// Async access to the plant optimization backend. Enables mocking in tests.
#[async_trait::async_trait]
pub trait PlantApi: Send + Sync {
    /// `GET /`: liveness and model readiness.
    async fn health(&self) -> Result<HealthStatus, ApiError>;

    /// `GET /api/plant-status`: aggregated 24h plant metrics.
    async fn plant_status(&self) -> Result<PlantStatus, ApiError>;

    /// `POST /api/predict-comprehensive`: all eight model predictions.
    async fn predict_comprehensive(&self, params: &SensorReadings) -> Result<ComprehensivePrediction, ApiError>;

    /// `GET /api/models/status`: deployed model roster.
    async fn models_status(&self) -> Result<ModelsStatus, ApiError>;

    /// `GET /api/feature-importance?model=<model>`.
    async fn feature_importance(&self, model: &str) -> Result<FeatureImportance, ApiError>;

    /// `POST /api/chat`: one assistant turn.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;
}

#[cfg(test)]
pub(crate) mod test_helpers;
