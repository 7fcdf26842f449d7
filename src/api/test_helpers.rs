//! Scripted [`PlantApi`] used by controller tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use super::types::*;
use super::{ApiError, PlantApi};

/// Each endpoint returns a clone of its scripted value, or HTTP 500 when
/// the slot is `None`.
pub(crate) struct MockPlantApi {
    pub health: Mutex<Option<HealthStatus>>,
    pub plant_status: Mutex<Option<PlantStatus>>,
    pub prediction: Mutex<Option<ComprehensivePrediction>>,
    pub models_status: Mutex<Option<ModelsStatus>>,
    pub feature_importance: Mutex<Option<FeatureImportance>>,
    pub chat_reply: Mutex<Option<ChatReply>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub predict_params: Mutex<Vec<SensorReadings>>,
    pub feature_models: Mutex<Vec<String>>,
    pub predict_calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl MockPlantApi {
    /// Every endpoint succeeds with sample data.
    pub fn healthy() -> Self {
        Self {
            health: Mutex::new(Some(sample_health())),
            plant_status: Mutex::new(Some(PlantStatus { status: "ok".into(), ..PlantStatus::default() })),
            prediction: Mutex::new(Some(sample_prediction())),
            models_status: Mutex::new(Some(ModelsStatus {
                models_count: 8,
                all_ready: true,
                ..ModelsStatus::default()
            })),
            feature_importance: Mutex::new(Some(FeatureImportance {
                model: Some("energy_regressor".into()),
                top_features: vec![FeatureWeight { feature: "id_fan_speed_pct".into(), importance: 0.31 }],
            })),
            chat_reply: Mutex::new(Some(ChatReply { response: "done".into(), reasoning: None })),
            chat_requests: Mutex::new(Vec::new()),
            predict_params: Mutex::new(Vec::new()),
            feature_models: Mutex::new(Vec::new()),
            predict_calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_health(&self, value: Option<HealthStatus>) {
        *self.health.lock().unwrap() = value;
    }

    pub fn set_prediction(&self, value: Option<ComprehensivePrediction>) {
        *self.prediction.lock().unwrap() = value;
    }

    pub fn set_models_status(&self, value: Option<ModelsStatus>) {
        *self.models_status.lock().unwrap() = value;
    }

    pub fn set_chat_reply(&self, value: Option<ChatReply>) {
        *self.chat_reply.lock().unwrap() = value;
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn scripted<T: Clone>(slot: &Mutex<Option<T>>) -> Result<T, ApiError> {
    slot.lock()
        .unwrap()
        .clone()
        .ok_or_else(|| ApiError::Status { status: 500, body: "scripted failure".into() })
}

#[async_trait::async_trait]
impl PlantApi for MockPlantApi {
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.pause().await;
        scripted(&self.health)
    }

    async fn plant_status(&self) -> Result<PlantStatus, ApiError> {
        self.pause().await;
        scripted(&self.plant_status)
    }

    async fn predict_comprehensive(&self, params: &SensorReadings) -> Result<ComprehensivePrediction, ApiError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        self.predict_params.lock().unwrap().push(*params);
        self.pause().await;
        scripted(&self.prediction)
    }

    async fn models_status(&self) -> Result<ModelsStatus, ApiError> {
        self.pause().await;
        scripted(&self.models_status)
    }

    async fn feature_importance(&self, model: &str) -> Result<FeatureImportance, ApiError> {
        self.feature_models.lock().unwrap().push(model.to_owned());
        self.pause().await;
        scripted(&self.feature_importance)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.chat_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        scripted(&self.chat_reply)
    }
}

pub(crate) fn sample_health() -> HealthStatus {
    HealthStatus {
        status: "operational".into(),
        service: "CementAI Optimizer API".into(),
        version: "2.0.0".into(),
        models_ready: true,
        models_count: 8,
        models: Vec::new(),
    }
}

/// A prediction with energy and OEE figures populated and one urgent
/// recommendation. Other sub-predictions are empty so KPI defaults apply.
pub(crate) fn sample_prediction() -> ComprehensivePrediction {
    serde_json::from_value(json!({
        "energy_prediction": {
            "current_kwh_per_t": 96.0,
            "target_kwh_per_t": 87.5,
            "strategy": "Trim ID fan speed",
            "improvement": "-8.9%"
        },
        "maintenance_prediction": { "current_oee_pct": 70.0, "target_oee_pct": 90.0 },
        "recommendations": [
            {
                "title": "URGENT: Equipment Maintenance Required",
                "description": "Critical failure risk detected.",
                "savings_per_day": 50000.0,
                "priority": "urgent"
            },
            { "action": "Increase biomass ratio", "priority": "medium" }
        ],
        "total_savings_per_day": 60000.0,
        "timestamp": "2025-01-01T00:00:00"
    }))
    .unwrap()
}
