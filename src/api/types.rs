//! Wire types for the plant optimization backend.
//!
//! Decoding is lenient: every payload uses serde defaults so a partial or
//! older backend response still decodes. Sub-predictions keep their raw
//! field map; defaults are substituted later, in [`crate::kpi`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// PREDICTION REQUEST
// =============================================================================

/// Sensor readings sent to `/api/predict-comprehensive`.
///
/// `Default` is the fixed plant snapshot used when the caller supplies no
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub feed_rate_tph: f64,
    pub kiln_outlet_temp_c: f64,
    pub kiln_inlet_temp_c: f64,
    pub preheater_bypass_pct: f64,
    pub mill_load_pct: f64,
    pub separator_speed_rpm: f64,
    pub mill_power_kw: f64,
    pub id_fan_speed_pct: f64,
    pub pa_fan_speed_pct: f64,
    pub stack_temp_c: f64,
    pub af_pct: f64,
    pub tsr_pct: f64,
    pub coal_rate_tph: f64,
    pub biomass_rate_tph: f64,
    pub dp_bagfilter_kpa: f64,
    pub bag_reverse_cycle_s: f64,
    pub esp_load_pct: f64,
    pub blaine: f64,
    pub lsf: f64,
    pub sm: f64,
    pub am: f64,
    pub free_lime: f64,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            feed_rate_tph: 850.0,
            kiln_outlet_temp_c: 1420.0,
            kiln_inlet_temp_c: 850.0,
            preheater_bypass_pct: 8.0,
            mill_load_pct: 82.0,
            separator_speed_rpm: 1850.0,
            mill_power_kw: 4200.0,
            id_fan_speed_pct: 78.0,
            pa_fan_speed_pct: 68.0,
            stack_temp_c: 265.0,
            af_pct: 48.0,
            tsr_pct: 48.0,
            coal_rate_tph: 12.5,
            biomass_rate_tph: 3.5,
            dp_bagfilter_kpa: 2.8,
            bag_reverse_cycle_s: 180.0,
            esp_load_pct: 62.0,
            blaine: 3420.0,
            lsf: 95.5,
            sm: 2.4,
            am: 1.5,
            free_lime: 1.2,
        }
    }
}

// =============================================================================
// HEALTH / STATUS PAYLOADS
// =============================================================================

/// Response of `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub models_ready: bool,
    pub models_count: u32,
    pub models: Vec<String>,
}

/// Response of `GET /api/plant-status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantStatus {
    pub status: String,
    pub summary: Map<String, Value>,
    pub data: Vec<Value>,
}

impl PlantStatus {
    /// Numeric summary metric such as `uptime_pct`.
    #[must_use]
    pub fn summary_metric(&self, key: &str) -> Option<f64> {
        self.summary.get(key).and_then(Value::as_f64)
    }
}

/// One entry of the model roster. The backend sends bare names when it
/// cannot query the model registry and detailed records otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Named(String),
    Detailed {
        model_name: String,
        #[serde(default)]
        status: String,
    },
}

impl ModelEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Detailed { model_name: name, .. } => name,
        }
    }

    /// Bare names carry no status and are reported as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Named(_) => true,
            Self::Detailed { status, .. } => status.eq_ignore_ascii_case("active"),
        }
    }
}

/// Response of `GET /api/models/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsStatus {
    pub models_count: u32,
    pub expected_count: Option<u32>,
    pub models: Vec<ModelEntry>,
    pub all_ready: bool,
    pub note: Option<String>,
    pub error: Option<String>,
}

impl ModelsStatus {
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.models.iter().filter(|m| m.is_active()).count()
    }
}

/// A single ranked feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    #[serde(default)]
    pub importance: f64,
}

/// Response of `GET /api/feature-importance`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureImportance {
    pub model: Option<String>,
    pub top_features: Vec<FeatureWeight>,
}

impl FeatureImportance {
    /// The first `n` features in backend rank order.
    #[must_use]
    pub fn top(&self, n: usize) -> &[FeatureWeight] {
        &self.top_features[..n.min(self.top_features.len())]
    }
}

// =============================================================================
// COMPREHENSIVE PREDICTION
// =============================================================================

/// One model's prediction. The backend schema is open-ended, so the raw
/// field map is kept and read through typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubPrediction(pub Map<String, Value>);

impl SubPrediction {
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn strategy(&self) -> Option<&str> {
        self.text("strategy")
    }

    #[must_use]
    pub fn improvement(&self) -> Option<&str> {
        self.text("improvement")
    }

    #[must_use]
    pub fn confidence(&self) -> Option<f64> {
        self.number("confidence")
    }
}

/// Response of `POST /api/predict-comprehensive`. An explicit `null` in
/// any field decodes the same as an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComprehensivePrediction {
    #[serde(deserialize_with = "null_as_default")]
    pub energy_prediction: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub quality_prediction: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub pm_risk_prediction: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub tsr_optimization: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub maintenance_prediction: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub heat_loss_prediction: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub mill_optimization: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub throughput_forecast: SubPrediction,
    #[serde(deserialize_with = "null_as_default")]
    pub recommendations: Vec<Recommendation>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_savings_per_day: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Recommendation urgency. Anything other than `urgent`/`high` is normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    High,
    Normal,
}

/// An AI-generated action recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub title: Option<String>,
    pub action: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub savings_per_day: Option<f64>,
    pub savings_usd: Option<f64>,
    pub confidence_pct: Option<f64>,
    pub priority: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Recommendation {
    /// Title, falling back to the action text.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .or(self.action.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        match self.priority.as_deref() {
            Some("urgent") => Priority::Urgent,
            Some("high") => Priority::High,
            _ => Priority::Normal,
        }
    }

    /// Upper-cased priority label, `MEDIUM` when absent.
    #[must_use]
    pub fn priority_label(&self) -> String {
        self.priority
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or("medium")
            .to_uppercase()
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// History entry sent to `/api/chat`; timestamps are not part of the wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Fixed generation settings sent with every chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_context: String,
    pub use_chain_of_thought: bool,
}

pub const DEFAULT_SYSTEM_CONTEXT: &str = "You are CementAI Assistant, an expert AI advisor for cement plant \
     optimization. Provide concise, actionable advice with specific numbers.";

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 500,
            system_context: DEFAULT_SYSTEM_CONTEXT.to_owned(),
            use_chain_of_thought: true,
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
    pub system_prompt: SessionConfig,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub reasoning: Option<Vec<String>>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
