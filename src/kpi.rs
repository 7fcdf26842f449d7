//! KPI derivation: the decode boundary for sub-prediction fields.
//!
//! DESIGN
//! ======
//! The backend's sub-prediction schema is open-ended and may omit any
//! field. Every KPI is described by a static [`KpiSpec`] row that names its
//! source sub-prediction, the keys to read and the values to fall back to.
//! Missing and zero readings both take the default, so a half-populated
//! prediction still renders eight cards.

use serde::Serialize;

use crate::api::types::{
    ComprehensivePrediction, ModelEntry, ModelsStatus, Priority, Recommendation, SubPrediction,
};

/// Absolute current/target gap above which a KPI is raised as a crisis alert.
pub const CRISIS_GAP_THRESHOLD: f64 = 15.0;

const DEFAULT_RECOMMENDATION_DESCRIPTION: &str = "AI-driven optimization recommendation";

/// Which way a KPI must move to reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Reduce,
    Increase,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reduce => "reduce",
            Self::Increase => "increase",
        }
    }
}

/// A monitored metric with its optimization target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub unit: String,
    pub current: f64,
    pub target: f64,
    pub model: String,
    pub strategy: String,
    pub improvement: String,
}

impl Kpi {
    #[must_use]
    pub fn gap(&self) -> f64 {
        (self.target - self.current).abs()
    }

    /// Gap rounded to one decimal place, as displayed.
    #[must_use]
    pub fn gap_label(&self) -> String {
        format!("{:.1}", self.gap())
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.target < self.current { Direction::Reduce } else { Direction::Increase }
    }

    #[must_use]
    pub fn is_crisis(&self) -> bool {
        self.gap() > CRISIS_GAP_THRESHOLD
    }
}

// =============================================================================
// KPI TABLE
// =============================================================================

struct KpiSpec {
    label: &'static str,
    unit: &'static str,
    model: &'static str,
    source: fn(&ComprehensivePrediction) -> &SubPrediction,
    current: (&'static str, f64),
    target: (&'static str, f64),
    strategy: (&'static str, &'static str),
    improvement: (&'static str, &'static str),
}

const KPI_SPECS: [KpiSpec; 8] = [
    KpiSpec {
        label: "Electrical Energy",
        unit: "kWh/t",
        model: "energy_regressor",
        source: |p| &p.energy_prediction,
        current: ("current_kwh_per_t", 98.0),
        target: ("target_kwh_per_t", 88.0),
        strategy: ("strategy", "10% reduction through fan optimization"),
        improvement: ("improvement", "-10.2%"),
    },
    KpiSpec {
        label: "Thermal Energy",
        unit: "kcal/kg",
        model: "heat_loss_regressor",
        source: |p| &p.heat_loss_prediction,
        current: ("current_kcal_per_kg", 750.0),
        target: ("target_kcal_per_kg", 710.0),
        strategy: ("strategy", "5.3% improvement via heat recovery"),
        improvement: ("improvement", "-5.3%"),
    },
    KpiSpec {
        label: "CO₂ Emissions",
        unit: "kg/t",
        model: "tsr_optimizer",
        source: |p| &p.tsr_optimization,
        current: ("current_co2_kg_per_t", 865.0),
        target: ("target_co2_kg_per_t", 745.0),
        strategy: ("strategy", "13.9% reduction using AFR"),
        improvement: ("improvement", "-13.9%"),
    },
    KpiSpec {
        label: "Production Rate",
        unit: "TPH",
        model: "throughput_forecaster",
        source: |p| &p.throughput_forecast,
        current: ("current_tph", 410.0),
        target: ("target_tph", 445.0),
        strategy: ("strategy", "8.5% increase via process tuning"),
        improvement: ("improvement", "+8.5%"),
    },
    KpiSpec {
        label: "AFR Usage",
        unit: "%",
        model: "tsr_optimizer",
        source: |p| &p.tsr_optimization,
        current: ("current_afr_pct", 12.0),
        target: ("target_afr_pct", 18.0),
        strategy: ("afr_strategy", "+6 pts through fuel management"),
        improvement: ("afr_improvement", "+50%"),
    },
    KpiSpec {
        label: "Cement Strength",
        unit: "MPa",
        model: "quality_predictor",
        source: |p| &p.quality_prediction,
        current: ("current_strength_mpa", 42.5),
        target: ("target_strength_mpa", 45.2),
        strategy: ("strategy", "6.4% higher via clinker quality"),
        improvement: ("improvement", "+6.4%"),
    },
    KpiSpec {
        label: "OEE",
        unit: "%",
        model: "maintenance_predictor",
        source: |p| &p.maintenance_prediction,
        current: ("current_oee_pct", 72.0),
        target: ("target_oee_pct", 85.0),
        strategy: ("strategy", "+13 pts using predictive maintenance"),
        improvement: ("improvement", "+18%"),
    },
    KpiSpec {
        label: "ESP Efficiency",
        unit: "%",
        model: "pm_risk_classifier",
        source: |p| &p.pm_risk_prediction,
        current: ("current_esp_efficiency", 98.5),
        target: ("target_esp_efficiency", 99.7),
        strategy: ("strategy", "+1.2 pts via ESP optimization"),
        improvement: ("improvement", "+1.2%"),
    },
];

fn number_or(sub: &SubPrediction, (key, default): (&str, f64)) -> f64 {
    match sub.number(key) {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => default,
    }
}

fn text_or(sub: &SubPrediction, (key, default): (&str, &str)) -> String {
    match sub.text(key) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => default.to_owned(),
    }
}

impl KpiSpec {
    fn decode(&self, prediction: &ComprehensivePrediction) -> Kpi {
        let sub = (self.source)(prediction);
        Kpi {
            label: self.label.to_owned(),
            unit: self.unit.to_owned(),
            current: number_or(sub, self.current),
            target: number_or(sub, self.target),
            model: self.model.to_owned(),
            strategy: text_or(sub, self.strategy),
            improvement: text_or(sub, self.improvement),
        }
    }
}

/// The eight dashboard KPIs, in display order.
#[must_use]
pub fn derive_kpis(prediction: &ComprehensivePrediction) -> Vec<Kpi> {
    KPI_SPECS.iter().map(|spec| spec.decode(prediction)).collect()
}

/// KPIs whose gap exceeds [`CRISIS_GAP_THRESHOLD`].
#[must_use]
pub fn crisis_alerts(kpis: &[Kpi]) -> Vec<Kpi> {
    kpis.iter().filter(|k| k.is_crisis()).cloned().collect()
}

// =============================================================================
// MODEL ROSTER
// =============================================================================

/// A deployed prediction model and the KPI it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCard {
    pub name: &'static str,
    pub description: &'static str,
    pub optimizes: &'static str,
}

pub const MODEL_ROSTER: [ModelCard; 8] = [
    ModelCard { name: "energy_regressor", description: "Energy kWh/t Optimization", optimizes: "Electrical Energy" },
    ModelCard { name: "quality_predictor", description: "Cement Quality Predictor", optimizes: "Cement Strength" },
    ModelCard { name: "pm_risk_classifier", description: "PM Emissions Risk", optimizes: "ESP Efficiency" },
    ModelCard { name: "tsr_optimizer", description: "CO2 & AFR Optimizer", optimizes: "CO2 Emissions" },
    ModelCard { name: "maintenance_predictor", description: "Predictive Maintenance", optimizes: "OEE" },
    ModelCard { name: "heat_loss_regressor", description: "Heat Recovery Optimizer", optimizes: "Thermal Energy" },
    ModelCard { name: "mill_optimizer", description: "Mill Efficiency", optimizes: "Production Rate" },
    ModelCard { name: "throughput_forecaster", description: "Throughput Forecast", optimizes: "Production Rate" },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRow {
    pub name: String,
    pub description: String,
    pub optimizes: String,
    pub active: bool,
}

/// Live state of each roster model.
///
/// Nothing is active without a prediction. With one, a model is active
/// unless the registry lists it with a non-active status; a registry that
/// is unavailable or omits the model does not mark it offline.
#[must_use]
pub fn model_roster(prediction: Option<&ComprehensivePrediction>, status: Option<&ModelsStatus>) -> Vec<ModelRow> {
    MODEL_ROSTER
        .iter()
        .map(|card| {
            let listed = status.and_then(|s| s.models.iter().find(|m| m.name() == card.name));
            ModelRow {
                name: card.name.to_owned(),
                description: card.description.to_owned(),
                optimizes: card.optimizes.to_owned(),
                active: prediction.is_some() && listed.is_none_or(ModelEntry::is_active),
            }
        })
        .collect()
}

/// `N/8 Models Active | Predictions: <timestamp> | Auto-Refresh: <secs>s`
#[must_use]
pub fn roster_footer(rows: &[ModelRow], prediction: Option<&ComprehensivePrediction>, refresh_secs: u64) -> String {
    let active = rows.iter().filter(|r| r.active).count();
    let timestamp = prediction.map_or("N/A", |p| p.timestamp.as_str());
    format!("{active}/{} Models Active | Predictions: {timestamp} | Auto-Refresh: {refresh_secs}s", rows.len())
}

// =============================================================================
// RECOMMENDATIONS
// =============================================================================

/// A recommendation with display fallbacks resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSummary {
    pub headline: String,
    pub description: String,
    pub savings_per_day: f64,
    pub priority: Priority,
    pub priority_label: String,
}

/// Resolve display fallbacks. A recommendation without its own savings
/// figure is credited an even share of the total.
#[must_use]
pub fn summarize_recommendations(prediction: &ComprehensivePrediction) -> Vec<RecommendationSummary> {
    let recs = &prediction.recommendations;
    #[allow(clippy::cast_precision_loss)]
    let even_share = if recs.is_empty() { 0.0 } else { prediction.total_savings_per_day / recs.len() as f64 };
    recs.iter().map(|rec| summarize(rec, even_share)).collect()
}

fn summarize(rec: &Recommendation, even_share: f64) -> RecommendationSummary {
    let savings_per_day = match rec.savings_per_day {
        Some(v) if v != 0.0 => v,
        _ if even_share.is_finite() => even_share,
        _ => 0.0,
    };
    RecommendationSummary {
        headline: rec.headline().to_owned(),
        description: rec
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION_DESCRIPTION.to_owned()),
        savings_per_day,
        priority: rec.priority(),
        priority_label: rec.priority_label(),
    }
}

/// Annualized savings for the summary footer.
#[must_use]
pub fn yearly_savings(prediction: &ComprehensivePrediction) -> f64 {
    prediction.total_savings_per_day * 365.0
}

#[cfg(test)]
#[path = "kpi_test.rs"]
mod tests;
