use super::*;
use crate::api::test_helpers::sample_prediction;
use serde_json::json;

fn kpi(current: f64, target: f64) -> Kpi {
    Kpi {
        label: "Electrical Energy".into(),
        unit: "kWh/t".into(),
        current,
        target,
        model: "energy_regressor".into(),
        strategy: String::new(),
        improvement: String::new(),
    }
}

// =============================================================
// Gap / direction
// =============================================================

#[test]
fn gap_is_absolute_and_one_decimal() {
    let k = kpi(98.0, 88.0);
    assert!((k.gap() - 10.0).abs() < f64::EPSILON);
    assert_eq!(k.gap_label(), "10.0");

    let k = kpi(42.5, 45.26);
    assert_eq!(k.gap_label(), "2.8");
}

#[test]
fn direction_reduce_iff_target_below_current() {
    assert_eq!(kpi(98.0, 88.0).direction(), Direction::Reduce);
    assert_eq!(kpi(410.0, 445.0).direction(), Direction::Increase);
    assert_eq!(kpi(50.0, 50.0).direction(), Direction::Increase);
}

#[test]
fn crisis_threshold_is_strict() {
    assert!(!kpi(100.0, 115.0).is_crisis());
    assert!(kpi(100.0, 115.5).is_crisis());
}

// =============================================================
// derive_kpis
// =============================================================

#[test]
fn empty_prediction_yields_all_defaults() {
    let kpis = derive_kpis(&ComprehensivePrediction::default());
    assert_eq!(kpis.len(), 8);
    assert_eq!(kpis[0].label, "Electrical Energy");
    assert!((kpis[0].current - 98.0).abs() < f64::EPSILON);
    assert!((kpis[0].target - 88.0).abs() < f64::EPSILON);
    assert_eq!(kpis[0].improvement, "-10.2%");
    assert_eq!(kpis[4].label, "AFR Usage");
    assert_eq!(kpis[4].strategy, "+6 pts through fuel management");
    assert_eq!(kpis[7].model, "pm_risk_classifier");
}

#[test]
fn backend_values_override_defaults() {
    let kpis = derive_kpis(&sample_prediction());
    let energy = &kpis[0];
    assert!((energy.current - 96.0).abs() < f64::EPSILON);
    assert!((energy.target - 87.5).abs() < f64::EPSILON);
    assert_eq!(energy.strategy, "Trim ID fan speed");
    assert_eq!(energy.improvement, "-8.9%");

    let oee = kpis.iter().find(|k| k.label == "OEE").unwrap();
    assert!((oee.current - 70.0).abs() < f64::EPSILON);
}

#[test]
fn zero_reading_takes_default() {
    let pred: ComprehensivePrediction = serde_json::from_value(json!({
        "throughput_forecast": { "current_tph": 0, "target_tph": 460 }
    }))
    .unwrap();
    let rate = derive_kpis(&pred).into_iter().find(|k| k.label == "Production Rate").unwrap();
    assert!((rate.current - 410.0).abs() < f64::EPSILON);
    assert!((rate.target - 460.0).abs() < f64::EPSILON);
}

#[test]
fn crisis_alerts_filters_large_gaps() {
    let kpis = derive_kpis(&ComprehensivePrediction::default());
    let labels: Vec<String> = crisis_alerts(&kpis).into_iter().map(|k| k.label).collect();
    // Defaults: thermal 40, CO2 120, production 35 exceed 15; the rest do not.
    assert_eq!(labels, vec!["Thermal Energy", "CO₂ Emissions", "Production Rate"]);
}

// =============================================================
// Recommendations
// =============================================================

#[test]
fn recommendation_summary_fallbacks() {
    let summaries = summarize_recommendations(&sample_prediction());
    assert_eq!(summaries.len(), 2);

    assert_eq!(summaries[0].headline, "URGENT: Equipment Maintenance Required");
    assert!((summaries[0].savings_per_day - 50000.0).abs() < f64::EPSILON);
    assert_eq!(summaries[0].priority, Priority::Urgent);

    assert_eq!(summaries[1].headline, "Increase biomass ratio");
    assert_eq!(summaries[1].description, DEFAULT_RECOMMENDATION_DESCRIPTION);
    // 60000 total across two recommendations.
    assert!((summaries[1].savings_per_day - 30000.0).abs() < f64::EPSILON);
    assert_eq!(summaries[1].priority_label, "MEDIUM");
}

#[test]
fn no_recommendations_is_empty() {
    assert!(summarize_recommendations(&ComprehensivePrediction::default()).is_empty());
}

#[test]
fn yearly_savings_multiplies_days() {
    let pred = ComprehensivePrediction { total_savings_per_day: 100.0, ..ComprehensivePrediction::default() };
    assert!((yearly_savings(&pred) - 36500.0).abs() < f64::EPSILON);
}

// =============================================================
// Model roster
// =============================================================

#[test]
fn roster_is_offline_without_prediction() {
    let rows = model_roster(None, None);
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| !r.active));
    assert_eq!(roster_footer(&rows, None, 60), "0/8 Models Active | Predictions: N/A | Auto-Refresh: 60s");
}

#[test]
fn roster_is_live_with_prediction_and_no_registry() {
    let pred = ComprehensivePrediction { timestamp: "2025-01-01T00:00:00".into(), ..sample_prediction() };
    let rows = model_roster(Some(&pred), None);
    assert!(rows.iter().all(|r| r.active));
    assert_eq!(rows[4].name, "maintenance_predictor");
    assert_eq!(rows[4].optimizes, "OEE");
    assert_eq!(
        roster_footer(&rows, Some(&pred), 60),
        "8/8 Models Active | Predictions: 2025-01-01T00:00:00 | Auto-Refresh: 60s"
    );
}

#[test]
fn roster_honors_registry_status() {
    let status: ModelsStatus = serde_json::from_value(json!({
        "models": [
            { "model_name": "energy_regressor", "status": "ACTIVE" },
            { "model_name": "quality_predictor", "status": "FAILED" },
            "tsr_optimizer"
        ]
    }))
    .unwrap();
    let pred = sample_prediction();
    let rows = model_roster(Some(&pred), Some(&status));

    let offline: Vec<&str> = rows.iter().filter(|r| !r.active).map(|r| r.name.as_str()).collect();
    assert_eq!(offline, ["quality_predictor"]);
    assert!(roster_footer(&rows, Some(&pred), 30).starts_with("7/8 Models Active"));
}
