use super::*;
use crate::api::test_helpers::MockPlantApi;
use crate::api::types::{ModelEntry, ModelsStatus};
use crate::chat::ChatPhase;
use crate::refresh::RefreshOutcome;

fn dashboard() -> (Arc<MockPlantApi>, Dashboard) {
    let mock = Arc::new(MockPlantApi::healthy());
    let dash = Dashboard::new(Arc::clone(&mock) as Arc<dyn PlantApi>);
    (mock, dash)
}

#[tokio::test]
async fn no_kpis_before_first_success() {
    let (_mock, dash) = dashboard();
    assert!(dash.kpis().await.is_empty());
    assert!(dash.crisis_alerts().await.is_empty());
    assert!(dash.recommendations().await.is_empty());
}

#[tokio::test]
async fn kpis_follow_committed_prediction() {
    let (_mock, dash) = dashboard();
    assert_eq!(dash.refresh().refresh(None).await, RefreshOutcome::Committed);

    let kpis = dash.kpis().await;
    assert_eq!(kpis.len(), 8);
    assert!((kpis[0].current - 96.0).abs() < f64::EPSILON);

    let alerts: Vec<String> = dash.crisis_alerts().await.into_iter().map(|k| k.label).collect();
    // OEE 70 -> 90 is a 20 point gap in the sample prediction.
    assert!(alerts.contains(&"OEE".to_owned()));
    assert_eq!(dash.recommendations().await.len(), 2);
}

#[tokio::test]
async fn open_chat_for_kpi_requires_prediction() {
    let (_mock, mut dash) = dashboard();
    assert!(!dash.open_chat_for_kpi("OEE").await);
    assert_eq!(dash.chat().phase(), ChatPhase::Closed);

    dash.refresh().refresh(None).await;
    assert!(dash.open_chat_for_kpi("oee").await);
    assert_eq!(dash.chat().phase(), ChatPhase::Idle);
    let content = &dash.chat().messages()[0].content;
    assert!(content.contains("How to increase from 70 to 90?"));

    assert!(!dash.open_chat_for_kpi("Unknown KPI").await);
}

#[tokio::test]
async fn open_chat_for_recommendation_uses_headline() {
    let (_mock, mut dash) = dashboard();
    dash.refresh().refresh(None).await;

    assert!(dash.open_chat_for_recommendation(1).await);
    assert_eq!(
        dash.chat().messages()[0].content,
        "I can help with Increase biomass ratio. What would you like to know?"
    );
    assert!(!dash.open_chat_for_recommendation(5).await);
}

#[tokio::test]
async fn chat_does_not_touch_snapshot() {
    let (mock, mut dash) = dashboard();
    dash.refresh().refresh(None).await;
    let before = dash.refresh().snapshot().await;

    dash.open_chat();
    dash.chat_mut().send_message("hello").await;

    assert_eq!(dash.refresh().snapshot().await, before);
    assert_eq!(mock.chat_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn model_roster_goes_live_with_prediction() {
    let (mock, dash) = dashboard();
    assert!(dash.model_roster().await.iter().all(|m| !m.active));

    mock.set_models_status(Some(ModelsStatus {
        models: vec![ModelEntry::Detailed { model_name: "mill_optimizer".into(), status: "PENDING".into() }],
        ..ModelsStatus::default()
    }));
    dash.refresh().refresh(None).await;

    let roster = dash.model_roster().await;
    assert_eq!(roster.len(), 8);
    let offline: Vec<&str> = roster.iter().filter(|m| !m.active).map(|m| m.name.as_str()).collect();
    assert_eq!(offline, ["mill_optimizer"]);
}
