//! Dashboard: composition root owning both controllers.
//!
//! The chat path reads the refresh controller's snapshot to seed context
//! messages; it never writes to it.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::PlantApi;
use crate::api::types::SensorReadings;
use crate::chat::ChatSession;
use crate::kpi::{self, Kpi, ModelRow, RecommendationSummary};
use crate::refresh::{RefreshController, RefreshTask, spawn_refresh_task};

pub struct Dashboard {
    refresh: Arc<RefreshController>,
    chat: ChatSession,
}

impl Dashboard {
    #[must_use]
    pub fn new(api: Arc<dyn PlantApi>) -> Self {
        Self { refresh: Arc::new(RefreshController::new(Arc::clone(&api))), chat: ChatSession::new(api) }
    }

    #[must_use]
    pub fn refresh(&self) -> &Arc<RefreshController> {
        &self.refresh
    }

    #[must_use]
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }

    /// Start periodic refresh bound to the returned handle's lifetime.
    #[must_use]
    pub fn start(&self, period: Duration, params: Option<SensorReadings>) -> RefreshTask {
        spawn_refresh_task(Arc::clone(&self.refresh), period, params)
    }

    /// KPIs from the last committed prediction; empty before the first success.
    pub async fn kpis(&self) -> Vec<Kpi> {
        let snapshot = self.refresh.snapshot().await;
        snapshot.prediction.as_ref().map(kpi::derive_kpis).unwrap_or_default()
    }

    pub async fn crisis_alerts(&self) -> Vec<Kpi> {
        kpi::crisis_alerts(&self.kpis().await)
    }

    pub async fn recommendations(&self) -> Vec<RecommendationSummary> {
        let snapshot = self.refresh.snapshot().await;
        snapshot
            .prediction
            .as_ref()
            .map(kpi::summarize_recommendations)
            .unwrap_or_default()
    }

    /// Roster of the eight prediction models with their live state.
    pub async fn model_roster(&self) -> Vec<ModelRow> {
        let snapshot = self.refresh.snapshot().await;
        kpi::model_roster(snapshot.prediction.as_ref(), snapshot.models_status.as_ref())
    }

    /// Open chat without seeding.
    pub fn open_chat(&mut self) {
        self.chat.open_with_context(None, None);
    }

    /// Open chat seeded with the KPI named `label`. Returns false when no
    /// prediction is loaded or the label is unknown.
    pub async fn open_chat_for_kpi(&mut self, label: &str) -> bool {
        let kpis = self.kpis().await;
        let Some(kpi) = kpis.iter().find(|k| k.label.eq_ignore_ascii_case(label)) else {
            debug!(label, "no KPI to seed chat");
            return false;
        };
        self.chat.open_with_context(Some(kpi), None);
        true
    }

    /// Open chat seeded with the recommendation at `index`.
    pub async fn open_chat_for_recommendation(&mut self, index: usize) -> bool {
        let recs = self.recommendations().await;
        let Some(rec) = recs.get(index) else {
            debug!(index, "no recommendation to seed chat");
            return false;
        };
        self.chat.open_with_context(None, Some(&rec.headline));
        true
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
