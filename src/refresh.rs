//! Data refresh controller: periodic batch fetch of plant state.
//!
//! DESIGN
//! ======
//! One refresh issues five backend calls concurrently. Each call degrades
//! to `None` on failure instead of aborting its siblings. The batch is
//! committed only when both health and prediction arrived, and then as a
//! single new [`PlantSnapshot`] swapped in under the write lock, so readers
//! never observe a mix of two batches.
//!
//! An atomic in-flight flag keeps at most one refresh running. A call that
//! arrives while another is pending returns [`RefreshOutcome::Skipped`].
//!
//! ERROR HANDLING
//! ==============
//! A failed batch leaves the previous snapshot untouched and sets a
//! generic connectivity message. Per-call errors are logged, never returned.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::types::{
    ComprehensivePrediction, FeatureImportance, HealthStatus, ModelsStatus, PlantStatus, SensorReadings,
};
use crate::api::{ApiError, FEATURE_IMPORTANCE_MODEL, PlantApi};
use crate::now_ms;

pub const REFRESH_ERROR_MESSAGE: &str = "Connection failed - Click Refresh";

// =============================================================================
// SNAPSHOT / STATE
// =============================================================================

/// The last fully successful fetch batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantSnapshot {
    pub health: Option<HealthStatus>,
    pub plant_status: Option<PlantStatus>,
    pub prediction: Option<ComprehensivePrediction>,
    pub models_status: Option<ModelsStatus>,
    pub feature_importance: Option<FeatureImportance>,
    /// Commit time in milliseconds since the Unix epoch; zero before the first commit.
    pub fetched_at_ms: i64,
}

/// Everything the view reads from the refresh controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub snapshot: Arc<PlantSnapshot>,
    /// True until the first refresh completes, whatever its outcome.
    pub loading: bool,
    /// True while a refresh batch is in flight. Read from the in-flight
    /// flag, so a cancelled refresh never leaves it stuck.
    pub refreshing: bool,
    pub error: Option<String>,
    pub last_update_ms: Option<i64>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(PlantSnapshot::default()),
            loading: true,
            refreshing: false,
            error: None,
            last_update_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Health and prediction arrived; a new snapshot was committed.
    Committed,
    /// A mandatory call failed; the previous snapshot was kept.
    Failed,
    /// Another refresh was already in flight.
    Skipped,
}

struct FetchBatch {
    health: Option<HealthStatus>,
    plant_status: Option<PlantStatus>,
    prediction: Option<ComprehensivePrediction>,
    models_status: Option<ModelsStatus>,
    feature_importance: Option<FeatureImportance>,
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct RefreshController {
    api: Arc<dyn PlantApi>,
    state: RwLock<DashboardState>,
    in_flight: AtomicBool,
    revision: watch::Sender<u64>,
}

impl RefreshController {
    #[must_use]
    pub fn new(api: Arc<dyn PlantApi>) -> Self {
        let (revision, _) = watch::channel(0);
        Self { api, state: RwLock::new(DashboardState::default()), in_flight: AtomicBool::new(false), revision }
    }

    /// Clone of the current view state.
    pub async fn state(&self) -> DashboardState {
        let mut state = self.state.read().await.clone();
        state.refreshing = self.in_flight.load(Ordering::Acquire);
        state
    }

    pub async fn snapshot(&self) -> Arc<PlantSnapshot> {
        Arc::clone(&self.state.read().await.snapshot)
    }

    /// Receiver bumped once per completed (committed or failed) refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Run one refresh batch with `custom_params`, or the default sensor
    /// readings when `None`.
    pub async fn refresh(&self, custom_params: Option<SensorReadings>) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh already in flight; skipping");
            return RefreshOutcome::Skipped;
        }
        let in_flight = InFlightGuard { in_flight: &self.in_flight };

        let params = custom_params.unwrap_or_default();
        let batch = self.fetch_batch(&params).await;
        let outcome = self.commit(batch).await;

        // Subscribers woken below must already read `refreshing == false`.
        drop(in_flight);
        self.revision.send_modify(|r| *r += 1);
        outcome
    }

    async fn fetch_batch(&self, params: &SensorReadings) -> FetchBatch {
        let api = self.api.as_ref();
        let (health, plant_status, prediction, models_status, feature_importance) = tokio::join!(
            optional("health", api.health()),
            optional("plant_status", api.plant_status()),
            optional("prediction", api.predict_comprehensive(params)),
            optional("models_status", api.models_status()),
            optional("feature_importance", api.feature_importance(FEATURE_IMPORTANCE_MODEL)),
        );
        FetchBatch { health, plant_status, prediction, models_status, feature_importance }
    }

    async fn commit(&self, batch: FetchBatch) -> RefreshOutcome {
        let mut state = self.state.write().await;
        state.loading = false;

        let FetchBatch { health, plant_status, prediction, models_status, feature_importance } = batch;
        let (Some(health), Some(prediction)) = (health, prediction) else {
            warn!("refresh failed: health or prediction unavailable");
            state.error = Some(REFRESH_ERROR_MESSAGE.to_owned());
            return RefreshOutcome::Failed;
        };

        // Strictly increasing, even for two commits within one millisecond.
        let now = state
            .last_update_ms
            .map_or_else(now_ms, |prev| now_ms().max(prev + 1));
        state.snapshot = Arc::new(PlantSnapshot {
            health: Some(health),
            plant_status,
            prediction: Some(prediction),
            models_status,
            feature_importance,
            fetched_at_ms: now,
        });
        state.error = None;
        state.last_update_ms = Some(now);
        info!(fetched_at_ms = now, "plant snapshot committed");
        RefreshOutcome::Committed
    }
}

/// Resets the in-flight flag even if the refresh future is dropped early.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

async fn optional<T>(field: &'static str, call: impl Future<Output = Result<T, ApiError>>) -> Option<T> {
    match call.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, code = e.code(), error = %e, "backend call failed; field degraded to none");
            None
        }
    }
}

// =============================================================================
// SCHEDULING
// =============================================================================

/// Handle to the periodic refresh loop. Dropping it stops the loop.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn shutdown(self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the refresh loop: one refresh immediately, then one per `period`.
/// Every cycle sends `params`, or the default readings when `None`.
#[must_use]
pub fn spawn_refresh_task(
    controller: Arc<RefreshController>,
    period: Duration,
    params: Option<SensorReadings>,
) -> RefreshTask {
    let period = period.max(Duration::from_millis(1));
    info!(period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX), "refresh task started");
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = controller.refresh(params).await;
            debug!(?outcome, "scheduled refresh finished");
        }
    });
    RefreshTask { handle }
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
