//! CementAI monitor: client for the cement-plant optimization backend.
//!
//! DESIGN
//! ======
//! Two independent controllers share one backend seam ([`api::PlantApi`]):
//! [`refresh::RefreshController`] keeps the plant snapshot fresh and
//! [`chat::ChatSession`] mediates assistant turns. [`dashboard::Dashboard`]
//! owns both and lets chat read the latest prediction.

pub mod api;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod kpi;
pub mod refresh;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, zero if the clock is before it.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
