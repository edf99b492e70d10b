//! Cron-triggered reminder sweep.
//!
//! An external scheduler POSTs here periodically; the handler classifies
//! every pending task against the canonical clock and hands eligible ones
//! to the notifier. Delivery is fire-and-forget: the response counts what
//! was dispatched, not what arrived.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;

use super::auth;
use super::routes::{store_error, AppState};
use super::types::ReminderRunResponse;
use crate::notify::Reminder;
use crate::reminder::{self, Eligibility};

/// POST /api/reminders/run - protected by the cron bearer secret.
pub async fn run_sweep(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ReminderRunResponse>, (StatusCode, String)> {
    auth::check_cron_secret(&state, &headers)?;

    let now = reminder::canonical_now(Utc::now(), state.config.tz_offset());
    let windows = state.config.reminders;

    let pending = state
        .store
        .all_pending_tasks()
        .await
        .map_err(store_error)?;

    let mut result = ReminderRunResponse {
        checked: pending.len(),
        ..ReminderRunResponse::default()
    };

    for task in &pending {
        let eligibility = reminder::evaluate(task, now, windows);
        match eligibility {
            Eligibility::None => continue,
            Eligibility::DueSoon => result.due_soon += 1,
            Eligibility::Overdue => result.overdue += 1,
        }
        for item in Reminder::for_task(task, eligibility) {
            state.notifier.send(&item).await;
            result.sent += 1;
        }
    }

    tracing::info!(
        checked = result.checked,
        due_soon = result.due_soon,
        overdue = result.overdue,
        sent = result.sent,
        "Reminder sweep finished"
    );
    Ok(Json(result))
}
