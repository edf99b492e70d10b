//! Reminder eligibility.
//!
//! Pure classification of whether a task should trigger a notification at a
//! given instant. An external cron-style trigger calls this repeatedly; it
//! never mutates anything.
//!
//! All date arithmetic runs in one pinned canonical timezone (a fixed UTC
//! offset from config) rather than the server's local zone, so "today"
//! cannot drift across a day boundary between the server and the family.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;

use crate::task::Task;

/// Notification classification for a task at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Nothing to send.
    None,
    /// Timed task coming up within the due-soon window.
    DueSoon,
    /// Past due, still within the overdue lookback window.
    Overdue,
}

/// Tunable windows around the due instant.
#[derive(Debug, Clone, Copy)]
pub struct ReminderWindows {
    /// Minutes before a timed task's due time to start nudging.
    pub due_soon_minutes: i64,
    /// Minutes past due before overdue notifications are suppressed,
    /// so very old items stop spamming every sweep.
    pub overdue_lookback_minutes: i64,
}

impl Default for ReminderWindows {
    fn default() -> Self {
        Self {
            due_soon_minutes: 15,
            overdue_lookback_minutes: 30,
        }
    }
}

/// End-of-day fallback for tasks without a clock time.
const ALL_DAY_DUE: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(t) => t,
    None => unreachable!(),
};

/// The instant a task falls due, in the canonical timezone's wall clock.
pub fn due_at(task: &Task) -> NaiveDateTime {
    task.date.and_time(task.time.unwrap_or(ALL_DAY_DUE))
}

/// Convert a UTC instant to the canonical wall clock.
pub fn canonical_now(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    now.with_timezone(&offset).naive_local()
}

/// Classify a task against the canonical wall-clock `now`.
///
/// The exact due instant still counts as due-soon; overdue starts strictly
/// after it.
pub fn evaluate(task: &Task, now: NaiveDateTime, windows: ReminderWindows) -> Eligibility {
    let due = due_at(task);

    if now > due {
        let late = now - due;
        if late <= TimeDelta::minutes(windows.overdue_lookback_minutes) {
            Eligibility::Overdue
        } else {
            Eligibility::None
        }
    } else if task.time.is_some() && due - now <= TimeDelta::minutes(windows.due_soon_minutes) {
        Eligibility::DueSoon
    } else {
        Eligibility::None
    }
}
