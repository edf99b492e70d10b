//! Task entity and assignment model.
//!
//! A task carries its point value from creation onward; completion and
//! un-completion settle those points against the current assignee set.
//! Validation of incoming field values happens here, before anything is
//! persisted.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::scoring::{self, Difficulty, Duration, Priority};

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Title is too long (max {MAX_TITLE_LENGTH} characters)")]
    TitleTooLong,

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    BadDate(String),

    #[error("Invalid time: {0} (expected HH:MM)")]
    BadTime(String),

    #[error("Unknown difficulty: {0}")]
    BadDifficulty(String),

    #[error("Unknown duration: {0}")]
    BadDuration(String),
}

/// Completion state. The only transitions are
/// `complete` (PENDING -> COMPLETED) and `uncomplete` (COMPLETED -> PENDING).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TaskStatus::Pending),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A chore on the family board.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub family_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    /// Calendar date the task is due.
    pub date: NaiveDate,
    /// Optional clock time; `None` means an all-day task due at end of day.
    pub time: Option<NaiveTime>,
    pub difficulty: Difficulty,
    pub duration: Duration,
    /// Fixed at creation; settlement always uses this stored value.
    pub points: i64,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Non-null exactly when status is COMPLETED.
    pub completed_at: Option<DateTime<Utc>>,
    /// Zero or more assigned users; empty means "up for grabs".
    pub assignees: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Points each assignee receives on completion (and loses on
    /// un-completion): `floor(points / n)`. The division remainder is
    /// dropped, which keeps the credit and the later debit symmetric.
    /// Zero assignees means nobody is paid.
    pub fn per_assignee_share(&self) -> i64 {
        settlement_share(self.points, self.assignees.len())
    }
}

/// Per-assignee settlement amount for a point value and assignee count.
pub fn settlement_share(points: i64, assignee_count: usize) -> i64 {
    if assignee_count == 0 {
        0
    } else {
        points / assignee_count as i64
    }
}

/// Validated input for creating a task. Points and priority are already
/// derived, so a `NewTask` can be persisted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub difficulty: Difficulty,
    pub duration: Duration,
    pub points: i64,
    pub priority: Priority,
    pub assignee_ids: Vec<Uuid>,
}

impl NewTask {
    /// Parse and validate raw field values. Nothing is persisted unless
    /// every field is well-formed.
    pub fn parse(
        title: &str,
        date: &str,
        time: Option<&str>,
        difficulty: &str,
        duration: &str,
        assignee_ids: Vec<Uuid>,
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ValidationError::TitleTooLong);
        }
        let date = parse_date(date)?;
        let time = time.filter(|t| !t.is_empty()).map(parse_time).transpose()?;
        let difficulty = Difficulty::parse(difficulty)
            .ok_or_else(|| ValidationError::BadDifficulty(difficulty.to_string()))?;
        let duration = Duration::parse(duration)
            .ok_or_else(|| ValidationError::BadDuration(duration.to_string()))?;

        let mut assignee_ids = assignee_ids;
        assignee_ids.sort();
        assignee_ids.dedup();

        Ok(Self {
            title: title.to_string(),
            date,
            time,
            difficulty,
            duration,
            points: scoring::compute_points(difficulty, duration),
            priority: scoring::derive_priority(difficulty),
            assignee_ids,
        })
    }

    /// Materialize a pending task owned by `family_id`.
    pub fn into_task(self, family_id: Uuid, created_by: Uuid, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            family_id,
            created_by,
            title: self.title,
            date: self.date,
            time: self.time,
            difficulty: self.difficulty,
            duration: self.duration,
            points: self.points,
            priority: self.priority,
            status: TaskStatus::Pending,
            completed_at: None,
            assignees: self.assignee_ids,
            created_at: now,
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ValidationError::BadDate(s.to_string()))
}

/// Parse an `HH:MM` clock time.
pub fn parse_time(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ValidationError::BadTime(s.to_string()))
}
