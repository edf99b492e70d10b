//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::family::{Family, User};
use crate::scoring::{Difficulty, Duration, Priority};
use crate::task::{Task, TaskStatus};

/// Request to create a task. Enum-valued fields arrive as their wire
/// strings and are validated before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    /// Due date, `YYYY-MM-DD`
    pub date: String,
    /// Optional clock time, `HH:MM`
    pub time: Option<String>,
    /// `easy` | `normal` | `hard` | `epic`
    pub difficulty: String,
    /// Minutes bucket: `5` | `15` | `30` | `60` | `120`
    pub duration: String,
    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
}

/// Partial task update. Absent fields are untouched; `time: null`
/// explicitly clears the clock time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// `PENDING` | `COMPLETED` - routed through the settlement state machine
    pub status: Option<String>,
    /// Wholesale assignee replacement
    pub assignee_ids: Option<Vec<Uuid>>,
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub time: Option<Option<String>>,
}

/// Distinguish a missing field from an explicit `null`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Assignee profile resolved onto task responses.
#[derive(Debug, Clone, Serialize)]
pub struct AssigneeProfile {
    pub id: Uuid,
    pub name: String,
    pub points: i64,
}

impl From<User> for AssigneeProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            points: u.points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub difficulty: Difficulty,
    pub duration: Duration,
    pub points: i64,
    pub priority: Priority,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub assignees: Vec<AssigneeProfile>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TaskResponse {
    pub fn new(task: Task, assignees: Vec<AssigneeProfile>) -> Self {
        Self {
            id: task.id,
            title: task.title,
            date: task.date.format("%Y-%m-%d").to_string(),
            time: task.time.map(|t| t.format("%H:%M").to_string()),
            difficulty: task.difficulty,
            duration: task.duration,
            points: task.points,
            priority: task.priority,
            status: task.status,
            completed_at: task.completed_at,
            assignees,
            created_by: task.created_by,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskEnvelope {
    pub task: TaskResponse,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinFamilyRequest {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct FamilyResponse {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub members: Vec<AssigneeProfile>,
}

impl FamilyResponse {
    pub fn new(family: Family, members: Vec<User>) -> Self {
        Self {
            id: family.id,
            name: family.name,
            invite_code: family.invite_code,
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub stats: MemberStats,
}

#[derive(Debug, Serialize)]
pub struct MemberStats {
    pub total_completed: usize,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CoachResponse {
    pub message: String,
}

/// Result of one reminder sweep.
#[derive(Debug, Default, Serialize)]
pub struct ReminderRunResponse {
    /// Pending tasks evaluated
    pub checked: usize,
    pub due_soon: usize,
    pub overdue: usize,
    /// Reminders handed to the notifier
    pub sent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_time_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(absent.time.is_none());

        let cleared: UpdateTaskRequest = serde_json::from_str(r#"{"time": null}"#).unwrap();
        assert_eq!(cleared.time, Some(None));

        let set: UpdateTaskRequest = serde_json::from_str(r#"{"time": "14:00"}"#).unwrap();
        assert_eq!(set.time, Some(Some("14:00".to_string())));
    }

    #[test]
    fn create_request_defaults_to_no_assignees() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "Dishes", "date": "2024-06-01", "difficulty": "easy", "duration": "5"}"#,
        )
        .unwrap();
        assert!(req.assignee_ids.is_empty());
        assert!(req.time.is_none());
    }
}
