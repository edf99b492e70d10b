//! Task and family storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, used by tests)
//! - `sqlite`: SQLite database (the production default)
//!
//! Every backend must execute completion settlement atomically: the status
//! flip and all per-assignee point credits happen together or not at all,
//! and concurrent completions of the same task serialize so the loser just
//! observes the already-completed state.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::family::{Family, User};
use crate::task::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown id, or an id that belongs to another family. The two cases
    /// are deliberately indistinguishable so cross-family probing leaks
    /// nothing.
    #[error("Task not found")]
    TaskNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Family not found")]
    FamilyNotFound,

    #[error("Invalid invite code")]
    BadInviteCode,

    #[error("Storage error: {0}")]
    Backend(String),
}

/// Partial update for title and schedule. `time` uses a double `Option`
/// so a request can clear the clock time (turn an appointment back into
/// an all-day task) as well as leave it untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<NaiveTime>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.time.is_none()
    }
}

/// Storage trait implemented by all backends.
///
/// Task operations take the caller's `family_id` and scope every lookup to
/// it; an id from another family behaves exactly like an unknown id.
#[async_trait]
pub trait Store: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    // Users and families (thin CRUD around the task core).

    async fn create_user(&self, name: &str) -> Result<User, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create_family(&self, name: &str, creator: Uuid) -> Result<Family, StoreError>;
    async fn join_family(&self, invite_code: &str, user_id: Uuid) -> Result<Family, StoreError>;
    async fn get_family(&self, id: Uuid) -> Result<Option<Family>, StoreError>;
    async fn family_members(&self, family_id: Uuid) -> Result<Vec<User>, StoreError>;

    // Task lifecycle.

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError>;
    async fn get_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError>;
    /// All of a family's tasks in creation order (callers apply board
    /// ordering via [`crate::schedule`]).
    async fn list_tasks(&self, family_id: Uuid) -> Result<Vec<Task>, StoreError>;
    /// Every pending task across all families, for the reminder sweep.
    async fn all_pending_tasks(&self) -> Result<Vec<Task>, StoreError>;
    /// Apply a title/date/time patch. Points, status and assignees are
    /// untouched.
    async fn update_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, StoreError>;
    /// Replace the assignee set wholesale. Allowed at any status; replacing
    /// assignees of a completed task has no settlement effect.
    async fn replace_assignees(
        &self,
        family_id: Uuid,
        id: Uuid,
        assignee_ids: Vec<Uuid>,
    ) -> Result<Task, StoreError>;
    /// PENDING -> COMPLETED with point settlement. Idempotent: completing
    /// an already-completed task returns it unchanged without crediting
    /// anyone a second time.
    async fn complete_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError>;
    /// COMPLETED -> PENDING, debiting from each current assignee exactly
    /// the per-person amount derived from the stored point value.
    /// Idempotent on already-pending tasks.
    async fn uncomplete_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError>;
    /// Hard delete. Settled points stay with the assignees: completion is
    /// a permanent ledger entry.
    async fn delete_task(&self, family_id: Uuid, id: Uuid) -> Result<(), StoreError>;
    /// A member's completed tasks, most recent first, plus the total
    /// completed count.
    async fn completed_tasks_for_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        limit: usize,
    ) -> Result<(Vec<Task>, usize), StoreError>;
}
