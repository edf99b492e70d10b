//! In-memory store (non-persistent).
//!
//! One `RwLock` guards all state, so every mutation, settlement included,
//! is atomic with respect to readers and serialized against other writers.

use super::{Store, StoreError, TaskPatch};
use crate::family::{self, Family, User};
use crate::task::{Task, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    families: HashMap<Uuid, Family>,
    /// Creation order preserved; listings rely on it for the stable
    /// tie-break.
    tasks: Vec<Task>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_task<'a>(
    tasks: &'a mut [Task],
    family_id: Uuid,
    id: Uuid,
) -> Result<&'a mut Task, StoreError> {
    tasks
        .iter_mut()
        .find(|t| t.id == id && t.family_id == family_id)
        .ok_or(StoreError::TaskNotFound)
}

#[async_trait]
impl Store for InMemoryStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_user(&self, name: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points: 0,
            streak: 0,
            family_id: None,
        };
        self.state
            .write()
            .await
            .users
            .insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create_family(&self, name: &str, creator: Uuid) -> Result<Family, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&creator) {
            return Err(StoreError::UserNotFound);
        }
        let family = Family {
            id: Uuid::new_v4(),
            name: name.to_string(),
            invite_code: family::generate_invite_code(name),
        };
        state.families.insert(family.id, family.clone());
        if let Some(user) = state.users.get_mut(&creator) {
            user.family_id = Some(family.id);
        }
        Ok(family)
    }

    async fn join_family(&self, invite_code: &str, user_id: Uuid) -> Result<Family, StoreError> {
        let code = invite_code.trim().to_uppercase();
        let mut state = self.state.write().await;
        let family = state
            .families
            .values()
            .find(|f| f.invite_code == code)
            .cloned()
            .ok_or(StoreError::BadInviteCode)?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound)?;
        user.family_id = Some(family.id);
        Ok(family)
    }

    async fn get_family(&self, id: Uuid) -> Result<Option<Family>, StoreError> {
        Ok(self.state.read().await.families.get(&id).cloned())
    }

    async fn family_members(&self, family_id: Uuid) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        let mut members: Vec<User> = state
            .users
            .values()
            .filter(|u| u.family_id == Some(family_id))
            .cloned()
            .collect();
        members.sort_by(|a, b| b.points.cmp(&a.points));
        Ok(members)
    }

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        self.state.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id && t.family_id == family_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound)
    }

    async fn list_tasks(&self, family_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn all_pending_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, StoreError> {
        let mut state = self.state.write().await;
        let task = find_task(&mut state.tasks, family_id, id)?;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(date) = patch.date {
            task.date = date;
        }
        if let Some(time) = patch.time {
            task.time = time;
        }
        Ok(task.clone())
    }

    async fn replace_assignees(
        &self,
        family_id: Uuid,
        id: Uuid,
        mut assignee_ids: Vec<Uuid>,
    ) -> Result<Task, StoreError> {
        assignee_ids.sort();
        assignee_ids.dedup();
        let mut state = self.state.write().await;
        let task = find_task(&mut state.tasks, family_id, id)?;
        task.assignees = assignee_ids;
        Ok(task.clone())
    }

    async fn complete_task(
        &self,
        family_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let mut state = self.state.write().await;
        let task = find_task(&mut state.tasks, family_id, id)?;
        if task.status == TaskStatus::Completed {
            return Ok(task.clone());
        }
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);
        let share = task.per_assignee_share();
        let assignees = task.assignees.clone();
        let settled = task.clone();
        for assignee in assignees {
            if let Some(user) = state.users.get_mut(&assignee) {
                user.points += share;
            }
        }
        Ok(settled)
    }

    async fn uncomplete_task(&self, family_id: Uuid, id: Uuid) -> Result<Task, StoreError> {
        let mut state = self.state.write().await;
        let task = find_task(&mut state.tasks, family_id, id)?;
        if task.status == TaskStatus::Pending {
            return Ok(task.clone());
        }
        // Debits the current assignee set against the stored point value,
        // mirroring the credit side.
        let share = task.per_assignee_share();
        task.status = TaskStatus::Pending;
        task.completed_at = None;
        let assignees = task.assignees.clone();
        let reverted = task.clone();
        for assignee in assignees {
            if let Some(user) = state.users.get_mut(&assignee) {
                user.points -= share;
            }
        }
        Ok(reverted)
    }

    async fn delete_task(&self, family_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.id == id && t.family_id == family_id));
        if state.tasks.len() == before {
            return Err(StoreError::TaskNotFound);
        }
        Ok(())
    }

    async fn completed_tasks_for_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        limit: usize,
    ) -> Result<(Vec<Task>, usize), StoreError> {
        let state = self.state.read().await;
        let mut completed: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| {
                t.family_id == family_id
                    && t.status == TaskStatus::Completed
                    && t.assignees.contains(&user_id)
            })
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        let total = completed.len();
        completed.truncate(limit);
        Ok((completed, total))
    }
}
