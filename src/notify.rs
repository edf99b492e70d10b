//! Notification dispatch.
//!
//! The reminder sweep hands eligible tasks to a [`Notifier`]; the actual
//! push transport lives outside this service. Dispatch is fire-and-forget:
//! a delivery failure is logged and never propagates into the sweep result.

use async_trait::async_trait;
use uuid::Uuid;

use crate::reminder::Eligibility;
use crate::task::Task;

/// A reminder ready for delivery to one assignee.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub body: String,
    pub urgent: bool,
}

impl Reminder {
    /// Build per-assignee reminders for an eligible task. Unassigned tasks
    /// produce nothing; there is nobody to nudge.
    pub fn for_task(task: &Task, eligibility: Eligibility) -> Vec<Reminder> {
        let (title, body, urgent) = match eligibility {
            Eligibility::None => return Vec::new(),
            Eligibility::DueSoon => (
                "⏰ Coming up!".to_string(),
                format!("{} - due soon", task.title),
                false,
            ),
            Eligibility::Overdue => (
                "⚠️ Task overdue!".to_string(),
                format!("{} - was due {}", task.title, task.date),
                true,
            ),
        };
        task.assignees
            .iter()
            .map(|&user_id| Reminder {
                user_id,
                task_id: task.id,
                title: title.clone(),
                body: body.clone(),
                urgent,
            })
            .collect()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one reminder. Errors are the implementation's problem to
    /// report; callers do not retry.
    async fn send(&self, reminder: &Reminder);
}

/// Default notifier: writes reminders to the log. Stands in for the push
/// transport in development and tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, reminder: &Reminder) {
        tracing::info!(
            user = %reminder.user_id,
            task = %reminder.task_id,
            urgent = reminder.urgent,
            "reminder: {} {}",
            reminder.title,
            reminder.body
        );
    }
}
