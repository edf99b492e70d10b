//! Task CRUD, suggestion, and coach handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::coach::{self, CoachEvent, Suggestion};
use crate::schedule;
use crate::store::TaskPatch;
use crate::task::{self, NewTask, TaskStatus};

use super::auth;
use super::routes::{resolve_assignees, store_error, validation_error, AppState};
use super::types::*;

async fn to_response(state: &AppState, task: crate::task::Task) -> TaskResponse {
    let assignees = resolve_assignees(state, &task).await;
    TaskResponse::new(task, assignees)
}

/// GET /api/tasks - the caller's family board, date ascending then
/// priority descending.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TaskListResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    let mut tasks = state
        .store
        .list_tasks(family_id)
        .await
        .map_err(store_error)?;
    schedule::sort_for_board(&mut tasks);

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(to_response(&state, task).await);
    }
    Ok(Json(TaskListResponse { tasks: responses }))
}

/// POST /api/tasks - create a task; the server derives points and
/// priority, never the client.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<TaskEnvelope>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    let new_task = NewTask::parse(
        &req.title,
        &req.date,
        req.time.as_deref(),
        &req.difficulty,
        &req.duration,
        req.assignee_ids,
    )
    .map_err(validation_error)?;

    let task = state
        .store
        .insert_task(new_task.into_task(family_id, user.id, Utc::now()))
        .await
        .map_err(store_error)?;
    tracing::info!(task = %task.id, points = task.points, "Task created");
    Ok(Json(TaskEnvelope {
        task: to_response(&state, task).await,
    }))
}

/// PUT /api/tasks/{id} - reschedule, retitle, reassign, or drive the
/// completion state machine. Assignee replacement is applied before a
/// status change so settlement sees the final set.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskEnvelope>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    let status = req
        .status
        .as_deref()
        .map(|s| {
            TaskStatus::parse(s)
                .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown status: {s}")))
        })
        .transpose()?;

    let patch = TaskPatch {
        title: match req.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(validation_error(task::ValidationError::EmptyTitle));
                }
                if title.chars().count() > task::MAX_TITLE_LENGTH {
                    return Err(validation_error(task::ValidationError::TitleTooLong));
                }
                Some(title)
            }
            None => None,
        },
        date: req
            .date
            .as_deref()
            .map(task::parse_date)
            .transpose()
            .map_err(validation_error)?,
        time: req
            .time
            .map(|t| {
                t.filter(|s| !s.is_empty())
                    .as_deref()
                    .map(task::parse_time)
                    .transpose()
            })
            .transpose()
            .map_err(validation_error)?,
    };

    let mut task = state
        .store
        .get_task(family_id, id)
        .await
        .map_err(store_error)?;

    if let Some(assignee_ids) = req.assignee_ids {
        task = state
            .store
            .replace_assignees(family_id, id, assignee_ids)
            .await
            .map_err(store_error)?;
    }
    if !patch.is_empty() {
        task = state
            .store
            .update_task(family_id, id, patch)
            .await
            .map_err(store_error)?;
    }
    match status {
        Some(TaskStatus::Completed) => {
            task = state
                .store
                .complete_task(family_id, id, Utc::now())
                .await
                .map_err(store_error)?;
        }
        Some(TaskStatus::Pending) => {
            task = state
                .store
                .uncomplete_task(family_id, id)
                .await
                .map_err(store_error)?;
        }
        None => {}
    }

    Ok(Json(TaskEnvelope {
        task: to_response(&state, task).await,
    }))
}

/// DELETE /api/tasks/{id} - hard delete. Points settled by a past
/// completion stay on the ledger.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    state
        .store
        .delete_task(family_id, id)
        .await
        .map_err(store_error)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/tasks/date/{date} - one day's agenda, any status.
pub async fn tasks_for_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(date): Path<String>,
) -> Result<Json<TaskListResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;
    let date = task::parse_date(&date).map_err(validation_error)?;

    let tasks = state
        .store
        .list_tasks(family_id)
        .await
        .map_err(store_error)?;
    let mut day = schedule::tasks_for_date(&tasks, date);
    schedule::sort_for_board(&mut day);

    let mut responses = Vec::with_capacity(day.len());
    for task in day {
        responses.push(to_response(&state, task).await);
    }
    Ok(Json(TaskListResponse { tasks: responses }))
}

const MEMBER_HISTORY_LIMIT: usize = 20;

/// GET /api/members/{id}/tasks - a member's recent completions.
pub async fn member_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberTasksResponse>, (StatusCode, String)> {
    let user = auth::current_user(&state, &headers).await?;
    let family_id = auth::require_family(&user)?;

    let (tasks, total) = state
        .store
        .completed_tasks_for_member(family_id, member_id, MEMBER_HISTORY_LIMIT)
        .await
        .map_err(store_error)?;

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(to_response(&state, task).await);
    }
    Ok(Json(MemberTasksResponse {
        tasks: responses,
        stats: MemberStats {
            total_completed: total,
        },
    }))
}

/// POST /api/suggest - estimate difficulty/duration for a title. Always
/// answers 200 with at least the defaults; a coach outage never surfaces.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<Suggestion>, (StatusCode, String)> {
    if req.title.trim().chars().count() < 2 {
        return Err((StatusCode::BAD_REQUEST, "Title too short".to_string()));
    }
    let suggestion = match &state.coach {
        Some(client) => coach::suggest(client.as_ref(), req.title.trim()).await,
        None => Suggestion::default(),
    };
    Ok(Json(suggestion))
}

/// POST /api/coach - a short motivational message for an event.
pub async fn coach(
    State(state): State<Arc<AppState>>,
    Json(event): Json<CoachEvent>,
) -> Json<CoachResponse> {
    let message = match &state.coach {
        Some(client) => coach::coach_message(client.as_ref(), &event).await,
        None => coach::coach_message(&UnavailableCoach, &event).await,
    };
    Json(CoachResponse { message })
}

/// Stand-in client when no API key is configured; forces the fallback path.
struct UnavailableCoach;

#[async_trait::async_trait]
impl crate::coach::ChatClient for UnavailableCoach {
    async fn chat(&self, _system: &str, _user: &str) -> Result<String, crate::coach::CoachError> {
        Err(crate::coach::CoachError::Network(
            "coach not configured".to_string(),
        ))
    }
}
