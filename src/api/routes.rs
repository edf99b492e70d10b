//! Router assembly and shared handler plumbing.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::coach::{ChatClient, XaiClient};
use crate::config::Config;
use crate::notify::{LogNotifier, Notifier};
use crate::store::{SqliteStore, Store, StoreError};
use crate::task::{Task, ValidationError};

use super::types::AssigneeProfile;
use super::{families, reminders, tasks};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    /// None when no API key is configured; endpoints then serve fallbacks.
    pub coach: Option<Arc<dyn ChatClient>>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let coach: Option<Arc<dyn ChatClient>> = config
            .xai_api_key
            .clone()
            .map(|key| Arc::new(XaiClient::new(key)) as Arc<dyn ChatClient>);
        Self {
            config,
            store,
            coach,
            notifier: Arc::new(LogNotifier),
        }
    }
}

/// Map a store failure onto an HTTP response. Not-found style errors keep
/// their message; backend failures log the detail and surface a generic
/// message so nothing internal leaks.
pub fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::TaskNotFound
        | StoreError::UserNotFound
        | StoreError::FamilyNotFound
        | StoreError::BadInviteCode => (StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Backend(detail) => {
            tracing::error!("Store failure: {detail}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not update task".to_string(),
            )
        }
    }
}

pub fn validation_error(e: ValidationError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Resolve assignee profiles for a task response. Users that vanished
/// since assignment are silently skipped.
pub async fn resolve_assignees(state: &AppState, task: &Task) -> Vec<AssigneeProfile> {
    let mut profiles = Vec::with_capacity(task.assignees.len());
    for &id in &task.assignees {
        if let Ok(Some(user)) = state.store.get_user(id).await {
            profiles.push(user.into());
        }
    }
    profiles
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users", post(families::create_user))
        .route("/api/families", post(families::create_family))
        .route("/api/families/join", post(families::join_family))
        .route("/api/families/me", get(families::my_family))
        .route(
            "/api/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/date/:date", get(tasks::tasks_for_date))
        .route("/api/members/:id/tasks", get(tasks::member_tasks))
        .route("/api/suggest", post(tasks::suggest))
        .route("/api/coach", post(tasks::coach))
        .route("/api/reminders/run", post(reminders::run_sweep))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open(config.db_path.clone())?);
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
