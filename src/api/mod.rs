//! HTTP API for famhub.
//!
//! ## Endpoints
//!
//! - `POST /api/users` - Register a member profile
//! - `POST /api/families` - Create a family (returns the invite code)
//! - `POST /api/families/join` - Join a family by invite code
//! - `GET /api/families/me` - Caller's family with ranked members
//! - `GET /api/tasks` - Family board, date ascending then priority descending
//! - `POST /api/tasks` - Create a task (server computes points/priority)
//! - `PUT /api/tasks/{id}` - Update, reassign, complete, or uncomplete
//! - `DELETE /api/tasks/{id}` - Hard delete
//! - `GET /api/tasks/date/{date}` - One day's agenda, any status
//! - `GET /api/members/{id}/tasks` - A member's recent completions
//! - `POST /api/suggest` - AI difficulty/duration estimate for a title
//! - `POST /api/coach` - AI motivational message
//! - `POST /api/reminders/run` - Cron-triggered reminder sweep (bearer secret)
//! - `GET /api/health` - Health check

mod auth;
mod families;
mod reminders;
mod routes;
mod tasks;
pub mod types;

pub use routes::{serve, AppState};

#[cfg(test)]
mod tests {
    use super::routes::{router, AppState};
    use crate::config::Config;
    use crate::store::InMemoryStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> axum::Router {
        let state = AppState::new(Config::default(), Arc::new(InMemoryStore::new()));
        router(Arc::new(state))
    }

    async fn send(
        app: &axum::Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a user, create a family, return (user_id, invite_code).
    async fn bootstrap(app: &axum::Router) -> (String, String) {
        let (status, user) = send(
            app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let user_id = user["id"].as_str().unwrap().to_string();

        let (status, family) = send(
            app,
            "POST",
            "/api/families",
            Some(&user_id),
            Some(json!({ "name": "Martin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let code = family["invite_code"].as_str().unwrap().to_string();
        (user_id, code)
    }

    #[tokio::test]
    async fn create_task_computes_points_server_side() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "Clean the kitchen",
                "date": "2024-06-01",
                "time": "14:00",
                "difficulty": "epic",
                "duration": "120",
                "assignee_ids": [user]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["points"], 120);
        assert_eq!(body["task"]["priority"], "URGENT");
        assert_eq!(body["task"]["status"], "PENDING");
        assert_eq!(body["task"]["assignees"][0]["name"], "Alice");
    }

    #[tokio::test]
    async fn create_task_rejects_missing_title_and_bad_enums() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "",
                "date": "2024-06-01",
                "difficulty": "easy",
                "duration": "5"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "Dishes",
                "date": "2024-06-01",
                "difficulty": "brutal",
                "duration": "5"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn complete_via_put_settles_points() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "Mow the lawn",
                "date": "2024-06-01",
                "difficulty": "hard",
                "duration": "30",
                "assignee_ids": [user]
            })),
        )
        .await;
        let task_id = created["task"]["id"].as_str().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&user),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["task"]["status"], "COMPLETED");
        assert!(!updated["task"]["completed_at"].is_null());
        // hard x 30min = 30 points, sole assignee gets all of them
        assert_eq!(updated["task"]["assignees"][0]["points"], 30);

        // Toggling back reverses the credit.
        let (_, reverted) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&user),
            Some(json!({ "status": "PENDING" })),
        )
        .await;
        assert_eq!(reverted["task"]["status"], "PENDING");
        assert!(reverted["task"]["completed_at"].is_null());
        assert_eq!(reverted["task"]["assignees"][0]["points"], 0);
    }

    #[tokio::test]
    async fn update_rejects_over_long_title() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "Dishes",
                "date": "2024-06-01",
                "difficulty": "easy",
                "duration": "5"
            })),
        )
        .await;
        let task_id = created["task"]["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&user),
            Some(json!({ "title": "x".repeat(300) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // The stored title is untouched.
        let (_, body) = send(&app, "GET", "/api/tasks", Some(&user), None).await;
        assert_eq!(body["tasks"][0]["title"], "Dishes");
    }

    #[tokio::test]
    async fn cross_family_task_is_404() {
        let app = app();
        let (alice, _) = bootstrap(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&alice),
            Some(json!({
                "title": "Private chore",
                "date": "2024-06-01",
                "difficulty": "easy",
                "duration": "5"
            })),
        )
        .await;
        let task_id = created["task"]["id"].as_str().unwrap();

        // A second family's member probing the first family's task id.
        let (_, mallory) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Mallory" })),
        )
        .await;
        let mallory_id = mallory["id"].as_str().unwrap().to_string();
        send(
            &app,
            "POST",
            "/api/families",
            Some(&mallory_id),
            Some(json!({ "name": "Other" })),
        )
        .await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&mallory_id),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(&mallory_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn board_listing_is_ordered() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        for (title, date, difficulty) in [
            ("later urgent", "2024-06-02", "epic"),
            ("early low", "2024-06-01", "easy"),
            ("early high", "2024-06-01", "hard"),
        ] {
            send(
                &app,
                "POST",
                "/api/tasks",
                Some(&user),
                Some(json!({
                    "title": title,
                    "date": date,
                    "difficulty": difficulty,
                    "duration": "15"
                })),
            )
            .await;
        }

        let (status, body) = send(&app, "GET", "/api/tasks", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["early high", "early low", "later urgent"]);
    }

    #[tokio::test]
    async fn day_agenda_includes_completed() {
        let app = app();
        let (user, _) = bootstrap(&app).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                "title": "Done already",
                "date": "2024-06-01",
                "difficulty": "easy",
                "duration": "5"
            })),
        )
        .await;
        let task_id = created["task"]["id"].as_str().unwrap();
        send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&user),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;

        let (status, body) = send(
            &app,
            "GET",
            "/api/tasks/date/2024-06-01",
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(body["tasks"][0]["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn requests_without_identity_are_unauthorized() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "GET",
            "/api/tasks",
            Some(&Uuid::new_v4().to_string()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn join_family_by_code() {
        let app = app();
        let (_, code) = bootstrap(&app).await;

        let (_, bob) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Bob" })),
        )
        .await;
        let bob_id = bob["id"].as_str().unwrap().to_string();

        // Codes are case-insensitive on join.
        let (status, family) = send(
            &app,
            "POST",
            "/api/families/join",
            Some(&bob_id),
            Some(json!({ "invite_code": code.to_lowercase() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(family["members"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reminder_sweep_requires_cron_secret() {
        let app = app();
        let (status, _) = send(&app, "POST", "/api/reminders/run", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reminder_sweep_counts_pending() {
        let state = AppState::new(Config::default(), Arc::new(InMemoryStore::new()));
        let secret = state.config.cron_secret.clone();
        let app = router(Arc::new(state));
        let (user, _) = bootstrap(&app).await;

        send(
            &app,
            "POST",
            "/api/tasks",
            Some(&user),
            Some(json!({
                // Far in the past: outside the overdue lookback, so checked
                // but nothing sent.
                "title": "Ancient chore",
                "date": "2020-01-01",
                "difficulty": "easy",
                "duration": "5",
                "assignee_ids": [user]
            })),
        )
        .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/reminders/run")
            .header(header::AUTHORIZATION, format!("Bearer {secret}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["checked"], 1);
        assert_eq!(body["sent"], 0);
    }

    #[tokio::test]
    async fn suggest_serves_defaults_without_coach() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/suggest",
            None,
            Some(json!({ "title": "Clean the windows" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["difficulty"], "normal");
        assert_eq!(body["duration"], "15");
    }
}
