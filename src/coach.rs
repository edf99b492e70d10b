//! AI coach collaborator.
//!
//! Wraps an OpenAI-compatible chat endpoint for two product features:
//! suggesting difficulty/duration from a task title, and short motivational
//! messages. Both degrade to static fallbacks on any failure; a coach
//! outage must never fail or delay task CRUD.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{Difficulty, Duration};

const XAI_API_URL: &str = "https://api.x.ai/v1/chat/completions";
const CHAT_MODEL: &str = "grok-4-1-fast-reasoning";

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Minimal chat client. The trait seam lets tests and offline deployments
/// swap in a stub.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One system + one user message, assistant text back.
    async fn chat(&self, system: &str, user: &str) -> Result<String, CoachError>;
}

/// x.ai chat client.
pub struct XaiClient {
    client: Client,
    api_key: String,
}

impl XaiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatClient for XaiClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String, CoachError> {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        };
        let response = self
            .client
            .post(XAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| CoachError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(CoachError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CoachError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CoachError::Malformed("empty choices".to_string()))
    }
}

/// Suggested scoring inputs for a task title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub difficulty: Difficulty,
    pub duration: Duration,
    pub tip: Option<String>,
}

impl Default for Suggestion {
    /// The fallback whenever the coach is unavailable or talks nonsense.
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            duration: Duration::Min15,
            tip: None,
        }
    }
}

#[derive(Deserialize)]
struct RawSuggestion {
    difficulty: Option<String>,
    duration: Option<serde_json::Value>,
    tip: Option<String>,
}

/// Ask the coach to estimate difficulty and duration for a chore title.
/// Any failure along the way returns the default suggestion.
pub async fn suggest(client: &dyn ChatClient, title: &str) -> Suggestion {
    let system = "You analyze household and family chores. For each task, estimate:\n\
        1. difficulty: easy, normal, hard, epic\n\
        2. duration in minutes: 5, 15, 30, 60, 120\n\
        Reply ONLY with valid JSON, no markdown, no explanation:\n\
        {\"difficulty\": \"...\", \"duration\": \"...\", \"tip\": \"...\"}";
    let user = format!("Analyze this task: {title}");

    match client.chat(system, &user).await {
        Ok(content) => parse_suggestion(&content),
        Err(e) => {
            tracing::warn!("Coach suggestion failed, using defaults: {e}");
            Suggestion::default()
        }
    }
}

fn parse_suggestion(content: &str) -> Suggestion {
    let raw: RawSuggestion = match serde_json::from_str(content.trim()) {
        Ok(raw) => raw,
        Err(_) => return Suggestion::default(),
    };
    let fallback = Suggestion::default();
    // The model sometimes returns the duration as a bare number.
    let duration = raw
        .duration
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .and_then(|s| Duration::parse(&s));
    Suggestion {
        difficulty: raw
            .difficulty
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or(fallback.difficulty),
        duration: duration.unwrap_or(fallback.duration),
        tip: raw.tip.filter(|t| !t.is_empty()),
    }
}

/// What the coach is reacting to.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CoachEvent {
    TaskCompleted {
        user_name: String,
        task_title: String,
        task_points: i64,
        user_points: i64,
        #[serde(default)]
        streak: i64,
    },
    TaskLate {
        user_name: String,
        task_title: String,
    },
    Motivation {
        user_name: String,
        user_points: i64,
        #[serde(default)]
        streak: i64,
    },
    Competition {
        user_name: String,
        #[serde(default)]
        family_ranking: Vec<RankEntry>,
    },
    Chat {
        user_name: String,
        #[serde(default)]
        message: Option<String>,
    },
}

/// One leaderboard row, as the client sends it with a competition event.
#[derive(Debug, Clone, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub points: i64,
}

impl CoachEvent {
    fn user_name(&self) -> &str {
        match self {
            CoachEvent::TaskCompleted { user_name, .. }
            | CoachEvent::TaskLate { user_name, .. }
            | CoachEvent::Motivation { user_name, .. }
            | CoachEvent::Competition { user_name, .. }
            | CoachEvent::Chat { user_name, .. } => user_name,
        }
    }

    fn prompt(&self) -> String {
        match self {
            CoachEvent::TaskCompleted {
                user_name,
                task_title,
                task_points,
                user_points,
                streak,
            } => format!(
                "{user_name} just finished the task \"{task_title}\" and earned \
                 {task_points} points! Their total: {user_points} points. Streak: \
                 {streak} days. Congratulate them personally and keep them motivated. \
                 Mention the streak if it is above 1."
            ),
            CoachEvent::TaskLate {
                user_name,
                task_title,
            } => format!(
                "{user_name} has an overdue task: \"{task_title}\". Encourage them \
                 without guilt-tripping and suggest a way to start right now."
            ),
            CoachEvent::Motivation {
                user_name,
                user_points,
                streak,
            } => format!(
                "{user_name} needs motivation. Points: {user_points}, streak: {streak}. \
                 Give a personal encouragement and remind them of what they achieved."
            ),
            CoachEvent::Competition {
                user_name,
                family_ranking,
            } => {
                let standings = family_ranking
                    .iter()
                    .enumerate()
                    .map(|(i, r)| format!("{}. {}: {}pts", i + 1, r.name, r.points))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Family leaderboard: {standings}. {user_name} wants to know where \
                     they stand. Comment on the ranking in a fun, motivating way - a \
                     little healthy competition!"
                )
            }
            CoachEvent::Chat { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Say something motivating.".to_string()),
        }
    }

    /// Static message used when the coach is unreachable.
    fn fallback(&self) -> String {
        match self {
            CoachEvent::TaskCompleted {
                user_name,
                task_points,
                ..
            } => format!("Well done {user_name}, {task_points} points in the bag! 🎉"),
            CoachEvent::TaskLate { user_name, .. } => {
                format!("Hey {user_name}, one small step now beats a perfect plan later 💪")
            }
            CoachEvent::Motivation { user_name, .. } => {
                format!("Keep going {user_name}, every chore counts! ⭐")
            }
            CoachEvent::Competition { user_name, .. } => {
                format!("The family race is on, {user_name} - go grab those points! 🏆")
            }
            CoachEvent::Chat { user_name, .. } => {
                format!("You've got this, {user_name}! 🚀")
            }
        }
    }
}

/// Produce a short motivational message for an event, falling back to a
/// canned line on failure.
pub async fn coach_message(client: &dyn ChatClient, event: &CoachEvent) -> String {
    let system = format!(
        "You are a kind AI coach for a family chore app. You are talking to {}. \
         Style: encouraging, fun, sometimes teasing but never mean. Use emojis. \
         Be concise (2-3 sentences max).",
        event.user_name()
    );
    match client.chat(&system, &event.prompt()).await {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Coach message failed, using fallback: {e}");
            event.fallback()
        }
    }
}
