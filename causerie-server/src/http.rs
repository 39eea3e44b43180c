//! Causerie HTTP API
//!
//! Axum-based HTTP server exposing the chat widget endpoints and the admin
//! dashboard API.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET  /health                          — health check
//! - POST /api/chat                        — relay a user message to the agent
//! - POST /api/reset                       — mint a fresh conversation id
//! - POST /api/track                       — record a link event
//! - GET  /api/dashboard?period=           — conversation metrics and lists
//! - GET  /api/links                       — link analytics
//! - GET  /api/conversations/:id           — one conversation in detail
//! - GET  /api/conversations/:id/export    — plain-text transcript download
//!
//! The widget endpoints answer HTTP 200 with a `success` flag, matching what
//! the existing widget client expects. Missing data files never produce a
//! 500: dashboard payloads degrade to zeros with a soft `warning` field.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use causerie_core::analytics;
use causerie_core::store::{ChatLog, EventLogStore, TranscriptStore};
use causerie_core::{
    AgentClient, Config, ConversationSummary, Granularity, LinkEvent, LinkEventType, LinkStats,
    Message, Metrics, PeriodBucket, Role,
};
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Shared state for all HTTP handlers.
///
/// The event log sits behind a mutex so concurrent trackers append one at a
/// time; everything else is re-read from disk per request.
pub struct AppState {
    pub config: Config,
    pub agent: Option<AgentClient>,
    pub transcripts: TranscriptStore,
    pub chat_log: ChatLog,
    pub events: Mutex<EventLogStore>,
}

impl AppState {
    /// Build state from configuration. A missing agent credential disables
    /// the relay (chat answers with an error payload) but the dashboard and
    /// tracking endpoints keep working.
    pub fn from_config(config: Config) -> Self {
        let agent = match AgentClient::new(&config.agent) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Agent relay disabled");
                None
            }
        };

        let events = EventLogStore::new(config.event_log_path())
            .with_legacy(config.legacy_event_log_path());

        Self {
            transcripts: TranscriptStore::new(config.conversations_dir()),
            chat_log: ChatLog::new(config.chat_log_path()),
            events: Mutex::new(events),
            agent,
            config,
        }
    }
}

/// Build the axum router with all endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/track", post(track_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/links", get(links_handler))
        .route("/api/conversations/:id", get(conversation_handler))
        .route("/api/conversations/:id/export", get(export_handler))
        .with_state(state)
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omitted on the first turn; the server mints an id and returns it.
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default, alias = "userMessage")]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            conversation_id: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metrics: Metrics,
    pub conversations: Vec<ConversationSummary>,
    pub by_period: BTreeMap<String, PeriodBucket>,
    pub topics: Vec<(String, u64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailMessage {
    pub role: Role,
    pub content: String,
    /// Synthesized `HH:MM`, start time plus one minute per message index.
    /// The stored format has no per-message timestamps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    pub messages: Vec<DetailMessage>,
}

/// Standard JSON error body for the dashboard endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

const TOPIC_COUNT: usize = 10;
const TOPIC_MIN_WORD_LENGTH: usize = 4;

/// Inner chat relay: one full turn.
///
/// History is re-read from the transcript store on every call; there is no
/// server-side session. The assistant turn is only persisted after the agent
/// call succeeds, so a failed upstream call leaves the files untouched.
pub async fn chat_inner(state: &AppState, req: ChatRequest, now: NaiveDateTime) -> ChatResponse {
    if req.user_message.trim().is_empty() {
        return ChatResponse::error("user message is empty");
    }

    let agent = match &state.agent {
        Some(agent) => agent,
        None => return ChatResponse::error("agent relay is not configured"),
    };

    let conversation_id = req
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| TranscriptStore::sanitize_id(&id))
        .unwrap_or_else(causerie_core::new_conversation_id);

    let mut history = match state.transcripts.read(&conversation_id) {
        Ok(Some(messages)) => messages,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(%conversation_id, error = %e, "Unreadable transcript, starting fresh");
            Vec::new()
        }
    };
    history.push(Message::user(req.user_message.clone()));

    let reply = match agent.complete(&history).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(%conversation_id, error = %e, "Agent call failed");
            return ChatResponse::error(format!("agent request failed: {}", e));
        }
    };
    history.push(Message::assistant(reply.clone()));

    if let Err(e) = state.transcripts.write(&conversation_id, &history) {
        tracing::error!(%conversation_id, error = %e, "Failed to write transcript");
        return ChatResponse::error("failed to persist conversation");
    }
    if let Err(e) = state.chat_log.append_turn(
        now,
        &conversation_id,
        &req.user_message,
        &state.config.agent.bot_name,
        &reply,
    ) {
        // Transcript is saved; a log-append failure only degrades analytics.
        tracing::error!(%conversation_id, error = %e, "Failed to append chat log");
    }

    ChatResponse {
        success: true,
        response: Some(reply),
        conversation_id: Some(conversation_id),
        error: None,
    }
}

/// Inner link tracking: validate, stamp, append.
pub async fn track_inner(
    state: &AppState,
    req: TrackRequest,
    now: NaiveDateTime,
    ip: String,
    user_agent: String,
) -> TrackResponse {
    let event_type = match req.event_type.as_str() {
        "link_detected" => LinkEventType::LinkDetected,
        "link_clicked" => LinkEventType::LinkClicked,
        _ => {
            return TrackResponse {
                success: false,
                error: Some("invalid event type".to_string()),
            }
        }
    };
    if req.conversation_id.is_empty() || req.link.is_empty() {
        return TrackResponse {
            success: false,
            error: Some("incomplete event data".to_string()),
        };
    }

    let event = LinkEvent {
        timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        event_type,
        conversation_id: req.conversation_id,
        message_id: req.message_id,
        link: req.link,
        ip,
        user_agent,
    };

    let events = state.events.lock().await;
    match events.append(&event) {
        Ok(()) => TrackResponse {
            success: true,
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to append link event");
            TrackResponse {
                success: false,
                error: Some("failed to write event log".to_string()),
            }
        }
    }
}

/// Inner dashboard assembly: metrics, recency-sorted summaries, period
/// buckets, and topics, degrading to zeros when files are missing.
pub fn dashboard_inner(state: &AppState, granularity: Granularity) -> DashboardResponse {
    let log_text = match state.chat_log.read() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Chat log unreadable");
            None
        }
    };
    let warning = if log_text.is_none() {
        Some("no chat log yet; timestamps unavailable".to_string())
    } else {
        None
    };

    let report = analytics::analyze_directory(&state.transcripts, log_text.as_deref());
    let by_period = analytics::bucket_by_period(&report.conversations, granularity);

    let transcripts: Vec<Vec<Message>> = report
        .conversations
        .iter()
        .filter_map(|summary| state.transcripts.read(&summary.id).ok().flatten())
        .collect();
    let topics = analytics::extract_topics(
        transcripts.iter().map(|m| m.as_slice()),
        TOPIC_COUNT,
        TOPIC_MIN_WORD_LENGTH,
    );

    DashboardResponse {
        metrics: report.metrics,
        conversations: report.conversations,
        by_period,
        topics,
        warning,
    }
}

/// Inner link analytics: all-zero stats when the log is missing or corrupt.
pub async fn links_inner(state: &AppState) -> LinkStats {
    let events = state.events.lock().await.read_all();
    LinkStats::compute(&events, Local::now().date_naive())
}

/// Inner conversation detail. `None` when the transcript does not exist or
/// cannot be parsed.
pub fn conversation_inner(state: &AppState, id: &str) -> Option<ConversationDetail> {
    let id = TranscriptStore::sanitize_id(id);
    let messages = state.transcripts.read(&id).ok().flatten()?;
    let log_text = state.chat_log.read().ok().flatten();
    let summary = analytics::summarize(&id, &messages, log_text.as_deref());

    let messages = messages
        .into_iter()
        .enumerate()
        .map(|(index, message)| DetailMessage {
            timestamp: summary
                .timestamp
                .map(|start| (start + Duration::minutes(index as i64)).format("%H:%M").to_string()),
            role: message.role,
            content: message.content,
        })
        .collect();

    Some(ConversationDetail { summary, messages })
}

// ============================================================================
// Axum handlers
// ============================================================================

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(chat_inner(&state, req, Local::now().naive_local()).await)
}

async fn reset_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "conversation_id": causerie_core::new_conversation_id(),
    }))
}

async fn track_handler(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<TrackRequest>,
) -> Json<TrackResponse> {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();

    Json(track_inner(&state, req, Local::now().naive_local(), ip, user_agent).await)
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardResponse> {
    let granularity = query
        .period
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or_default();
    Json(dashboard_inner(&state, granularity))
}

async fn links_handler(State(state): State<Arc<AppState>>) -> Json<LinkStats> {
    Json(links_inner(&state).await)
}

async fn conversation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match conversation_inner(&state, &id) {
        Some(detail) => (StatusCode::OK, Json(detail)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("conversation not found")),
        )
            .into_response(),
    }
}

async fn export_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = TranscriptStore::sanitize_id(&id);
    match state.transcripts.read(&id) {
        Ok(Some(messages)) => {
            let body =
                causerie_core::export::render_transcript(&id, &messages, Local::now().naive_local());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"conversation_{}.txt\"", id),
                    ),
                ],
                body,
            )
                .into_response()
        }
        _ => (StatusCode::NOT_FOUND, "conversation not found").into_response(),
    }
}
