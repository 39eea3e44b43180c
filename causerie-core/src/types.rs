//! Core domain types for causerie
//!
//! These types cover the three persisted shapes (transcript messages, chat-log
//! entries, link events) and everything the dashboard derives from them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Transcript** | The full ordered message sequence for one conversation |
//! | **Conversation id** | Opaque `conv_`-prefixed token identifying one transcript and its log lines |
//! | **Chat log** | The shared append-only plain-text log, two lines per turn |
//! | **Link event** | One `link_detected` or `link_clicked` record in the event log |
//! | **CTR** | Click-through rate, clicks/detections as a percentage |
//!
//! Wire shapes are bit-compatible with the pre-existing on-disk data: a
//! transcript file is a JSON array of `{role, content}` objects, and a link
//! event carries the exact field names written by the original tracker.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================
// Messages and transcripts
// ============================================

/// Author of a transcript message.
///
/// Anything other than `user`/`assistant` deserializes to [`Role::Unknown`].
/// Unknown roles count toward `messageCount` but toward neither role bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Unknown => "unknown",
        }
    }
}

/// One message within a transcript. Insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================
// Conversation analytics
// ============================================

/// Derived per-conversation summary. Not persisted; recomputed per request.
///
/// `timestamp` is the first chat-log occurrence of the conversation id, and
/// `duration_seconds` the distance to the last occurrence. Both are `None`
/// when the log has no (or only one, for duration) matching line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub duration_seconds: Option<i64>,
    pub message_count: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
}

/// Aggregate metrics across all conversations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub total_user_messages: usize,
    pub total_assistant_messages: usize,
    /// Rounded to 1 decimal; 0 when there are no conversations.
    pub average_messages_per_conversation: f64,
    /// 100 * assistant / user messages, rounded to 1 decimal; 0 when no user messages.
    pub response_rate: f64,
}

/// Calendar bucketing granularity for the conversations-over-time chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            _ => Err(format!("unknown granularity: {}", s)),
        }
    }
}

/// Per-period bucket for the conversations-over-time chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    pub count: u64,
    pub messages: u64,
}

// ============================================
// Link events and analytics
// ============================================

/// Kind of link event reported by the widget client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkEventType {
    LinkDetected,
    LinkClicked,
}

fn default_user_agent() -> String {
    "Unknown".to_string()
}

/// One record in the link event log. Events are immutable history: they are
/// appended in chronological order and never updated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEvent {
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub event_type: LinkEventType,
    pub conversation_id: String,
    #[serde(default)]
    pub message_id: String,
    pub link: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl LinkEvent {
    /// Parse the event's `timestamp` field. `None` for malformed timestamps.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S").ok()
    }
}

/// Per-domain detection/click counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DomainStat {
    pub detections: u64,
    pub clicks: u64,
    /// 100 * clicks / detections, rounded to 2 decimals; 0 when no detections.
    pub ctr: f64,
}

/// One domain row in the link dashboard, sorted descending by combined
/// detection+click volume.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEntry {
    pub domain: String,
    #[serde(flatten)]
    pub stat: DomainStat,
}

/// One calendar-day bucket in the link time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    /// `YYYY-MM-DD`
    pub day: String,
    pub detections: u64,
    pub clicks: u64,
    pub ctr: f64,
}

/// A most-clicked-links row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickedLink {
    pub link: String,
    pub clicks: u64,
}

/// Full link-analytics payload for the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkStats {
    pub total_links: u64,
    pub total_unique_links: u64,
    pub total_clicks: u64,
    pub click_through_rate: f64,
    pub links_per_conversation: f64,
    pub most_clicked_links: Vec<ClickedLink>,
    pub daily_link_counts: Vec<DailyBucket>,
    pub links_by_domain: Vec<DomainEntry>,
}
