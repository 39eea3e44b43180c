//! Analytics for the admin dashboard
//!
//! Two aggregators, both pure functions over what the stores hand them:
//!
//! - [`conversations`] — per-conversation summaries (message counts, start
//!   time and duration recovered from the chat log) and global metrics,
//!   recency sorting, calendar-period bucketing
//! - [`topics`] — word-frequency topic extraction over user messages
//! - [`links`] — click-through rates, per-domain stats, daily time series,
//!   most-clicked links from the event log
//!
//! Failure semantics are uniform: missing inputs degrade to defaults and
//! malformed records are skipped, so the dashboard never crashes on bad data —
//! worst case is zero-valued metrics.

pub mod conversations;
pub mod links;
pub mod topics;

pub use conversations::{
    aggregate, analyze_directory, bucket_by_period, sort_by_recency, summarize,
    ConversationReport,
};
pub use links::{
    classify, click_through_rate, daily_series, domain_stats, most_clicked,
    per_conversation_link_counts, unique_link_count,
};
pub use topics::extract_topics;

/// Round to 1 decimal place (dashboard display convention).
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to 2 decimal places (percentage convention).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
