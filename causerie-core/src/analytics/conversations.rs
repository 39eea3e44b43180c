//! Conversation summaries and aggregate metrics
//!
//! A summary combines two sources: the transcript file (message counts by
//! role) and the shared chat log (start timestamp and duration). Either may
//! be missing or damaged; summaries degrade field by field instead of
//! failing. Aggregation is a pure reduction over summaries, so it is
//! independent of their order.

use crate::error::Error;
use crate::store::{self, TranscriptStore};
use crate::types::{ConversationSummary, Granularity, Message, Metrics, PeriodBucket, Role};
use chrono::Datelike;
use std::collections::BTreeMap;

use super::round1;

/// Summarize one conversation.
///
/// The start timestamp is the first chat-log line tagged with the id; the
/// duration is the distance to the last such line, defined only when the log
/// holds at least two occurrences. A single-occurrence conversation has a
/// timestamp but no duration.
///
/// Unknown roles count toward `message_count` but toward neither role bucket.
pub fn summarize(
    id: &str,
    messages: &[Message],
    log_text: Option<&str>,
) -> ConversationSummary {
    let user_messages = messages.iter().filter(|m| m.role == Role::User).count();
    let assistant_messages = messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .count();

    let timestamps = log_text
        .map(|text| store::conversation_timestamps(text, id))
        .unwrap_or_default();

    let timestamp = timestamps.first().copied();
    let duration_seconds = if timestamps.len() >= 2 {
        timestamps
            .last()
            .zip(timestamps.first())
            .map(|(last, first)| (*last - *first).num_seconds())
    } else {
        None
    };

    ConversationSummary {
        id: id.to_string(),
        timestamp,
        duration_seconds,
        message_count: messages.len(),
        user_messages,
        assistant_messages,
    }
}

/// Reduce summaries to global metrics. Order-independent.
pub fn aggregate(summaries: &[ConversationSummary]) -> Metrics {
    let total_conversations = summaries.len();
    let total_messages: usize = summaries.iter().map(|s| s.message_count).sum();
    let total_user_messages: usize = summaries.iter().map(|s| s.user_messages).sum();
    let total_assistant_messages: usize = summaries.iter().map(|s| s.assistant_messages).sum();

    let average_messages_per_conversation = if total_conversations > 0 {
        round1(total_messages as f64 / total_conversations as f64)
    } else {
        0.0
    };
    let response_rate = if total_user_messages > 0 {
        round1(100.0 * total_assistant_messages as f64 / total_user_messages as f64)
    } else {
        0.0
    };

    Metrics {
        total_conversations,
        total_messages,
        total_user_messages,
        total_assistant_messages,
        average_messages_per_conversation,
        response_rate,
    }
}

/// Sort summaries newest-first. Summaries without a timestamp sort as the
/// epoch (oldest position), they are not dropped.
pub fn sort_by_recency(summaries: &mut [ConversationSummary]) {
    summaries.sort_by(|a, b| {
        let a_ts = a.timestamp.unwrap_or_default();
        let b_ts = b.timestamp.unwrap_or_default();
        b_ts.cmp(&a_ts)
    });
}

/// Bucket summaries by calendar period of their start timestamp (local-time
/// calendar semantics). Summaries lacking a timestamp are skipped entirely.
///
/// Keys: `YYYY-MM-DD` (day), `YYYY-Www` (ISO week), `YYYY-MM` (month).
pub fn bucket_by_period(
    summaries: &[ConversationSummary],
    granularity: Granularity,
) -> BTreeMap<String, PeriodBucket> {
    let mut buckets: BTreeMap<String, PeriodBucket> = BTreeMap::new();

    for summary in summaries {
        let ts = match summary.timestamp {
            Some(ts) => ts,
            None => continue,
        };

        let key = match granularity {
            Granularity::Day => ts.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let week = ts.date().iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => ts.format("%Y-%m").to_string(),
        };

        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        bucket.messages += summary.message_count as u64;
    }

    buckets
}

/// Result of analyzing a whole transcript directory.
#[derive(Debug, Default)]
pub struct ConversationReport {
    pub metrics: Metrics,
    /// Summaries sorted newest-first
    pub conversations: Vec<ConversationSummary>,
    /// Ids of transcripts that failed to parse and were excluded
    pub skipped: Vec<String>,
}

/// Summarize and aggregate every transcript in the store.
///
/// A corrupt transcript is skipped (and recorded) without aborting the run;
/// a missing chat log yields summaries with no timestamp or duration.
pub fn analyze_directory(
    store: &TranscriptStore,
    log_text: Option<&str>,
) -> ConversationReport {
    let ids = match store.list_ids() {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to scan transcript directory");
            return ConversationReport::default();
        }
    };

    let mut conversations = Vec::new();
    let mut skipped = Vec::new();

    for id in ids {
        match store.read(&id) {
            Ok(Some(messages)) => conversations.push(summarize(&id, &messages, log_text)),
            Ok(None) => {}
            Err(Error::Parse { file, message }) => {
                tracing::warn!(%file, %message, "Skipping corrupt transcript");
                skipped.push(id);
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "Skipping unreadable transcript");
                skipped.push(id);
            }
        }
    }

    let metrics = aggregate(&conversations);
    sort_by_recency(&mut conversations);

    ConversationReport {
        metrics,
        conversations,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn msgs(user: usize, assistant: usize) -> Vec<Message> {
        let mut out = Vec::new();
        for i in 0..user {
            out.push(Message::user(format!("u{}", i)));
        }
        for i in 0..assistant {
            out.push(Message::assistant(format!("a{}", i)));
        }
        out
    }

    const LOG: &str = "[2024-01-01 10:00:00] [ID: conv_abc] Utilisateur: hi\n\
                       [2024-01-01 10:05:30] [ID: conv_abc] Absa: hello\n\n";

    #[test]
    fn summarize_matches_reference_scenario() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let summary = summarize("conv_abc", &messages, Some(LOG));

        assert_eq!(
            summary.timestamp,
            Some(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(summary.duration_seconds, Some(330));
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.user_messages, 1);
        assert_eq!(summary.assistant_messages, 1);
    }

    #[test]
    fn role_counts_always_sum_to_message_count_for_well_formed_transcripts() {
        for (u, a) in [(0, 0), (1, 0), (3, 3), (5, 2)] {
            let summary = summarize("conv_x", &msgs(u, a), None);
            assert_eq!(
                summary.user_messages + summary.assistant_messages,
                summary.message_count
            );
        }
    }

    #[test]
    fn unknown_roles_count_in_total_but_in_neither_bucket() {
        let messages: Vec<Message> = serde_json::from_str(
            r#"[{"role":"user","content":"q"},{"role":"system","content":"s"},{"role":"assistant","content":"a"}]"#,
        )
        .unwrap();
        let summary = summarize("conv_x", &messages, None);
        assert_eq!(summary.message_count, 3);
        assert_eq!(summary.user_messages, 1);
        assert_eq!(summary.assistant_messages, 1);
    }

    #[test]
    fn single_log_occurrence_has_timestamp_but_no_duration() {
        let log = "[2024-01-01 10:00:00] [ID: conv_solo] Utilisateur: hi\n";
        let summary = summarize("conv_solo", &msgs(1, 0), Some(log));
        assert!(summary.timestamp.is_some());
        assert_eq!(summary.duration_seconds, None);
    }

    #[test]
    fn missing_log_degrades_to_no_timestamp() {
        let summary = summarize("conv_abc", &msgs(2, 2), None);
        assert_eq!(summary.timestamp, None);
        assert_eq!(summary.duration_seconds, None);
        assert_eq!(summary.message_count, 4);
    }

    #[test]
    fn aggregate_is_order_independent() {
        let mut summaries = vec![
            summarize("conv_a", &msgs(2, 2), None),
            summarize("conv_b", &msgs(1, 1), None),
            summarize("conv_c", &msgs(4, 3), None),
        ];
        let forward = aggregate(&summaries);
        summaries.reverse();
        let backward = aggregate(&summaries);
        assert_eq!(forward, backward);

        assert_eq!(forward.total_conversations, 3);
        assert_eq!(forward.total_messages, 13);
        assert_eq!(forward.average_messages_per_conversation, 4.3);
        // 6 assistant / 7 user
        assert_eq!(forward.response_rate, 85.7);
    }

    #[test]
    fn aggregate_of_nothing_is_all_zero() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics, Metrics::default());
    }

    #[test]
    fn recency_sort_puts_untimestamped_last() {
        let log = "[2024-01-01 10:00:00] [ID: conv_old] Utilisateur: a\n\
                   [2024-02-01 10:00:00] [ID: conv_new] Utilisateur: b\n";
        let mut summaries = vec![
            summarize("conv_none", &msgs(1, 0), Some(log)),
            summarize("conv_old", &msgs(1, 0), Some(log)),
            summarize("conv_new", &msgs(1, 0), Some(log)),
        ];
        sort_by_recency(&mut summaries);
        let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["conv_new", "conv_old", "conv_none"]);
    }

    #[test]
    fn period_buckets_skip_untimestamped_summaries() {
        let log = "[2024-01-01 10:00:00] [ID: conv_a] Utilisateur: a\n\
                   [2024-01-01 11:00:00] [ID: conv_b] Utilisateur: b\n\
                   [2024-02-15 09:00:00] [ID: conv_c] Utilisateur: c\n";
        let summaries = vec![
            summarize("conv_a", &msgs(1, 1), Some(log)),
            summarize("conv_b", &msgs(2, 2), Some(log)),
            summarize("conv_c", &msgs(1, 0), Some(log)),
            summarize("conv_unlogged", &msgs(9, 9), Some(log)),
        ];

        let days = bucket_by_period(&summaries, Granularity::Day);
        assert_eq!(days.len(), 2);
        assert_eq!(
            days["2024-01-01"],
            PeriodBucket {
                count: 2,
                messages: 6
            }
        );
        assert_eq!(
            days["2024-02-15"],
            PeriodBucket {
                count: 1,
                messages: 1
            }
        );

        let months = bucket_by_period(&summaries, Granularity::Month);
        assert_eq!(months["2024-01"].count, 2);

        let weeks = bucket_by_period(&summaries, Granularity::Week);
        assert_eq!(weeks["2024-W01"].count, 2);
    }

    #[test]
    fn analyze_directory_skips_corrupt_transcripts() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path());
        store.write("conv_ok", &msgs(1, 1)).unwrap();
        std::fs::write(dir.path().join("conv_bad.json"), "][").unwrap();

        let report = analyze_directory(&store, Some(LOG));
        assert_eq!(report.metrics.total_conversations, 1);
        assert_eq!(report.skipped, vec!["conv_bad"]);
    }
}
