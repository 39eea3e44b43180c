//! Chat-log line parser
//!
//! The shared plain-text chat log is the sole source of per-conversation
//! timestamps. Each line follows the grammar
//!
//! ```text
//! [YYYY-MM-DD HH:MM:SS] [ID: <conversation id>] <Speaker>: <text>
//! ```
//!
//! This module is the only place that grammar is known; everything else
//! consumes [`parse`]. Lines that do not match return `None` and are skipped
//! by callers — a damaged log degrades analytics, it never aborts them.

use chrono::NaiveDateTime;

/// Timestamp format used throughout the chat log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One structurally valid chat-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub conversation_id: String,
    pub speaker: String,
    pub text: String,
}

/// Parse one chat-log line. Returns `None` for anything that does not match
/// the grammar, including blank separator lines.
pub fn parse(line: &str) -> Option<LogEntry> {
    // Leading bracketed timestamp
    let rest = line.strip_prefix('[')?;
    let (ts_str, rest) = rest.split_once(']')?;
    let timestamp = NaiveDateTime::parse_from_str(ts_str, TIMESTAMP_FORMAT).ok()?;

    // Conversation id tag
    let rest = rest.strip_prefix(' ')?;
    let rest = rest.strip_prefix("[ID: ")?;
    let (conversation_id, rest) = rest.split_once(']')?;
    if conversation_id.is_empty() {
        return None;
    }

    // Speaker and message text; the text itself may contain colons
    let rest = rest.strip_prefix(' ')?;
    let (speaker, text) = rest.split_once(": ")?;
    if speaker.is_empty() {
        return None;
    }

    Some(LogEntry {
        timestamp,
        conversation_id: conversation_id.to_string(),
        speaker: speaker.to_string(),
        text: text.to_string(),
    })
}

/// Format a log line for appending. Inverse of [`parse`] for single-line text.
pub fn format_line(
    timestamp: NaiveDateTime,
    conversation_id: &str,
    speaker: &str,
    text: &str,
) -> String {
    format!(
        "[{}] [ID: {}] {}: {}",
        timestamp.format(TIMESTAMP_FORMAT),
        conversation_id,
        speaker,
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_well_formed_line() {
        let entry =
            parse("[2024-01-01 10:00:00] [ID: conv_abc] Utilisateur: hi there").unwrap();
        assert_eq!(
            entry.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(entry.conversation_id, "conv_abc");
        assert_eq!(entry.speaker, "Utilisateur");
        assert_eq!(entry.text, "hi there");
    }

    #[test]
    fn text_may_contain_colons_and_brackets() {
        let entry =
            parse("[2024-01-01 10:05:30] [ID: conv_abc] Absa: see: https://example.com [1]")
                .unwrap();
        assert_eq!(entry.speaker, "Absa");
        assert_eq!(entry.text, "see: https://example.com [1]");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse("").is_none());
        assert!(parse("not a log line").is_none());
        assert!(parse("[2024-13-01 10:00:00] [ID: conv_a] X: y").is_none());
        assert!(parse("[2024-01-01 10:00:00] conv_a X: y").is_none());
        assert!(parse("[2024-01-01 10:00:00] [ID: ] X: y").is_none());
        assert!(parse("[2024-01-01 10:00:00] [ID: conv_a] no-speaker-separator").is_none());
    }

    #[test]
    fn format_then_parse_round_trips() {
        let ts = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap();
        let line = format_line(ts, "conv_42", "Utilisateur", "où est la gare ?");
        let entry = parse(&line).unwrap();
        assert_eq!(entry.timestamp, ts);
        assert_eq!(entry.text, "où est la gare ?");
    }
}
