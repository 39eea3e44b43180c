//! Shared plain-text chat log
//!
//! One file for all conversations, append-only, never rewritten. Each turn
//! adds two lines (user then assistant) plus a blank separator line. This log
//! is the sole source of per-conversation start/end timestamps, recovered by
//! scanning for lines tagged with the conversation id.

use crate::error::Result;
use crate::logline;
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Speaker label for user lines.
pub const USER_SPEAKER: &str = "Utilisateur";

/// Append/read access to the chat log file.
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one completed turn. Both lines carry the same timestamp.
    ///
    /// Message text is flattened to a single line so the log grammar holds.
    pub fn append_turn(
        &self,
        timestamp: NaiveDateTime,
        conversation_id: &str,
        user_text: &str,
        bot_name: &str,
        assistant_text: &str,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let user_line = logline::format_line(
            timestamp,
            conversation_id,
            USER_SPEAKER,
            &flatten(user_text),
        );
        let assistant_line = logline::format_line(
            timestamp,
            conversation_id,
            bot_name,
            &flatten(assistant_text),
        );

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}\n{}\n", user_line, assistant_line)?;
        Ok(())
    }

    /// Read the whole log. `Ok(None)` when the file does not exist yet.
    pub fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Timestamps of every log line tagged with the given conversation id,
/// in line order. Malformed lines are skipped.
pub fn conversation_timestamps(log_text: &str, conversation_id: &str) -> Vec<NaiveDateTime> {
    log_text
        .lines()
        .filter_map(logline::parse)
        .filter(|entry| entry.conversation_id == conversation_id)
        .map(|entry| entry.timestamp)
        .collect()
}

/// First and last log timestamps for one conversation id.
///
/// Returns `None` when the log has no matching line. When only one line
/// matches, first == last and the derived duration is undefined, not zero.
pub fn conversation_window(
    log_text: &str,
    conversation_id: &str,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let timestamps = conversation_timestamps(log_text, conversation_id);
    timestamps.first().copied().zip(timestamps.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn append_turn_writes_two_tagged_lines() {
        let dir = TempDir::new().unwrap();
        let log = ChatLog::new(dir.path().join("conversations-log.txt"));

        log.append_turn(ts(10, 0, 0), "conv_abc", "hi", "Absa", "hello")
            .unwrap();

        let content = log.read().unwrap().unwrap();
        assert_eq!(
            content,
            "[2024-01-01 10:00:00] [ID: conv_abc] Utilisateur: hi\n\
             [2024-01-01 10:00:00] [ID: conv_abc] Absa: hello\n\n"
        );
    }

    #[test]
    fn multiline_text_is_flattened_to_keep_grammar() {
        let dir = TempDir::new().unwrap();
        let log = ChatLog::new(dir.path().join("log.txt"));
        log.append_turn(ts(9, 0, 0), "conv_x", "line1\nline2", "Absa", "ok")
            .unwrap();

        let content = log.read().unwrap().unwrap();
        let parsed: Vec<_> = content
            .lines()
            .filter_map(crate::logline::parse)
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "line1 line2");
    }

    #[test]
    fn missing_log_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let log = ChatLog::new(dir.path().join("absent.txt"));
        assert!(log.read().unwrap().is_none());
    }

    #[test]
    fn window_spans_first_to_last_occurrence() {
        let text = "[2024-01-01 10:00:00] [ID: conv_abc] Utilisateur: hi\n\
                    [2024-01-01 10:00:00] [ID: conv_abc] Absa: hello\n\n\
                    [2024-01-01 10:02:00] [ID: conv_other] Utilisateur: salut\n\
                    [2024-01-01 10:05:30] [ID: conv_abc] Utilisateur: more\n";

        let (first, last) = conversation_window(text, "conv_abc").unwrap();
        assert_eq!(first, ts(10, 0, 0));
        assert_eq!(last, ts(10, 5, 30));

        assert!(conversation_window(text, "conv_missing").is_none());
    }
}
