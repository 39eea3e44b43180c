//! Link event log
//!
//! Events are written one JSON object per line (JSONL), so a write is a
//! single append and two concurrent trackers cannot lose each other's event
//! the way the old read-whole-array/rewrite scheme could. The legacy
//! whole-array `links_log.json` format is still accepted on read, so existing
//! data keeps feeding the dashboard.
//!
//! Reads never fail: a missing file is an empty history, a malformed entry is
//! skipped with a warning, and a wholly corrupt file counts as empty.

use crate::error::Result;
use crate::types::LinkEvent;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append/read access to the link event log.
pub struct EventLogStore {
    path: PathBuf,
    legacy_path: Option<PathBuf>,
}

impl EventLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy_path: None,
        }
    }

    /// Also read events from a legacy whole-array JSON file.
    pub fn with_legacy(mut self, legacy_path: impl Into<PathBuf>) -> Self {
        self.legacy_path = Some(legacy_path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single JSONL line.
    ///
    /// Callers sharing a store across tasks must serialize appends (the
    /// server keeps the store behind a mutex).
    pub fn append(&self, event: &LinkEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(event)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read all events in append order: legacy file first (older history),
    /// then the JSONL log.
    pub fn read_all(&self) -> Vec<LinkEvent> {
        let mut events = Vec::new();

        if let Some(legacy) = &self.legacy_path {
            if let Ok(content) = std::fs::read_to_string(legacy) {
                events.extend(parse_events(&content, &legacy.display().to_string()));
            }
        }

        if let Ok(content) = std::fs::read_to_string(&self.path) {
            events.extend(parse_events(&content, &self.path.display().to_string()));
        }

        events
    }
}

/// Parse event-log content in either format. The whole-array format is
/// detected by a leading `[`; anything else is treated as JSONL.
fn parse_events(content: &str, source: &str) -> Vec<LinkEvent> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            Ok(values) => values
                .into_iter()
                .filter_map(|value| match serde_json::from_value::<LinkEvent>(value) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!(source, error = %e, "Skipping malformed link event");
                        None
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!(source, error = %e, "Corrupt event log treated as empty");
                Vec::new()
            }
        }
    } else {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<LinkEvent>(line) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(source, error = %e, "Skipping malformed event log line");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LinkEventType;
    use tempfile::TempDir;

    fn event(event_type: LinkEventType, link: &str) -> LinkEvent {
        LinkEvent {
            timestamp: "2024-01-01 10:00:00".to_string(),
            event_type,
            conversation_id: "conv_1".to_string(),
            message_id: "msg_1".to_string(),
            link: link.to_string(),
            ip: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
        }
    }

    #[test]
    fn append_then_read_all_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = EventLogStore::new(dir.path().join("links_log.jsonl"));

        store
            .append(&event(LinkEventType::LinkDetected, "https://a.example"))
            .unwrap();
        store
            .append(&event(LinkEventType::LinkClicked, "https://a.example"))
            .unwrap();

        let events = store.read_all();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, LinkEventType::LinkDetected);
        assert_eq!(events[1].event_type, LinkEventType::LinkClicked);
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = EventLogStore::new(dir.path().join("absent.jsonl"));
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn legacy_array_format_is_readable() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("links_log.json");
        std::fs::write(
            &legacy,
            r#"[
                {"timestamp":"2024-01-01 09:00:00","event_type":"link_detected","conversation_id":"conv_0","message_id":"","link":"https://old.example","ip":"1.2.3.4","user_agent":"ua"},
                {"not":"an event"}
            ]"#,
        )
        .unwrap();

        let store = EventLogStore::new(dir.path().join("links_log.jsonl")).with_legacy(&legacy);
        store
            .append(&event(LinkEventType::LinkClicked, "https://new.example"))
            .unwrap();

        let events = store.read_all();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].link, "https://old.example");
        assert_eq!(events[1].link, "https://new.example");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links_log.jsonl");
        std::fs::write(
            &path,
            "{\"timestamp\":\"2024-01-01 10:00:00\",\"event_type\":\"link_detected\",\"conversation_id\":\"conv_1\",\"link\":\"https://a\"}\nnot json\n",
        )
        .unwrap();

        let store = EventLogStore::new(&path);
        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn corrupt_array_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links_log.json");
        std::fs::write(&path, "[{\"truncated\":").unwrap();

        let store = EventLogStore::new(dir.path().join("links_log.jsonl")).with_legacy(&path);
        assert!(store.read_all().is_empty());
    }
}
