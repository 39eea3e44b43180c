//! Flat-file persistence layer
//!
//! Everything the system stores lives in plain files under the configured
//! data directory:
//!
//! - `conversations/conv_*.json` — one pretty-printed transcript per
//!   conversation, fully rewritten on every turn
//! - `conversations/conversations-log.txt` — the shared append-only chat log,
//!   two lines per turn
//! - `logs/links_log.jsonl` — the append-only link event log, one JSON object
//!   per line (the legacy whole-array `links_log.json` remains readable)
//!
//! There is no database: per the resource model, every request re-reads what
//! it needs from disk.

mod chat_log;
mod events;
mod transcripts;

pub use chat_log::{conversation_timestamps, conversation_window, ChatLog, USER_SPEAKER};
pub use events::EventLogStore;
pub use transcripts::TranscriptStore;
