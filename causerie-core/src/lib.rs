//! # causerie-core
//!
//! Core library for causerie - a web chat widget backend with a file-backed
//! analytics dashboard.
//!
//! This library provides:
//! - Domain types for transcripts, chat-log entries, and link events
//! - Flat-file stores (per-conversation transcripts, the shared chat log,
//!   the link event log)
//! - Conversation and link analytics for the admin dashboard
//! - The HTTP client for the upstream agent completions API
//! - Configuration and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through two paths:
//! - **Chat:** relay handler → agent API → transcript file + chat log →
//!   conversation analytics
//! - **Links:** widget client events → event log → link analytics
//!
//! There is no database and no in-process state between requests: every
//! aggregation re-reads the files it needs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use causerie_core::{analytics, store::TranscriptStore, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let transcripts = TranscriptStore::new(config.conversations_dir());
//! let report = analytics::analyze_directory(&transcripts, None);
//! println!("{} conversations", report.metrics.total_conversations);
//! ```

// Re-export commonly used items at the crate root
pub use agent::AgentClient;
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod agent;
pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod logline;
pub mod store;
pub mod types;

/// Mint a fresh collision-resistant conversation id.
///
/// The `conv_` prefix keeps new transcripts discoverable by the same
/// `conv_*.json` scan that covers pre-existing data.
pub fn new_conversation_id() -> String {
    format!("conv_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_ids_are_prefixed_and_unique() {
        let a = new_conversation_id();
        let b = new_conversation_id();
        assert!(a.starts_with("conv_"));
        assert_ne!(a, b);
        assert_eq!(a.len(), "conv_".len() + 32);
    }
}
