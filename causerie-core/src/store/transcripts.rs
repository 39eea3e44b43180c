//! Per-conversation transcript files
//!
//! A transcript is one JSON array of `{role, content}` objects in a file named
//! `<conversation id>.json`. The file is rewritten whole on every turn, so its
//! contents are always the complete ordered message sequence.

use crate::error::{Error, Result};
use crate::types::Message;
use std::path::{Path, PathBuf};

/// Read/write access to the transcript directory.
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Strip path-traversal characters from a caller-supplied id.
    pub fn sanitize_id(id: &str) -> String {
        id.replace(['/', '\\'], "").replace("..", "")
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::sanitize_id(id)))
    }

    /// Read one transcript. `Ok(None)` when the file does not exist;
    /// `Err(Parse)` when it exists but is not a valid message sequence.
    pub fn read(&self, id: &str) -> Result<Option<Vec<Message>>> {
        let path = self.path_for(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let messages: Vec<Message> =
            serde_json::from_str(&content).map_err(|e| Error::Parse {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(messages))
    }

    /// Write the complete message sequence for one conversation,
    /// pretty-printed and Unicode-preserving.
    pub fn write(&self, id: &str, messages: &[Message]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(messages)?;
        std::fs::write(self.path_for(id), json)?;
        Ok(())
    }

    /// Discover all stored conversation ids (`conv_*.json` files).
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let pattern = self.dir.join("conv_*.json");
        let pattern_str = pattern.to_string_lossy();

        let entries = glob::glob(&pattern_str).map_err(|e| Error::Parse {
            file: pattern_str.to_string(),
            message: format!("invalid glob pattern: {}", e),
        })?;

        let mut ids: Vec<String> = entries
            .flatten()
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
