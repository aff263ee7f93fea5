//! Retrieval settings.
//!
//! Values come from an optional JSON file, then `RAG_*` environment variables,
//! then whatever the binary's flags override.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Scores at or below this are never returned.
pub const DEFAULT_MIN_SCORE: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub docs_dir: PathBuf,
    /// Matched at any depth below `docs_dir`.
    pub recursive_extension: String,
    /// Matched only directly inside `docs_dir`.
    pub legacy_extension: String,
    /// Filenames starting with this get a bracketed citation label.
    pub citation_prefix: String,
    pub min_score: f32,
    pub default_k: usize,
    pub stem: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("rag_docs"),
            recursive_extension: "md".into(),
            legacy_extension: "txt".into(),
            citation_prefix: "Doc".into(),
            min_score: DEFAULT_MIN_SCORE,
            default_k: 3,
            stem: false,
        }
    }
}

impl RetrievalConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config { path: path.to_path_buf(), message: e.to_string() })?;
        Self::from_json(&raw)
            .and_then(|c| c.validate().map(|()| c))
            .map_err(|message| Error::Config { path: path.to_path_buf(), message })
    }

    /// `min_score` must lie in [0, 1], the range of cosine scores, and `default_k` must be positive.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !valid_min_score(self.min_score) {
            return Err(format!("min_score must be within [0, 1], got {}", self.min_score));
        }
        if self.default_k == 0 {
            return Err("default_k must be a positive integer".into());
        }
        Ok(())
    }

    fn from_json(raw: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    /// Overrides from `RAG_DOCS_DIR` and `RAG_MIN_SCORE`. Unparseable or out-of-range scores are ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("RAG_DOCS_DIR") {
            if !dir.trim().is_empty() { self.docs_dir = PathBuf::from(dir); }
        }
        if let Ok(raw) = std::env::var("RAG_MIN_SCORE") {
            match raw.trim().parse::<f32>() {
                Ok(v) if valid_min_score(v) => self.min_score = v,
                _ => tracing::warn!(value = %raw, "ignoring invalid RAG_MIN_SCORE"),
            }
        }
        self
    }
}

fn valid_min_score(v: f32) -> bool { (0.0..=1.0).contains(&v) }
