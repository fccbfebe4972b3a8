//! In-memory Swift source tree
//!
//! A generated app is just a list of `{path, content}` records. The recovery
//! pipeline receives a snapshot, threads it through its strategies, and hands
//! back a new list - it never retains references across calls.

use serde::{Deserialize, Serialize};

/// One Swift source file. Identity is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// File name without directories, e.g. `Sources/App.swift` -> `App.swift`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Whether this file declares the app entry point.
    pub fn is_entry_point(&self) -> bool {
        self.content.contains("@main")
    }
}

/// Replace or insert files by path. Files absent from `updates` are kept.
///
/// Updates with empty content are ignored: an LLM that returns a blank file
/// must never wipe out working code.
pub fn merge_files(base: &[SourceFile], updates: Vec<SourceFile>) -> Vec<SourceFile> {
    let mut merged: Vec<SourceFile> = base.to_vec();

    for update in updates {
        if update.content.trim().is_empty() {
            continue;
        }
        match merged.iter_mut().find(|f| f.path == update.path) {
            Some(existing) => existing.content = update.content,
            None => merged.push(update),
        }
    }

    merged
}
