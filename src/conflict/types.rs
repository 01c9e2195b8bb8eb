// src/conflict/types.rs

//! Conflict and resolution data types.
//!
//! A [`FileConflict`] is transient: it is created per deployment attempt,
//! carries both sides' content and metadata through resolution, and is
//! discarded once resolutions are applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why an incoming file conflicts with the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Both sides exist with different bytes
    ContentMismatch,
    /// A directory occupies the path the incoming file needs
    DirectoryBlocksFile,
}

/// Metadata captured from the existing side of a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingMeta {
    pub size: u64,
    /// Filesystem mtime, when the platform reports one
    pub mtime: Option<DateTime<Utc>>,
    /// SHA-256 of the existing content
    pub hash: String,
}

/// Metadata for the incoming side of a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMeta {
    pub size: u64,
    /// SHA-256 of the incoming content
    pub hash: String,
}

/// One file-level conflict between the workspace and a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConflict {
    /// Workspace-relative path
    pub path: String,
    pub conflict_type: ConflictType,
    /// Existing content; absent when a directory blocks the path
    pub existing_content: Option<Vec<u8>>,
    pub incoming_content: Option<Vec<u8>>,
    pub existing_meta: Option<ExistingMeta>,
    pub incoming_meta: IncomingMeta,
    /// Strategy that resolved this conflict, once resolution ran
    pub resolution: Option<ResolutionStrategy>,
    /// Content to write, once resolution ran (absent for skips)
    pub resolved_content: Option<Vec<u8>>,
}

/// How to resolve conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Incoming content wins
    Overwrite,
    /// Existing content stays; nothing is written
    Skip,
    /// Format-aware merge of both sides
    Merge,
    /// Back up the existing file, then take the incoming content
    Backup,
    /// Ask a caller-supplied callback per file
    Interactive,
}

/// How shared array keys merge in a JSON structural merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMergeStrategy {
    /// Incoming array replaces the existing one
    #[default]
    Replace,
    /// Existing followed by incoming
    Concat,
    /// Concatenation with duplicates removed (first occurrence wins)
    Unique,
}

/// Options for format-aware merges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Recurse into shared object keys instead of letting incoming replace
    /// the whole value
    pub deep_merge: bool,
    pub array_strategy: ArrayMergeStrategy,
    /// Hoist leading comment lines when merging Markdown
    pub preserve_comments: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            deep_merge: true,
            array_strategy: ArrayMergeStrategy::Replace,
            preserve_comments: false,
        }
    }
}

/// Per-file strategy chooser for interactive resolution
pub type InteractiveCallback = Box<dyn Fn(&FileConflict) -> ResolutionStrategy + Send + Sync>;

/// Options for a resolution batch
#[derive(Default)]
pub struct ResolveOptions {
    /// Where `Backup` writes the preserved copies
    pub backup_dir: Option<PathBuf>,
    pub merge: MergeOptions,
    /// Base contents for three-way text merges, keyed by conflict path
    pub merge_bases: std::collections::BTreeMap<String, Vec<u8>>,
    /// Required when the batch strategy is `Interactive`
    pub interactive: Option<InteractiveCallback>,
}

impl std::fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("backup_dir", &self.backup_dir)
            .field("merge", &self.merge)
            .field("merge_bases", &self.merge_bases.keys())
            .field("interactive", &self.interactive.is_some())
            .finish()
    }
}

/// Outcome of resolving a batch of conflicts
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    /// Conflicts with a resolution and (except skips) resolved content
    pub resolved: Vec<FileConflict>,
    /// Conflicts that were skipped or failed to resolve
    pub skipped: Vec<FileConflict>,
    /// One message per failed conflict
    pub errors: Vec<String>,
}

/// Outcome of applying resolved contents to the workspace
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Paths written successfully
    pub applied: Vec<String>,
    /// (path, error) for writes that failed
    pub failed: Vec<(String, String)>,
}

/// Line-level difference summary between two file versions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffAnalysis {
    pub additions: usize,
    pub deletions: usize,
    /// min(additions, deletions): lines changed in place
    pub modifications: usize,
    /// unchanged / total * 100
    pub similarity: f64,
}
