// src/conflict/mod.rs

//! File conflict detection and resolution for workspace deployments.
//!
//! Detection compares incoming files against what a workspace already
//! holds; resolution applies a strategy (overwrite, skip, merge, backup,
//! or interactive) per conflict and writes the results back. Merges are
//! format-aware: JSON merges structurally, Markdown concatenates, other
//! text content goes through a line-based three-way merge.

mod detect;
mod diff;
mod merge;
mod resolve;
mod types;

pub use detect::detect_conflicts;
pub use diff::analyze_differences;
pub use merge::{merge_json, merge_markdown, merge_text, TextMerge, MARKER_OURS, MARKER_SEP, MARKER_THEIRS};
pub use resolve::ConflictResolver;
pub use types::{
    ApplyOutcome, ArrayMergeStrategy, ConflictType, DiffAnalysis, ExistingMeta, FileConflict,
    IncomingMeta, InteractiveCallback, MergeOptions, ResolutionOutcome, ResolutionStrategy,
    ResolveOptions,
};
