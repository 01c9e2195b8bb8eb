// src/conflict/resolve.rs

//! Strategy dispatch and application of conflict resolutions.

use crate::error::{Error, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::detect::safe_workspace_path;
use super::merge::{merge_json, merge_markdown, merge_text, require_text};
use super::types::{
    ApplyOutcome, ConflictType, FileConflict, ResolutionOutcome, ResolutionStrategy,
    ResolveOptions,
};

/// Resolves detected conflicts and applies the results to a workspace
pub struct ConflictResolver {
    root: PathBuf,
}

impl ConflictResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a batch of conflicts with one strategy.
    ///
    /// Each conflict is dispatched independently; a failure (unmergeable
    /// content, backup I/O error) lands the conflict in `skipped` with a
    /// message in `errors` and never aborts the batch. `Interactive` asks
    /// the callback from `options` per conflict and re-dispatches its
    /// answer; a callback that answers `Interactive` again degrades to
    /// `Skip`.
    pub fn resolve_conflicts(
        &self,
        conflicts: Vec<FileConflict>,
        strategy: ResolutionStrategy,
        options: &ResolveOptions,
    ) -> ResolutionOutcome {
        let mut outcome = ResolutionOutcome::default();

        for mut conflict in conflicts {
            let chosen = match strategy {
                ResolutionStrategy::Interactive => match &options.interactive {
                    Some(callback) => {
                        let answer = callback(&conflict);
                        if answer == ResolutionStrategy::Interactive {
                            debug!("interactive callback deferred on {}, skipping", conflict.path);
                            ResolutionStrategy::Skip
                        } else {
                            answer
                        }
                    }
                    None => {
                        outcome
                            .errors
                            .push(format!("{}: interactive strategy without callback", conflict.path));
                        outcome.skipped.push(conflict);
                        continue;
                    }
                },
                other => other,
            };

            match self.resolve_one(&mut conflict, chosen, options) {
                Ok(true) => {
                    conflict.resolution = Some(chosen);
                    outcome.resolved.push(conflict);
                }
                Ok(false) => {
                    conflict.resolution = Some(ResolutionStrategy::Skip);
                    outcome.skipped.push(conflict);
                }
                Err(e) => {
                    warn!("failed to resolve {}: {}", conflict.path, e);
                    outcome.errors.push(format!("{}: {}", conflict.path, e));
                    outcome.skipped.push(conflict);
                }
            }
        }

        info!(
            "resolved {} conflicts, skipped {}, {} errors",
            outcome.resolved.len(),
            outcome.skipped.len(),
            outcome.errors.len()
        );
        outcome
    }

    /// Returns Ok(true) when the conflict produced content to write (or a
    /// completed backup), Ok(false) for a skip.
    fn resolve_one(
        &self,
        conflict: &mut FileConflict,
        strategy: ResolutionStrategy,
        options: &ResolveOptions,
    ) -> Result<bool> {
        match strategy {
            ResolutionStrategy::Skip => Ok(false),
            ResolutionStrategy::Overwrite => {
                conflict.resolved_content = conflict.incoming_content.clone();
                Ok(true)
            }
            ResolutionStrategy::Backup => {
                self.backup_existing(conflict, options)?;
                conflict.resolved_content = conflict.incoming_content.clone();
                Ok(true)
            }
            ResolutionStrategy::Merge => {
                conflict.resolved_content = Some(self.merge_conflict(conflict, options)?);
                Ok(true)
            }
            // Interactive is resolved to a concrete strategy by the caller.
            ResolutionStrategy::Interactive => Ok(false),
        }
    }

    fn backup_existing(&self, conflict: &FileConflict, options: &ResolveOptions) -> Result<()> {
        let backup_dir = options.backup_dir.as_deref().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "backup strategy requires a backup directory",
            ))
        })?;

        let existing = conflict.existing_content.as_deref().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no existing content to back up for {}", conflict.path),
            ))
        })?;

        let backup_name = format!("{}.backup.{}", conflict.path, Utc::now().timestamp_millis());
        let backup_path = safe_workspace_path(backup_dir, &backup_name)?;
        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&backup_path, existing)?;
        debug!("backed up {} to {}", conflict.path, backup_path.display());
        Ok(())
    }

    /// Pick a merge by file extension: `.json` merges structurally, `.md`
    /// concatenates, other text content goes through the line merge. A
    /// directory blocking a file cannot be merged.
    fn merge_conflict(&self, conflict: &FileConflict, options: &ResolveOptions) -> Result<Vec<u8>> {
        if conflict.conflict_type == ConflictType::DirectoryBlocksFile {
            return Err(Error::Merge {
                path: conflict.path.clone(),
                reason: "a directory blocks the path".to_string(),
            });
        }

        let existing = conflict.existing_content.as_deref().ok_or_else(|| Error::Merge {
            path: conflict.path.clone(),
            reason: "missing existing content".to_string(),
        })?;
        let incoming = conflict.incoming_content.as_deref().ok_or_else(|| Error::Merge {
            path: conflict.path.clone(),
            reason: "missing incoming content".to_string(),
        })?;

        let extension = Path::new(&conflict.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => merge_json(existing, incoming, &options.merge).map_err(|e| match e {
                Error::Json(e) => Error::Merge {
                    path: conflict.path.clone(),
                    reason: format!("invalid JSON: {}", e),
                },
                other => other,
            }),
            Some("md") | Some("markdown") => {
                let existing = require_text(&conflict.path, existing)?;
                let incoming = require_text(&conflict.path, incoming)?;
                Ok(merge_markdown(existing, incoming, options.merge.preserve_comments).into_bytes())
            }
            _ => {
                let existing = require_text(&conflict.path, existing)?;
                let incoming = require_text(&conflict.path, incoming)?;
                let base = options
                    .merge_bases
                    .get(&conflict.path)
                    .map(|b| require_text(&conflict.path, b))
                    .transpose()?;

                let merge = merge_text(base, existing, incoming);
                if merge.conflicts > 0 {
                    warn!(
                        "{} text merge left {} conflict markers",
                        conflict.path, merge.conflicts
                    );
                }
                Ok(merge.content.into_bytes())
            }
        }
    }

    /// Write resolved contents into the workspace.
    ///
    /// Skips (no resolved content) are ignored. Failed writes are recorded
    /// and do not stop the remaining files.
    pub fn apply_resolutions(&self, resolved: &[FileConflict]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for conflict in resolved {
            let Some(content) = conflict.resolved_content.as_deref() else {
                continue;
            };

            match self.write_one(&conflict.path, content) {
                Ok(()) => outcome.applied.push(conflict.path.clone()),
                Err(e) => {
                    warn!("failed to apply {}: {}", conflict.path, e);
                    outcome.failed.push((conflict.path.clone(), e.to_string()));
                }
            }
        }

        info!(
            "applied {} files, {} failed",
            outcome.applied.len(),
            outcome.failed.len()
        );
        outcome
    }

    fn write_one(&self, path: &str, content: &[u8]) -> Result<()> {
        let target = safe_workspace_path(&self.root, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        Ok(())
    }
}
