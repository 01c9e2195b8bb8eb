// src/conflict/detect.rs

//! Conflict detection against an existing workspace.
//!
//! Detection iterates incoming files strictly sequentially so that conflict
//! reports (and later backup ordering) are deterministic. Byte-identical
//! files are not conflicts; anything differing yields exactly one
//! [`FileConflict`] carrying both contents and their SHA-256 hashes.

use crate::error::{Error, Result};
use crate::hash::sha256;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use super::types::{ConflictType, ExistingMeta, FileConflict, IncomingMeta};

/// Validate and compute a safe path within the workspace root.
///
/// Rejects `..` components outright instead of resolving them, so a crafted
/// incoming path can never escape the deployment target.
pub(crate) fn safe_workspace_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let trimmed = relative.trim_start_matches('/');

    let mut normalized = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                warn!("path traversal attempt detected: {}", relative);
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("path traversal detected: {}", relative),
                )));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty path after normalization",
        )));
    }

    Ok(root.join(normalized))
}

/// Detect conflicts between incoming files and the workspace at `root`.
///
/// `incoming` maps workspace-relative paths to the bytes a deployment would
/// write. Paths that do not exist yet never conflict; identical existing
/// files are silently fine.
pub fn detect_conflicts(
    root: &Path,
    incoming: &BTreeMap<String, Vec<u8>>,
) -> Result<Vec<FileConflict>> {
    let mut conflicts = Vec::new();

    for (path, content) in incoming {
        let target = safe_workspace_path(root, path)?;

        if !target.exists() {
            continue;
        }

        if target.is_dir() {
            debug!("directory blocks incoming file: {}", path);
            conflicts.push(FileConflict {
                path: path.clone(),
                conflict_type: ConflictType::DirectoryBlocksFile,
                existing_content: None,
                incoming_content: Some(content.clone()),
                existing_meta: None,
                incoming_meta: IncomingMeta {
                    size: content.len() as u64,
                    hash: sha256(content),
                },
                resolution: None,
                resolved_content: None,
            });
            continue;
        }

        let existing = fs::read(&target)?;
        if existing == *content {
            continue;
        }

        let metadata = fs::metadata(&target)?;
        let mtime: Option<DateTime<Utc>> = metadata.modified().ok().map(DateTime::from);

        debug!("content conflict at {}", path);
        conflicts.push(FileConflict {
            path: path.clone(),
            conflict_type: ConflictType::ContentMismatch,
            existing_meta: Some(ExistingMeta {
                size: existing.len() as u64,
                mtime,
                hash: sha256(&existing),
            }),
            incoming_meta: IncomingMeta {
                size: content.len() as u64,
                hash: sha256(content),
            },
            existing_content: Some(existing),
            incoming_content: Some(content.clone()),
            resolution: None,
            resolved_content: None,
        });
    }

    Ok(conflicts)
}
