// src/conflict/merge.rs

//! Format-aware merge implementations.
//!
//! JSON merges structurally, Markdown concatenates with a separator, and
//! everything else that is valid UTF-8 goes through a line-based three-way
//! merge (diff3 against a base when one is supplied, else a line-aligned
//! merge that emits conflict markers). Binary content cannot be merged.

use crate::error::{Error, Result};
use serde_json::Value;

use super::types::{ArrayMergeStrategy, MergeOptions};

/// Conflict marker opening the existing side
pub const MARKER_OURS: &str = "<<<<<<< OURS";
/// Conflict marker separating the two sides
pub const MARKER_SEP: &str = "=======";
/// Conflict marker closing the incoming side
pub const MARKER_THEIRS: &str = ">>>>>>> THEIRS";

/// Result of a text merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMerge {
    pub content: String,
    /// Number of conflict blocks emitted
    pub conflicts: usize,
}

/// Merge two JSON documents structurally.
///
/// Keys unique to either side are always kept. With `deep_merge`, shared
/// object keys recurse and shared arrays follow the configured strategy;
/// otherwise the incoming value wins for every shared key.
pub fn merge_json(existing: &[u8], incoming: &[u8], options: &MergeOptions) -> Result<Vec<u8>> {
    let existing: Value = serde_json::from_slice(existing)?;
    let incoming: Value = serde_json::from_slice(incoming)?;

    let merged = merge_values(existing, incoming, options);
    Ok(serde_json::to_vec_pretty(&merged)?)
}

fn merge_values(existing: Value, incoming: Value, options: &MergeOptions) -> Value {
    match (existing, incoming) {
        (Value::Object(mut existing), Value::Object(incoming)) => {
            for (key, incoming_value) in incoming {
                match existing.remove(&key) {
                    Some(existing_value) if options.deep_merge => {
                        existing.insert(key, merge_values(existing_value, incoming_value, options));
                    }
                    // Shared key, shallow merge: incoming wins.
                    _ => {
                        existing.insert(key, incoming_value);
                    }
                }
            }
            Value::Object(existing)
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            Value::Array(merge_arrays(existing, incoming, options.array_strategy))
        }
        // Mixed types or scalars: incoming wins.
        (_, incoming) => incoming,
    }
}

fn merge_arrays(
    existing: Vec<Value>,
    incoming: Vec<Value>,
    strategy: ArrayMergeStrategy,
) -> Vec<Value> {
    match strategy {
        ArrayMergeStrategy::Replace => incoming,
        ArrayMergeStrategy::Concat => {
            let mut merged = existing;
            merged.extend(incoming);
            merged
        }
        ArrayMergeStrategy::Unique => {
            let mut merged: Vec<Value> = Vec::new();
            for value in existing.into_iter().chain(incoming) {
                if !merged.contains(&value) {
                    merged.push(value);
                }
            }
            merged
        }
    }
}

/// Merge two Markdown documents by concatenation with a `---` separator.
///
/// With `preserve_comments`, leading HTML/`//` comment lines from the
/// existing document are hoisted to the top and the incoming document is
/// stripped of its own leading comments (they would otherwise duplicate the
/// hoisted block).
pub fn merge_markdown(existing: &str, incoming: &str, preserve_comments: bool) -> String {
    if !preserve_comments {
        return format!(
            "{}\n\n---\n\n{}",
            existing.trim_end(),
            incoming.trim_start()
        );
    }

    let (comments, existing_body) = split_leading_comments(existing);
    let (_, incoming_body) = split_leading_comments(incoming);

    let mut merged = String::new();
    if !comments.is_empty() {
        merged.push_str(&comments);
        merged.push('\n');
    }
    merged.push_str(existing_body.trim_start().trim_end());
    merged.push_str("\n\n---\n\n");
    merged.push_str(incoming_body.trim_start());
    merged
}

/// Split a document into its leading comment lines and the remainder
fn split_leading_comments(text: &str) -> (String, &str) {
    let mut offset = 0;
    let mut comments = String::new();

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        let is_comment = (trimmed.starts_with("<!--") && trimmed.ends_with("-->"))
            || trimmed.starts_with("//");
        if is_comment || trimmed.is_empty() && !comments.is_empty() {
            if is_comment {
                comments.push_str(trimmed);
                comments.push('\n');
            }
            offset += line.len();
        } else {
            break;
        }
    }

    if comments.is_empty() {
        (comments, text)
    } else {
        (comments.trim_end().to_string(), &text[offset..])
    }
}

/// Three-way merge of plain-text content.
///
/// With a base, runs a line-wise diff3: a side that left a line unchanged
/// yields to the side that edited it; when both edited the same line, the
/// block becomes a conflict. Without a base, existing and incoming are
/// aligned line-by-line and every differing run becomes a conflict block.
pub fn merge_text(base: Option<&str>, existing: &str, incoming: &str) -> TextMerge {
    match base {
        Some(base) => diff3(base, existing, incoming),
        None => aligned_merge(existing, incoming),
    }
}

fn diff3(base: &str, ours: &str, theirs: &str) -> TextMerge {
    let base: Vec<&str> = base.lines().collect();
    let ours: Vec<&str> = ours.lines().collect();
    let theirs: Vec<&str> = theirs.lines().collect();

    let len = base.len().max(ours.len()).max(theirs.len());
    let mut out: Vec<String> = Vec::new();
    let mut conflicts = 0;
    let mut pending: Option<(Vec<String>, Vec<String>)> = None;

    for i in 0..len {
        let b = base.get(i).copied();
        let o = ours.get(i).copied();
        let t = theirs.get(i).copied();

        let resolved = if o == t {
            o
        } else if o == b {
            t
        } else if t == b {
            o
        } else {
            // Both sides changed the line differently.
            let (our_block, their_block) =
                pending.get_or_insert_with(|| (Vec::new(), Vec::new()));
            if let Some(line) = o {
                our_block.push(line.to_string());
            }
            if let Some(line) = t {
                their_block.push(line.to_string());
            }
            continue;
        };

        flush_conflict(&mut out, &mut pending, &mut conflicts);
        if let Some(line) = resolved {
            out.push(line.to_string());
        }
    }
    flush_conflict(&mut out, &mut pending, &mut conflicts);

    TextMerge {
        content: join_lines(out),
        conflicts,
    }
}

fn aligned_merge(ours: &str, theirs: &str) -> TextMerge {
    let ours: Vec<&str> = ours.lines().collect();
    let theirs: Vec<&str> = theirs.lines().collect();

    let len = ours.len().max(theirs.len());
    let mut out: Vec<String> = Vec::new();
    let mut conflicts = 0;
    let mut pending: Option<(Vec<String>, Vec<String>)> = None;

    for i in 0..len {
        let o = ours.get(i).copied();
        let t = theirs.get(i).copied();

        if o == t {
            flush_conflict(&mut out, &mut pending, &mut conflicts);
            if let Some(line) = o {
                out.push(line.to_string());
            }
        } else {
            let (our_block, their_block) =
                pending.get_or_insert_with(|| (Vec::new(), Vec::new()));
            if let Some(line) = o {
                our_block.push(line.to_string());
            }
            if let Some(line) = t {
                their_block.push(line.to_string());
            }
        }
    }
    flush_conflict(&mut out, &mut pending, &mut conflicts);

    TextMerge {
        content: join_lines(out),
        conflicts,
    }
}

/// Emit a pending run of differing lines as one conflict block
fn flush_conflict(
    out: &mut Vec<String>,
    pending: &mut Option<(Vec<String>, Vec<String>)>,
    conflicts: &mut usize,
) {
    if let Some((ours, theirs)) = pending.take() {
        *conflicts += 1;
        out.push(MARKER_OURS.to_string());
        out.extend(ours);
        out.push(MARKER_SEP.to_string());
        out.extend(theirs);
        out.push(MARKER_THEIRS.to_string());
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut joined = lines.join("\n");
    if !joined.is_empty() {
        joined.push('\n');
    }
    joined
}

/// Whether content should be treated as binary (unmergeable)
pub fn is_binary(content: &[u8]) -> bool {
    content.contains(&0) || std::str::from_utf8(content).is_err()
}

/// Decode merge input, failing with a merge error for binary content
pub fn require_text<'a>(path: &str, content: &'a [u8]) -> Result<&'a str> {
    if is_binary(content) {
        return Err(Error::Merge {
            path: path.to_string(),
            reason: "binary content cannot be merged".to_string(),
        });
    }
    std::str::from_utf8(content).map_err(|e| Error::Merge {
        path: path.to_string(),
        reason: format!("content is not valid UTF-8: {}", e),
    })
}
