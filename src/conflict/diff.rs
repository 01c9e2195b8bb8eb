// src/conflict/diff.rs

//! Line-level difference analysis for conflict reporting.

use super::types::DiffAnalysis;

/// Compare two text versions line-by-line.
///
/// Lines are matched positionally: a differing pair counts as one addition
/// plus one deletion, and surplus tail lines count on their side alone.
/// `modifications` is the number of lines changed in place, `similarity`
/// the percentage of positions left unchanged.
pub fn analyze_differences(existing: &str, incoming: &str) -> DiffAnalysis {
    let existing: Vec<&str> = existing.lines().collect();
    let incoming: Vec<&str> = incoming.lines().collect();

    let common = existing.len().min(incoming.len());
    let total = existing.len().max(incoming.len());

    let mut unchanged = 0;
    let mut additions = 0;
    let mut deletions = 0;

    for i in 0..common {
        if existing[i] == incoming[i] {
            unchanged += 1;
        } else {
            additions += 1;
            deletions += 1;
        }
    }
    additions += incoming.len() - common;
    deletions += existing.len() - common;

    let similarity = if total == 0 {
        100.0
    } else {
        unchanged as f64 / total as f64 * 100.0
    };

    DiffAnalysis {
        additions,
        deletions,
        modifications: additions.min(deletions),
        similarity,
    }
}
