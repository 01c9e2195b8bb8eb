// src/platform.rs

//! The closed set of supported IDE platforms.
//!
//! Platforms are an exhaustively-matched enum rather than free strings so
//! that adding a platform is a compile-time obligation everywhere platform
//! behavior branches (validator rules, mapping registry, converters).

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// An AI coding-assistant platform the engine can convert between
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// AWS Kiro (steering documents, specs, agent hooks)
    Kiro,
    /// Claude Code (CLAUDE.md, slash commands, subagents)
    ClaudeCode,
    /// Cursor (.cursorrules, extensions)
    Cursor,
}

impl Platform {
    /// All platforms in declaration order.
    ///
    /// Declaration order is also the tie-break order when source-platform
    /// detection has to scan populated data buckets.
    pub fn all() -> &'static [Platform] {
        &[Platform::Kiro, Platform::ClaudeCode, Platform::Cursor]
    }

    /// The platform's wire name as used in context data buckets
    pub fn wire_name(&self) -> &'static str {
        match self {
            Platform::Kiro => "kiro",
            Platform::ClaudeCode => "claude-code",
            Platform::Cursor => "cursor",
        }
    }
}
