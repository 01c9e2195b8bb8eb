// src/context/mod.rs

//! The platform-agnostic configuration tree.
//!
//! A [`TaptikContext`] is the bundle of settings, rules, prompts, and tool
//! definitions exchanged between AI coding-assistant platforms. The engine
//! treats it as read-only input: converters produce new, independent
//! instances and never mutate what they were handed.
//!
//! Platform-specific configuration lives in the `ide` section, keyed by
//! platform wire name. Each platform bucket is a JSON object whose keys are
//! feature names ("steering", "mcp_servers", ...); the converter classifies
//! those keys against the feature mapping registry.

mod bundle;

pub use bundle::{BundleCodec, BundleOptions, ContextBundle};

use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Current context spec version
pub const SPEC_VERSION: &str = "1.0.0";

/// Category of a context section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// User-level preferences that follow the person, not the project
    Personal,
    /// Project conventions, architecture notes, team rules
    Project,
    /// Prompt templates and reusable instructions
    Prompts,
    /// Tool and MCP server definitions
    Tools,
    /// Platform-specific IDE configuration, keyed by platform wire name
    Ide,
}

impl Category {
    /// All categories in serialization order
    pub fn all() -> &'static [Category] {
        &[
            Category::Personal,
            Category::Project,
            Category::Prompts,
            Category::Tools,
            Category::Ide,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Project => "project",
            Category::Prompts => "prompts",
            Category::Tools => "tools",
            Category::Ide => "ide",
        }
    }
}

/// Context metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Human-readable bundle name
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Platforms this context targets; the first entry is the source
    /// platform for conversion purposes
    #[serde(default)]
    pub platforms: Vec<Platform>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the bundle should be treated as private by storage
    #[serde(default)]
    pub is_private: bool,
}

/// One category section of a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    /// Spec version this section was written against
    pub spec_version: String,
    /// The section's category (must match its slot in the context)
    pub category: Category,
    /// Section payload as an abstract JSON tree
    pub data: Value,
}

impl CategorySection {
    pub fn new(category: Category, data: Value) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            category,
            data,
        }
    }
}

/// The platform-agnostic configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaptikContext {
    /// Context format version (semver)
    pub version: String,
    pub metadata: ContextMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<CategorySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<CategorySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<CategorySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<CategorySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ide: Option<CategorySection>,
}

impl TaptikContext {
    /// Create a context with metadata and no sections
    pub fn new(name: impl Into<String>, platforms: Vec<Platform>) -> Self {
        Self {
            version: SPEC_VERSION.to_string(),
            metadata: ContextMetadata {
                name: name.into(),
                created_at: Utc::now(),
                platforms,
                tags: Vec::new(),
                is_private: false,
            },
            personal: None,
            project: None,
            prompts: None,
            tools: None,
            ide: None,
        }
    }

    /// Get a section by category
    pub fn section(&self, category: Category) -> Option<&CategorySection> {
        match category {
            Category::Personal => self.personal.as_ref(),
            Category::Project => self.project.as_ref(),
            Category::Prompts => self.prompts.as_ref(),
            Category::Tools => self.tools.as_ref(),
            Category::Ide => self.ide.as_ref(),
        }
    }

    /// Iterate over the sections that are present
    pub fn sections(&self) -> impl Iterator<Item = &CategorySection> {
        Category::all().iter().filter_map(|c| self.section(*c))
    }

    /// Get the ide-section data bucket for a platform, if present
    pub fn platform_bucket(&self, platform: Platform) -> Option<&Value> {
        self.ide
            .as_ref()
            .and_then(|s| s.data.get(platform.wire_name()))
    }

    /// Feature names populated in a platform's bucket, in sorted order.
    ///
    /// A feature counts as populated when its value is a non-empty string,
    /// array, or object, or any number/bool. Nulls and empty containers are
    /// treated as absent.
    pub fn populated_features(&self, platform: Platform) -> BTreeMap<String, Value> {
        let mut features = BTreeMap::new();
        if let Some(Value::Object(bucket)) = self.platform_bucket(platform) {
            for (name, value) in bucket {
                if is_populated(value) {
                    features.insert(name.clone(), value.clone());
                }
            }
        }
        features
    }
}

/// Whether a JSON value carries configuration worth converting
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
