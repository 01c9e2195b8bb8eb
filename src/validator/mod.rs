// src/validator/mod.rs

//! Structural and platform-compatibility validation for contexts.
//!
//! Validation is a pure function over the context tree: it never mutates its
//! input and never aborts. Every problem is collected into the result:
//! errors block a deployment, warnings are advisory and always surfaced.

use crate::context::{Category, CategorySection, TaptikContext};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Outcome of validating a context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// A platform-specific validation rule over the platform's feature bucket
struct PlatformRule {
    feature: &'static str,
    severity: Severity,
    /// Check applied when the feature is present; `None` means presence only
    check: fn(&Value) -> bool,
    message: &'static str,
}

/// Pairs of platform-specific features known not to coexist cleanly, with a
/// recommended universal substitute.
const INCOMPATIBLE_FEATURES: &[(Platform, &str, Platform, &str, &str)] = &[
    (
        Platform::Kiro,
        "steering",
        Platform::ClaudeCode,
        "claude_md",
        "project rules in the 'project' section",
    ),
    (
        Platform::Kiro,
        "steering",
        Platform::Cursor,
        "cursor_rules",
        "project rules in the 'project' section",
    ),
    (
        Platform::ClaudeCode,
        "claude_md",
        Platform::Cursor,
        "cursor_rules",
        "project rules in the 'project' section",
    ),
];

/// Validate a context's structure and platform compatibility.
///
/// Never fails: problems are reported inside the returned result, and any
/// internal inconsistency degrades to a generic error entry rather than a
/// panic.
pub fn validate_context(context: &TaptikContext) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_required_fields(context, &mut result);
    check_sections(context, &mut result);
    check_platform_rules(context, &mut result);
    check_cross_platform(context, &mut result);

    result.valid = result.errors.is_empty();
    result
}

/// Whether the context declares the given platform as a target
pub fn is_platform_compatible(context: &TaptikContext, platform: Platform) -> bool {
    context.metadata.platforms.contains(&platform)
}

fn check_required_fields(context: &TaptikContext, result: &mut ValidationResult) {
    if context.version.is_empty() {
        result.error("missing required field: version");
    } else if semver::Version::parse(&context.version).is_err() {
        result.error(format!(
            "version '{}' is not a valid semver string",
            context.version
        ));
    }

    if context.metadata.name.trim().len() < 3 {
        result.error("metadata.name must be at least 3 characters");
    }

    // created_at is structurally a DateTime, so parseability is guaranteed
    // here; a far-future timestamp still indicates clock trouble upstream.
    if context.metadata.created_at > chrono::Utc::now() + chrono::Duration::days(1) {
        result.warning("metadata.created_at is in the future");
    }

    if context.metadata.platforms.is_empty() && context.ide.is_none() {
        result.warning("context declares no platforms and carries no ide section");
    }
}

fn check_sections(context: &TaptikContext, result: &mut ValidationResult) {
    for category in Category::all() {
        if let Some(section) = context.section(*category) {
            check_section(*category, section, result);
        }
    }
}

fn check_section(category: Category, section: &CategorySection, result: &mut ValidationResult) {
    if section.spec_version.is_empty() {
        result.error(format!(
            "section '{}' is missing spec_version",
            category.name()
        ));
    } else if semver::Version::parse(&section.spec_version).is_err() {
        result.error(format!(
            "section '{}' spec_version '{}' is not valid semver",
            category.name(),
            section.spec_version
        ));
    }

    if section.category != category {
        result.error(format!(
            "section '{}' declares mismatched category '{}'",
            category.name(),
            section.category.name()
        ));
    }

    match category {
        Category::Ide => {
            if !section.data.is_object() {
                result.error("ide section data must be an object keyed by platform name");
            } else if let Some(bucket_map) = section.data.as_object() {
                for (key, bucket) in bucket_map {
                    if key.parse::<Platform>().is_err() {
                        result.warning(format!("ide section contains unknown platform '{}'", key));
                    } else if !bucket.is_object() {
                        result.error(format!(
                            "ide bucket '{}' must be an object of feature values",
                            key
                        ));
                    }
                }
            }
        }
        Category::Prompts => {
            if let Some(templates) = section.data.get("templates") {
                if !templates.is_array() {
                    result.error("prompts.templates must be an array");
                }
            }
        }
        Category::Tools => {
            if let Some(agents) = section.data.get("agents") {
                if !agents.is_array() {
                    result.error("tools.agents must be an array");
                }
            }
            if let Some(servers) = section.data.get("mcp_servers") {
                if !servers.is_object() && !servers.is_array() {
                    result.error("tools.mcp_servers must be an object or array");
                }
            }
        }
        Category::Personal | Category::Project => {
            if !section.data.is_object() {
                result.error(format!(
                    "section '{}' data must be an object",
                    category.name()
                ));
            }
        }
    }
}

fn rules_for(platform: Platform) -> &'static [PlatformRule] {
    match platform {
        Platform::Kiro => &[
            PlatformRule {
                feature: "steering",
                severity: Severity::Error,
                check: |v| v.is_array() || v.is_object(),
                message: "kiro steering must be an array of documents or an object",
            },
            PlatformRule {
                feature: "specs",
                severity: Severity::Warning,
                check: |v| v.is_array(),
                message: "kiro specs should be an array",
            },
        ],
        Platform::ClaudeCode => &[
            PlatformRule {
                feature: "claude_md",
                severity: Severity::Error,
                check: |v| v.is_string(),
                message: "claude-code claude_md must be a markdown string",
            },
            PlatformRule {
                feature: "commands",
                severity: Severity::Warning,
                check: |v| v.is_object() || v.is_array(),
                message: "claude-code commands should be an object or array",
            },
        ],
        Platform::Cursor => &[PlatformRule {
            feature: "cursor_rules",
            severity: Severity::Error,
            check: |v| v.is_string() || v.is_array(),
            message: "cursor cursor_rules must be a string or array of rule strings",
        }],
    }
}

fn check_platform_rules(context: &TaptikContext, result: &mut ValidationResult) {
    for &platform in Platform::all() {
        let Some(Value::Object(bucket)) = context.platform_bucket(platform) else {
            continue;
        };
        for rule in rules_for(platform) {
            if let Some(value) = bucket.get(rule.feature) {
                if !value.is_null() && !(rule.check)(value) {
                    match rule.severity {
                        Severity::Error => result.error(rule.message),
                        Severity::Warning => result.warning(rule.message),
                    }
                }
            }
        }
    }
}

fn check_cross_platform(context: &TaptikContext, result: &mut ValidationResult) {
    let platforms = &context.metadata.platforms;
    for (p1, f1, p2, f2, substitute) in INCOMPATIBLE_FEATURES {
        if !(platforms.contains(p1) && platforms.contains(p2)) {
            continue;
        }
        let has_f1 = context
            .platform_bucket(*p1)
            .and_then(|b| b.get(*f1))
            .is_some_and(crate::context::is_populated);
        let has_f2 = context
            .platform_bucket(*p2)
            .and_then(|b| b.get(*f2))
            .is_some_and(crate::context::is_populated);

        if has_f1 && has_f2 {
            result.warning(format!(
                "'{}' ({}) and '{}' ({}) overlap and will diverge; consider {}",
                f1, p1, f2, p2, substitute
            ));
        }
    }
}
