// src/mapping/mod.rs

//! The feature mapping registry.
//!
//! One [`FeatureMapping`] per ordered platform pair describes which features
//! translate directly, which are approximated (a documented lossy rename),
//! and which have no counterpart on the target. The registry is an immutable
//! value built once and injected into the converter and validator; there is
//! no ambient global state.

use crate::error::{Error, Result};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How features translate between one ordered platform pair.
///
/// Invariant: a feature name appears in at most one of the three partitions.
/// [`FeatureMapping::validate`] enforces this at registration time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureMapping {
    /// Features copied verbatim under the same name
    pub direct: BTreeSet<String>,
    /// Source feature name -> target feature name (lossy rename)
    pub approximations: BTreeMap<String, String>,
    /// Features dropped entirely on the target
    pub unsupported: Vec<String>,
}

impl FeatureMapping {
    /// An empty mapping: every feature is unclassified (and will be dropped
    /// as unsupported by a forced conversion).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check the partition invariant
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let names = self
            .direct
            .iter()
            .map(String::as_str)
            .chain(self.approximations.keys().map(String::as_str))
            .chain(self.unsupported.iter().map(String::as_str));

        for name in names {
            if !seen.insert(name) {
                return Err(Error::MappingRegistration(format!(
                    "feature '{}' appears in more than one partition",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Classify a feature name against this mapping
    pub fn classify(&self, feature: &str) -> FeatureClass<'_> {
        if self.direct.contains(feature) {
            FeatureClass::Direct
        } else if let Some(target) = self.approximations.get(feature) {
            FeatureClass::Approximated { renamed_to: target }
        } else if self.unsupported.iter().any(|f| f == feature) {
            FeatureClass::Unsupported
        } else {
            FeatureClass::Unclassified
        }
    }

    /// Whether every listed partition other than `direct` is empty.
    ///
    /// Only such mappings can yield a 100% round-trip accuracy.
    pub fn is_lossless(&self) -> bool {
        self.approximations.is_empty() && self.unsupported.is_empty()
    }
}

/// Classification of one feature against a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass<'a> {
    /// Copied verbatim
    Direct,
    /// Carried over under a different name, with information loss
    Approximated { renamed_to: &'a str },
    /// No counterpart on the target; dropped
    Unsupported,
    /// Not listed in any partition
    Unclassified,
}

/// Immutable registry of feature mappings, keyed by ordered platform pair
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: HashMap<(Platform, Platform), FeatureMapping>,
}

impl MappingRegistry {
    /// An empty registry (useful for tests and custom topologies)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping for an ordered platform pair.
    ///
    /// Fails if the mapping violates the partition invariant or the pair is
    /// already registered.
    pub fn register(
        &mut self,
        source: Platform,
        target: Platform,
        mapping: FeatureMapping,
    ) -> Result<()> {
        if source == target {
            return Err(Error::MappingRegistration(format!(
                "cannot register a mapping from {} to itself",
                source
            )));
        }
        mapping.validate()?;
        if self.mappings.contains_key(&(source, target)) {
            return Err(Error::MappingRegistration(format!(
                "mapping {} -> {} already registered",
                source, target
            )));
        }
        self.mappings.insert((source, target), mapping);
        Ok(())
    }

    /// Look up the mapping for an ordered pair
    pub fn get(&self, source: Platform, target: Platform) -> Option<&FeatureMapping> {
        self.mappings.get(&(source, target))
    }

    /// Whether a direct mapping exists for the pair
    pub fn contains(&self, source: Platform, target: Platform) -> bool {
        self.mappings.contains_key(&(source, target))
    }

    /// Targets directly reachable from a source platform, in declaration order
    pub fn targets_from(&self, source: Platform) -> Vec<Platform> {
        Platform::all()
            .iter()
            .copied()
            .filter(|t| self.contains(source, *t))
            .collect()
    }

    /// The registry shipped with the engine, covering every ordered pair of
    /// the supported platforms.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        // Registration of hand-authored mappings cannot fail: the literals
        // below keep each feature in exactly one partition.
        let mut add = |source, target, mapping: FeatureMapping| {
            registry
                .register(source, target, mapping)
                .unwrap_or_else(|e| unreachable!("builtin mapping invalid: {}", e));
        };

        add(
            Platform::Kiro,
            Platform::ClaudeCode,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("steering", "claude_md"), ("hooks", "commands")]),
                unsupported: vec!["specs".to_string()],
            },
        );
        add(
            Platform::ClaudeCode,
            Platform::Kiro,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("claude_md", "steering"), ("commands", "hooks")]),
                unsupported: vec!["agents".to_string()],
            },
        );
        add(
            Platform::ClaudeCode,
            Platform::Cursor,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("claude_md", "cursor_rules")]),
                unsupported: vec!["commands".to_string(), "agents".to_string()],
            },
        );
        add(
            Platform::Cursor,
            Platform::ClaudeCode,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("cursor_rules", "claude_md")]),
                unsupported: vec!["extensions".to_string()],
            },
        );
        add(
            Platform::Kiro,
            Platform::Cursor,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("steering", "cursor_rules")]),
                unsupported: vec!["specs".to_string(), "hooks".to_string()],
            },
        );
        add(
            Platform::Cursor,
            Platform::Kiro,
            FeatureMapping {
                direct: direct(&["settings", "mcp_servers"]),
                approximations: approx(&[("cursor_rules", "steering")]),
                unsupported: vec!["extensions".to_string()],
            },
        );

        registry
    }
}

fn direct(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn approx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_ordered_pairs() {
        let registry = MappingRegistry::builtin();
        for &source in Platform::all() {
            for &target in Platform::all() {
                if source != target {
                    assert!(
                        registry.contains(source, target),
                        "missing builtin mapping {} -> {}",
                        source,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn test_partition_invariant_rejected() {
        let mapping = FeatureMapping {
            direct: direct(&["settings"]),
            approximations: approx(&[("settings", "prefs")]),
            unsupported: vec![],
        };
        assert!(mapping.validate().is_err());

        let mut registry = MappingRegistry::new();
        assert!(registry
            .register(Platform::Kiro, Platform::Cursor, mapping)
            .is_err());
    }

    #[test]
    fn test_self_mapping_rejected() {
        let mut registry = MappingRegistry::new();
        let err = registry
            .register(Platform::Kiro, Platform::Kiro, FeatureMapping::empty())
            .unwrap_err();
        assert!(err.to_string().contains("itself"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = MappingRegistry::new();
        registry
            .register(Platform::Kiro, Platform::Cursor, FeatureMapping::empty())
            .unwrap();
        assert!(registry
            .register(Platform::Kiro, Platform::Cursor, FeatureMapping::empty())
            .is_err());
    }

    #[test]
    fn test_classify() {
        let registry = MappingRegistry::builtin();
        let mapping = registry.get(Platform::Kiro, Platform::ClaudeCode).unwrap();

        assert_eq!(mapping.classify("settings"), FeatureClass::Direct);
        assert_eq!(
            mapping.classify("steering"),
            FeatureClass::Approximated {
                renamed_to: "claude_md"
            }
        );
        assert_eq!(mapping.classify("specs"), FeatureClass::Unsupported);
        assert_eq!(mapping.classify("mystery"), FeatureClass::Unclassified);
    }

    #[test]
    fn test_targets_from_order_is_deterministic() {
        let registry = MappingRegistry::builtin();
        assert_eq!(
            registry.targets_from(Platform::Kiro),
            vec![Platform::ClaudeCode, Platform::Cursor]
        );
    }

    #[test]
    fn test_is_lossless() {
        assert!(FeatureMapping {
            direct: direct(&["a", "b"]),
            ..Default::default()
        }
        .is_lossless());

        let registry = MappingRegistry::builtin();
        assert!(!registry
            .get(Platform::Kiro, Platform::ClaudeCode)
            .unwrap()
            .is_lossless());
    }
}
