// src/convert/converter.rs

//! One-directional context conversion using the feature mapping registry.

use crate::context::{Category, CategorySection, TaptikContext};
use crate::mapping::{FeatureClass, FeatureMapping, MappingRegistry};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::report::{ConversionReport, ConversionResult};

/// Options controlling a single conversion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Append the target to `metadata.platforms` (and keep existing ide
    /// buckets) instead of replacing them
    pub preserve_metadata: bool,
    /// Proceed without a registered mapping, treating every feature as
    /// unsupported
    pub force: bool,
}

/// Translates contexts between platforms using an injected registry
#[derive(Debug, Clone)]
pub struct ContextConverter {
    registry: MappingRegistry,
}

impl ContextConverter {
    pub fn new(registry: MappingRegistry) -> Self {
        Self { registry }
    }

    /// Converter over the builtin mapping registry
    pub fn builtin() -> Self {
        Self::new(MappingRegistry::builtin())
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Detect the source platform of a context.
    ///
    /// The first entry of `metadata.platforms` wins; only when the list is
    /// empty does detection fall back to scanning ide buckets, taking the
    /// first populated bucket in platform declaration order. Never guesses
    /// when neither source exists.
    pub fn detect_source(&self, context: &TaptikContext) -> Option<Platform> {
        if let Some(platform) = context.metadata.platforms.first() {
            return Some(*platform);
        }
        Platform::all()
            .iter()
            .copied()
            .find(|p| !context.populated_features(*p).is_empty())
    }

    /// Whether a direct mapping exists for the pair
    pub fn is_conversion_available(&self, source: Platform, target: Platform) -> bool {
        self.registry.contains(source, target)
    }

    /// Targets directly reachable from a source platform
    pub fn available_conversions(&self, source: Platform) -> Vec<Platform> {
        self.registry.targets_from(source)
    }

    /// Convert a context to the target platform.
    ///
    /// Never mutates the input; the result context is an independent
    /// instance. Failures ("unknown source platform", "no mapping
    /// registered") come back as structured results, not errors.
    pub fn convert(
        &self,
        context: &TaptikContext,
        target: Platform,
        options: &ConvertOptions,
    ) -> ConversionResult {
        let Some(source) = self.detect_source(context) else {
            return ConversionResult::failure(
                target,
                "unknown source platform: metadata.platforms is empty and no ide bucket is populated",
            );
        };

        if source == target {
            let mut result = ConversionResult::failure(
                target,
                format!("context is already targeted at {}", target),
            );
            result.report.source = Some(source);
            return result;
        }

        let mut report = ConversionReport::new(target);
        report.source = Some(source);

        let forced_empty;
        let mapping: &FeatureMapping = match self.registry.get(source, target) {
            Some(mapping) => mapping,
            None if options.force => {
                report.warnings.push(format!(
                    "no mapping registered for {} -> {}; forced conversion drops all features",
                    source, target
                ));
                forced_empty = FeatureMapping::empty();
                &forced_empty
            }
            None => {
                let mut result = ConversionResult::failure(
                    target,
                    format!("no mapping registered for {} -> {}", source, target),
                );
                result.report.source = Some(source);
                return result;
            }
        };

        let populated = context.populated_features(source);
        let mut target_bucket = Map::new();

        for (feature, value) in &populated {
            match mapping.classify(feature) {
                FeatureClass::Direct => {
                    target_bucket.insert(feature.clone(), value.clone());
                    report.supported_features.push(feature.clone());
                }
                FeatureClass::Approximated { renamed_to } => {
                    target_bucket.insert(renamed_to.to_string(), value.clone());
                    report
                        .approximations
                        .push(format!("{} -> {}", feature, renamed_to));
                    report.warnings.push(format!(
                        "feature '{}' approximated as '{}' on {}; review after deployment",
                        feature, renamed_to, target
                    ));
                }
                FeatureClass::Unsupported => {
                    report.unsupported_features.push(feature.clone());
                }
                FeatureClass::Unclassified => {
                    report.unsupported_features.push(feature.clone());
                    report.warnings.push(format!(
                        "feature '{}' is not classified for {} -> {}; dropping",
                        feature, source, target
                    ));
                }
            }
        }

        let converted = self.assemble(context, target, Value::Object(target_bucket), options);

        debug!(
            "converted {} -> {}: {} direct, {} approximated, {} dropped",
            source,
            target,
            report.supported_features.len(),
            report.approximations.len(),
            report.unsupported_features.len()
        );
        if !report.unsupported_features.is_empty() {
            warn!(
                "conversion {} -> {} dropped features: {:?}",
                source, target, report.unsupported_features
            );
        }

        ConversionResult {
            success: true,
            context: Some(converted),
            report,
        }
    }

    /// Build the output context from the input and the translated bucket
    fn assemble(
        &self,
        context: &TaptikContext,
        target: Platform,
        target_bucket: Value,
        options: &ConvertOptions,
    ) -> TaptikContext {
        let mut out = context.clone();

        if options.preserve_metadata {
            if !out.metadata.platforms.contains(&target) {
                out.metadata.platforms.push(target);
            }
        } else {
            out.metadata.platforms = vec![target];
        }

        let mut ide_data = if options.preserve_metadata {
            out.ide
                .as_ref()
                .and_then(|s| s.data.as_object().cloned())
                .unwrap_or_default()
        } else {
            Map::new()
        };
        ide_data.insert(target.wire_name().to_string(), target_bucket);

        let spec_version = out
            .ide
            .as_ref()
            .map(|s| s.spec_version.clone())
            .unwrap_or_else(|| crate::context::SPEC_VERSION.to_string());
        out.ide = Some(CategorySection {
            spec_version,
            category: Category::Ide,
            data: Value::Object(ide_data),
        });

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kiro_context() -> TaptikContext {
        let mut ctx = TaptikContext::new("kiro-setup", vec![Platform::Kiro]);
        ctx.ide = Some(CategorySection::new(
            Category::Ide,
            json!({
                "kiro": {
                    "settings": {"autosave": true},
                    "mcp_servers": {"fetch": {"command": "uvx"}},
                    "steering": ["always run the linter"],
                    "specs": [{"name": "auth-flow"}],
                }
            }),
        ));
        ctx
    }

    #[test]
    fn test_direct_and_approximated_features() {
        let converter = ContextConverter::builtin();
        let result = converter.convert(
            &kiro_context(),
            Platform::ClaudeCode,
            &ConvertOptions::default(),
        );

        assert!(result.success);
        let converted = result.context.unwrap();
        let bucket = converted.platform_bucket(Platform::ClaudeCode).unwrap();

        assert_eq!(bucket["settings"], json!({"autosave": true}));
        assert_eq!(bucket["claude_md"], json!(["always run the linter"]));
        assert!(bucket.get("specs").is_none());

        assert_eq!(
            result.report.supported_features,
            vec!["mcp_servers", "settings"]
        );
        assert_eq!(result.report.approximations, vec!["steering -> claude_md"]);
        assert_eq!(result.report.unsupported_features, vec!["specs"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let converter = ContextConverter::builtin();
        let ctx = kiro_context();
        let before = ctx.clone();
        let _ = converter.convert(&ctx, Platform::Cursor, &ConvertOptions::default());
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_no_mapping_without_force_fails() {
        let converter = ContextConverter::new(MappingRegistry::new());
        let result = converter.convert(
            &kiro_context(),
            Platform::ClaudeCode,
            &ConvertOptions::default(),
        );

        assert!(!result.success);
        assert!(result.report.errors.iter().any(|e| e.contains("no mapping")));
    }

    #[test]
    fn test_force_proceeds_with_warning() {
        let converter = ContextConverter::new(MappingRegistry::new());
        let result = converter.convert(
            &kiro_context(),
            Platform::ClaudeCode,
            &ConvertOptions {
                force: true,
                ..Default::default()
            },
        );

        assert!(result.success);
        assert!(result.report.warnings.iter().any(|w| w.contains("forced")));
        assert_eq!(result.report.unsupported_features.len(), 4);
        let bucket = result
            .context
            .unwrap()
            .platform_bucket(Platform::ClaudeCode)
            .cloned()
            .unwrap();
        assert_eq!(bucket, json!({}));
    }

    #[test]
    fn test_unknown_source_platform_fails() {
        let converter = ContextConverter::builtin();
        let ctx = TaptikContext::new("blank", vec![]);
        let result = converter.convert(&ctx, Platform::Cursor, &ConvertOptions::default());

        assert!(!result.success);
        assert!(result
            .report
            .errors
            .iter()
            .any(|e| e.contains("unknown source platform")));
    }

    #[test]
    fn test_source_detection_falls_back_to_buckets() {
        let converter = ContextConverter::builtin();
        let mut ctx = kiro_context();
        ctx.metadata.platforms.clear();
        assert_eq!(converter.detect_source(&ctx), Some(Platform::Kiro));
    }

    #[test]
    fn test_metadata_platforms_replaced_by_default() {
        let converter = ContextConverter::builtin();
        let result = converter.convert(
            &kiro_context(),
            Platform::ClaudeCode,
            &ConvertOptions::default(),
        );
        let converted = result.context.unwrap();
        assert_eq!(converted.metadata.platforms, vec![Platform::ClaudeCode]);
        assert!(converted.platform_bucket(Platform::Kiro).is_none());
    }

    #[test]
    fn test_preserve_metadata_appends() {
        let converter = ContextConverter::builtin();
        let result = converter.convert(
            &kiro_context(),
            Platform::ClaudeCode,
            &ConvertOptions {
                preserve_metadata: true,
                ..Default::default()
            },
        );
        let converted = result.context.unwrap();
        assert_eq!(
            converted.metadata.platforms,
            vec![Platform::Kiro, Platform::ClaudeCode]
        );
        assert!(converted.platform_bucket(Platform::Kiro).is_some());
    }

    #[test]
    fn test_idempotent_with_same_registry() {
        let converter = ContextConverter::builtin();
        let ctx = kiro_context();
        let opts = ConvertOptions::default();

        let first = converter.convert(&ctx, Platform::ClaudeCode, &opts);
        let second = converter.convert(&ctx, Platform::ClaudeCode, &opts);

        assert_eq!(first.context.as_ref().map(|c| &c.ide), second.context.as_ref().map(|c| &c.ide));
        assert_eq!(
            first.report.supported_features,
            second.report.supported_features
        );
        assert_eq!(first.report.approximations, second.report.approximations);
    }

    #[test]
    fn test_same_platform_conversion_rejected() {
        let converter = ContextConverter::builtin();
        let result = converter.convert(&kiro_context(), Platform::Kiro, &ConvertOptions::default());
        assert!(!result.success);
    }
}
