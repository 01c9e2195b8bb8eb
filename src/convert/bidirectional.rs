// src/convert/bidirectional.rs

//! Round-trip conversion, reversibility scoring, and multi-hop path search.
//!
//! Wraps the one-directional converter to answer the questions a user asks
//! before migrating: can I get back, how much survives the trip, and is
//! there a route between platforms with no direct mapping. Every method
//! returns a degraded-but-valid result on internal failure instead of
//! propagating an error.

use crate::context::TaptikContext;
use crate::mapping::{FeatureClass, MappingRegistry};
use crate::platform::Platform;
use crate::validator::{validate_context, ValidationResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::converter::{ContextConverter, ConvertOptions};
use super::report::{ConversionResult, DataLossRisk, Reversibility};

/// Accuracy threshold above which a round trip counts as reversible
pub const REVERSIBLE_ACCURACY_THRESHOLD: f64 = 90.0;

/// Compatibility score threshold above which a conversion counts as compatible
pub const COMPATIBLE_SCORE_THRESHOLD: f64 = 60.0;

/// Options for a bidirectional conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidirectionalOptions {
    /// Run the reverse leg and measure round-trip accuracy
    pub test_reversibility: bool,
    /// Number of forward/reverse pairs to run sequentially (fail-fast)
    pub max_round_trips: usize,
    /// Retain every intermediate context in the result
    pub preserve_intermediate_results: bool,
    /// Options forwarded to each conversion leg
    pub convert: ConvertOptions,
}

impl Default for BidirectionalOptions {
    fn default() -> Self {
        Self {
            test_reversibility: true,
            max_round_trips: 1,
            preserve_intermediate_results: false,
            convert: ConvertOptions::default(),
        }
    }
}

/// Outcome of a bidirectional conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidirectionalResult {
    /// The forward leg (always attempted)
    pub forward: ConversionResult,
    /// The final reverse leg, when reversibility testing ran
    pub reverse: Option<ConversionResult>,
    /// Percentage of originally-populated features that deep-equal their
    /// value after the round trip
    pub round_trip_accuracy: Option<f64>,
    /// Whether accuracy met [`REVERSIBLE_ACCURACY_THRESHOLD`]
    pub reversible: Option<bool>,
    /// Forward/reverse pairs completed before success ran out
    pub round_trips_completed: usize,
    /// Intermediate contexts, oldest first (only when requested)
    pub intermediate_results: Vec<TaptikContext>,
}

/// A discovered multi-hop conversion route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPath {
    /// Platforms visited, source first, target last
    pub platforms: Vec<Platform>,
    /// Number of conversion edges in the path
    pub hops: usize,
    /// Heuristic confidence: `max(50, 100 - 20 * hops)`
    pub confidence: u32,
    /// Heuristic approximation count: `2 * hops` (not derived from mappings)
    pub estimated_approximations: usize,
}

/// Pre-flight validation of a planned conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionValidation {
    /// Whether a direct mapping is registered
    pub available: bool,
    /// Structural validation of the source context
    pub validation: ValidationResult,
    /// Mean feature score: direct 100, approximated 70, unclassified 50,
    /// unsupported 0
    pub compatibility_score: f64,
    /// Whether the score met [`COMPATIBLE_SCORE_THRESHOLD`]
    pub compatible: bool,
}

/// Classification-level report of a planned conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedConversionReport {
    pub source: Option<Platform>,
    pub target: Platform,
    pub supported: Vec<String>,
    pub approximated: Vec<String>,
    pub unsupported: Vec<String>,
    pub data_loss_risk: DataLossRisk,
    pub reversibility: Reversibility,
    pub recommendations: Vec<String>,
}

/// Orchestrates forward+reverse conversions and path search
#[derive(Debug, Clone)]
pub struct BidirectionalConverter {
    converter: ContextConverter,
}

impl BidirectionalConverter {
    pub fn new(registry: MappingRegistry) -> Self {
        Self {
            converter: ContextConverter::new(registry),
        }
    }

    pub fn builtin() -> Self {
        Self::new(MappingRegistry::builtin())
    }

    pub fn converter(&self) -> &ContextConverter {
        &self.converter
    }

    /// Convert forward and, when requested, measure how much survives the
    /// trip back. The round-trip loop is strictly sequential and stops at
    /// the first unsuccessful leg.
    pub fn convert_bidirectional(
        &self,
        context: &TaptikContext,
        target: Platform,
        options: &BidirectionalOptions,
    ) -> BidirectionalResult {
        let forward = self.converter.convert(context, target, &options.convert);

        let mut result = BidirectionalResult {
            forward,
            reverse: None,
            round_trip_accuracy: None,
            reversible: None,
            round_trips_completed: 0,
            intermediate_results: Vec::new(),
        };

        if !result.forward.success || !options.test_reversibility {
            return result;
        }
        let Some(source) = result.forward.report.source else {
            return result;
        };

        let original_features = context.populated_features(source);
        let mut current = match &result.forward.context {
            Some(ctx) => ctx.clone(),
            None => return result,
        };

        let trips = options.max_round_trips.max(1);
        for trip in 0..trips {
            // Reverse leg back to the source platform.
            let reverse = self.converter.convert(&current, source, &options.convert);
            if !reverse.success {
                result.reverse = Some(reverse);
                return result;
            }
            let returned = reverse
                .context
                .clone()
                .unwrap_or_else(|| current.clone());
            if options.preserve_intermediate_results {
                result.intermediate_results.push(returned.clone());
            }
            result.reverse = Some(reverse);
            result.round_trips_completed = trip + 1;

            let accuracy = round_trip_accuracy(&original_features, &returned, source);
            result.round_trip_accuracy = Some(accuracy);
            result.reversible = Some(accuracy >= REVERSIBLE_ACCURACY_THRESHOLD);

            if trip + 1 < trips {
                // Next forward leg starts from the returned context.
                let forward = self.converter.convert(&returned, target, &options.convert);
                if !forward.success {
                    return result;
                }
                if options.preserve_intermediate_results {
                    if let Some(ctx) = &forward.context {
                        result.intermediate_results.push(ctx.clone());
                    }
                }
                current = match forward.context {
                    Some(ctx) => ctx,
                    None => return result,
                };
            }
        }

        result
    }

    /// Depth-first search for a conversion route of at most `max_hops`
    /// edges. The highest-confidence path wins; ties break by discovery
    /// order, which follows platform declaration order at each node.
    pub fn find_conversion_path(
        &self,
        source: Platform,
        target: Platform,
        max_hops: usize,
    ) -> Option<ConversionPath> {
        if source == target || max_hops == 0 {
            return None;
        }

        let registry = self.converter.registry();
        let mut best: Option<ConversionPath> = None;
        let mut stack = vec![source];
        dfs(registry, target, max_hops, &mut stack, &mut best);

        if let Some(path) = &best {
            debug!(
                "conversion path {} -> {}: {:?} (confidence {})",
                source, target, path.platforms, path.confidence
            );
        }
        best
    }

    /// Pre-flight check: availability, structural validity, and a
    /// compatibility score over the populated features.
    pub fn validate_conversion(
        &self,
        context: &TaptikContext,
        target: Platform,
    ) -> ConversionValidation {
        let validation = validate_context(context);
        let source = self.converter.detect_source(context);

        let available = source
            .map(|s| self.converter.is_conversion_available(s, target))
            .unwrap_or(false);

        let compatibility_score = match source {
            Some(source) if source != target => {
                let features = context.populated_features(source);
                if features.is_empty() {
                    100.0
                } else {
                    let mapping = self.converter.registry().get(source, target);
                    let total: f64 = features
                        .keys()
                        .map(|feature| match mapping.map(|m| m.classify(feature)) {
                            Some(FeatureClass::Direct) => 100.0,
                            Some(FeatureClass::Approximated { .. }) => 70.0,
                            Some(FeatureClass::Unclassified) | None => 50.0,
                            Some(FeatureClass::Unsupported) => 0.0,
                        })
                        .sum();
                    total / features.len() as f64
                }
            }
            _ => 0.0,
        };

        ConversionValidation {
            available,
            validation,
            compatibility_score,
            compatible: compatibility_score >= COMPATIBLE_SCORE_THRESHOLD,
        }
    }

    /// Classify populated features and summarize loss risk, reversibility,
    /// and recommended follow-ups for a planned conversion.
    pub fn generate_conversion_report(
        &self,
        context: &TaptikContext,
        target: Platform,
    ) -> DetailedConversionReport {
        let source = self.converter.detect_source(context);

        let mut report = DetailedConversionReport {
            source,
            target,
            supported: Vec::new(),
            approximated: Vec::new(),
            unsupported: Vec::new(),
            data_loss_risk: DataLossRisk::Low,
            reversibility: Reversibility::Full,
            recommendations: Vec::new(),
        };

        let Some(source) = source else {
            report
                .recommendations
                .push("set metadata.platforms or populate an ide bucket first".to_string());
            return report;
        };

        let features = context.populated_features(source);
        let mapping = self.converter.registry().get(source, target);

        for feature in features.keys() {
            match mapping.map(|m| m.classify(feature)) {
                Some(FeatureClass::Direct) => report.supported.push(feature.clone()),
                Some(FeatureClass::Approximated { .. }) => report.approximated.push(feature.clone()),
                _ => report.unsupported.push(feature.clone()),
            }
        }

        let total = features.len().max(1) as f64;
        let unsupported_ratio = report.unsupported.len() as f64 / total;
        let approximation_ratio = report.approximated.len() as f64 / total;
        report.data_loss_risk = DataLossRisk::from_ratios(unsupported_ratio, approximation_ratio);
        report.reversibility = Reversibility::from_ratios(unsupported_ratio, approximation_ratio);

        if mapping.is_none() {
            report.recommendations.push(format!(
                "no mapping registered for {} -> {}; try a multi-hop path or force the conversion",
                source, target
            ));
        }
        if !report.unsupported.is_empty() {
            report.recommendations.push(format!(
                "export or back up unsupported features before converting: {}",
                report.unsupported.join(", ")
            ));
        }
        if !report.approximated.is_empty() {
            report.recommendations.push(
                "review approximated features on the target platform after deployment".to_string(),
            );
        }
        if report.data_loss_risk == DataLossRisk::High {
            report
                .recommendations
                .push("keep the original context bundle; this conversion loses data".to_string());
        }

        report
    }
}

fn dfs(
    registry: &MappingRegistry,
    target: Platform,
    max_hops: usize,
    stack: &mut Vec<Platform>,
    best: &mut Option<ConversionPath>,
) {
    let current = *stack.last().unwrap_or(&target);
    if stack.len() > max_hops {
        return;
    }

    for next in registry.targets_from(current) {
        if stack.contains(&next) {
            continue;
        }
        stack.push(next);
        if next == target {
            let hops = stack.len() - 1;
            let candidate = ConversionPath {
                platforms: stack.clone(),
                hops,
                confidence: (100_i64 - 20 * hops as i64).max(50) as u32,
                estimated_approximations: 2 * hops,
            };
            // Strictly-greater keeps the first-discovered path on ties.
            if best
                .as_ref()
                .map_or(true, |b| candidate.confidence > b.confidence)
            {
                *best = Some(candidate);
            }
        } else {
            dfs(registry, target, max_hops, stack, best);
        }
        stack.pop();
    }
}


/// Percentage of original features whose value deep-equals (canonical JSON
/// comparison) the round-tripped value.
fn round_trip_accuracy(
    original: &std::collections::BTreeMap<String, serde_json::Value>,
    returned: &TaptikContext,
    source: Platform,
) -> f64 {
    if original.is_empty() {
        return 100.0;
    }
    let returned_features = returned.populated_features(source);
    let preserved = original
        .iter()
        .filter(|(name, value)| returned_features.get(*name) == Some(value))
        .count();
    preserved as f64 / original.len() as f64 * 100.0
}
