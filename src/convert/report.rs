// src/convert/report.rs

//! Conversion result and report types.
//!
//! Conversion failures are classified and returned as renderable structures
//! rather than errors: the caller always gets a report it can show the user,
//! even when no output context could be produced.

use crate::context::TaptikContext;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};

/// Risk of losing configuration data in a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLossRisk {
    Low,
    Medium,
    High,
}

impl DataLossRisk {
    /// Classify from the fraction of features that are unsupported or
    /// approximated.
    pub fn from_ratios(unsupported_ratio: f64, approximation_ratio: f64) -> Self {
        if unsupported_ratio > 0.3 {
            Self::High
        } else if unsupported_ratio > 0.1 || approximation_ratio > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for DataLossRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// How losslessly a conversion can be undone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reversibility {
    /// Every populated feature survives a round trip
    Full,
    /// Some features are renamed or dropped but most survive
    Partial,
    /// More than half of the features do not survive
    None,
}

impl Reversibility {
    /// Classify from the same ratios that drive [`DataLossRisk`]
    pub fn from_ratios(unsupported_ratio: f64, approximation_ratio: f64) -> Self {
        if unsupported_ratio == 0.0 && approximation_ratio == 0.0 {
            Self::Full
        } else if unsupported_ratio > 0.5 {
            Self::None
        } else {
            Self::Partial
        }
    }
}

impl std::fmt::Display for Reversibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Per-conversion report of what translated and what did not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Detected source platform, when detection succeeded
    pub source: Option<Platform>,
    pub target: Platform,
    /// Features copied verbatim
    pub supported_features: Vec<String>,
    /// Features dropped (no counterpart on the target)
    pub unsupported_features: Vec<String>,
    /// Applied approximations, as "source_feature -> target_feature"
    pub approximations: Vec<String>,
    pub warnings: Vec<String>,
    /// Classified failure messages; non-empty implies `success == false`
    pub errors: Vec<String>,
}

impl ConversionReport {
    pub fn new(target: Platform) -> Self {
        Self {
            source: None,
            target,
            supported_features: Vec::new(),
            unsupported_features: Vec::new(),
            approximations: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// One-line summary for logs and CLI rendering
    pub fn summary(&self) -> String {
        format!(
            "{} -> {}: {} direct, {} approximated, {} unsupported",
            self.source.map_or("?".to_string(), |p| p.to_string()),
            self.target,
            self.supported_features.len(),
            self.approximations.len(),
            self.unsupported_features.len()
        )
    }
}

/// Outcome of a one-directional conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    /// The converted context; present only on success
    pub context: Option<TaptikContext>,
    pub report: ConversionReport,
}

impl ConversionResult {
    /// A classified failure with no output context
    pub fn failure(target: Platform, message: impl Into<String>) -> Self {
        let mut report = ConversionReport::new(target);
        report.errors.push(message.into());
        Self {
            success: false,
            context: None,
            report,
        }
    }
}
