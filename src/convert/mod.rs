// src/convert/mod.rs

//! Context conversion between platforms.
//!
//! [`ContextConverter`] performs one-directional translation against the
//! feature mapping registry; [`BidirectionalConverter`] wraps it to measure
//! reversibility and to search multi-hop routes when no direct mapping
//! exists.

mod bidirectional;
mod converter;
mod report;

pub use bidirectional::{
    BidirectionalConverter, BidirectionalOptions, BidirectionalResult, ConversionPath,
    ConversionValidation, DetailedConversionReport, COMPATIBLE_SCORE_THRESHOLD,
    REVERSIBLE_ACCURACY_THRESHOLD,
};
pub use converter::{ContextConverter, ConvertOptions};
pub use report::{ConversionReport, ConversionResult, DataLossRisk, Reversibility};
