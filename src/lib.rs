// src/lib.rs

//! taptik-core: configuration conversion, validation, and conflict
//! resolution for AI coding-assistant settings.
//!
//! The engine moves a platform-agnostic [`TaptikContext`] between IDE
//! platforms (Kiro, Claude Code, Cursor): the converter classifies features
//! against a mapping registry and reports what survives, the validator
//! checks structure and platform compatibility, and the conflict resolver
//! reconciles converted files with an existing workspace. Bundles wrap
//! contexts for transport with optional gzip compression and AES-256-GCM
//! encryption.

pub mod cache;
pub mod compression;
pub mod conflict;
pub mod context;
pub mod convert;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod platform;
pub mod validator;

pub use cache::{CacheConfig, CacheStats, ContextCache};
pub use conflict::{ConflictResolver, FileConflict, ResolutionStrategy};
pub use context::{BundleCodec, BundleOptions, ContextBundle, TaptikContext};
pub use convert::{
    BidirectionalConverter, ContextConverter, ConversionReport, ConversionResult,
};
pub use error::{Error, Result};
pub use mapping::{FeatureMapping, MappingRegistry};
pub use platform::Platform;
pub use validator::{validate_context, ValidationResult};
