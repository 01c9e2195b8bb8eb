// tests/common/mod.rs

//! Shared helpers for integration tests.

use serde_json::{json, Value};
use std::sync::Once;
use taptik_core::context::{Category, CategorySection};
use taptik_core::platform::Platform;
use taptik_core::TaptikContext;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary so `RUST_LOG` surfaces
/// engine logs in failing tests
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// A Kiro context exercising every mapping class: direct (settings,
/// mcp_servers), approximated (steering, hooks), unsupported (specs).
pub fn kiro_context() -> TaptikContext {
    context_for(
        Platform::Kiro,
        json!({
            "settings": {"theme": "dark", "tab_size": 2},
            "mcp_servers": {"files": {"command": "mcp-files"}},
            "steering": ["prefer explicit errors", "no global state"],
            "hooks": {"pre_commit": "lint"},
            "specs": [{"name": "auth-flow"}],
        }),
    )
}

/// A context whose features all map directly, so round trips are lossless
pub fn lossless_kiro_context() -> TaptikContext {
    context_for(
        Platform::Kiro,
        json!({
            "settings": {"theme": "dark"},
            "mcp_servers": {"files": {"command": "mcp-files"}},
        }),
    )
}

pub fn context_for(platform: Platform, bucket: Value) -> TaptikContext {
    let mut ctx = TaptikContext::new("integration-test", vec![platform]);
    ctx.ide = Some(CategorySection::new(
        Category::Ide,
        json!({ platform.wire_name(): bucket }),
    ));
    ctx
}
