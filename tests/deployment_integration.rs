// tests/deployment_integration.rs

//! End-to-end deployment tests: bundle transport (compression and
//! encryption) followed by conflict detection, resolution, and application
//! against a real workspace directory.

mod common;

use common::kiro_context;
use std::collections::BTreeMap;
use std::fs;
use taptik_core::conflict::{
    detect_conflicts, ConflictResolver, ResolutionStrategy, ResolveOptions,
};
use taptik_core::context::{BundleCodec, BundleOptions, ContextBundle};
use taptik_core::crypto::CryptoConfig;
use taptik_core::Error;
use tempfile::TempDir;

fn encrypted_options() -> BundleOptions {
    use base64::Engine;
    BundleOptions {
        compress: true,
        crypto: Some(CryptoConfig {
            secret: Some(base64::engine::general_purpose::STANDARD.encode([42u8; 32])),
            derive_key: false,
        }),
        ..Default::default()
    }
}

fn incoming(entries: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
    entries
        .iter()
        .map(|(p, c)| (p.to_string(), c.to_vec()))
        .collect()
}

#[test]
fn test_encrypted_bundle_round_trip_through_file() {
    common::init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("export.taptik");

    let codec = BundleCodec::new(encrypted_options());
    let bundle = ContextBundle::new(vec![kiro_context()]);
    codec.save(&bundle, &path).unwrap();

    // The on-disk payload is ciphertext, not JSON.
    let raw = fs::read(&path).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());

    let loaded = codec.load(&path).unwrap();
    assert_eq!(loaded, bundle);
}

#[test]
fn test_tampered_bundle_yields_no_partial_data() {
    common::init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("export.taptik");

    let codec = BundleCodec::new(encrypted_options());
    codec
        .save(&ContextBundle::new(vec![kiro_context()]), &path)
        .unwrap();

    let mut raw = fs::read(&path).unwrap();
    let mid = raw.len() / 2;
    raw[mid] ^= 0xff;
    fs::write(&path, &raw).unwrap();

    assert!(matches!(codec.load(&path), Err(Error::Decrypt(_))));
}

#[test]
fn test_wrong_secret_cannot_read_bundle() {
    common::init_tracing();
    use base64::Engine;

    let codec = BundleCodec::new(encrypted_options());
    let encoded = codec.encode(&ContextBundle::new(vec![kiro_context()])).unwrap();

    let other = BundleCodec::new(BundleOptions {
        compress: true,
        crypto: Some(CryptoConfig {
            secret: Some(base64::engine::general_purpose::STANDARD.encode([1u8; 32])),
            derive_key: false,
        }),
        ..Default::default()
    });
    assert!(other.decode(&encoded).is_err());
}

#[test]
fn test_deploy_merge_workflow() {
    common::init_tracing();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("settings.json"),
        br#"{"theme": "dark", "tab_size": 2}"#,
    )
    .unwrap();
    fs::write(temp.path().join("rules.md"), "# Local rules\n").unwrap();

    let files = incoming(&[
        ("settings.json", br#"{"theme": "light", "format_on_save": true}"# as &[u8]),
        ("rules.md", b"# Imported rules\n"),
        ("new.json", br#"{"fresh": true}"#),
    ]);

    let conflicts = detect_conflicts(temp.path(), &files).unwrap();
    // new.json does not exist yet, so only two conflicts.
    assert_eq!(conflicts.len(), 2);

    let resolver = ConflictResolver::new(temp.path());
    let outcome = resolver.resolve_conflicts(
        conflicts,
        ResolutionStrategy::Merge,
        &ResolveOptions::default(),
    );
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.resolved.len(), 2);

    let applied = resolver.apply_resolutions(&outcome.resolved);
    assert_eq!(applied.failed.len(), 0);

    // JSON merge keeps keys unique to either side; incoming wins on clash.
    let merged: serde_json::Value =
        serde_json::from_slice(&fs::read(temp.path().join("settings.json")).unwrap()).unwrap();
    assert_eq!(merged["theme"], "light");
    assert_eq!(merged["tab_size"], 2);
    assert_eq!(merged["format_on_save"], true);

    // Markdown merge concatenates both documents.
    let rules = fs::read_to_string(temp.path().join("rules.md")).unwrap();
    assert!(rules.contains("# Local rules"));
    assert!(rules.contains("# Imported rules"));
    assert!(rules.contains("---"));
}

#[test]
fn test_deploy_backup_workflow() {
    common::init_tracing();
    let temp = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();
    fs::write(temp.path().join("settings.json"), br#"{"old": true}"#).unwrap();

    let conflicts =
        detect_conflicts(temp.path(), &incoming(&[("settings.json", br#"{"new": true}"#)]))
            .unwrap();

    let resolver = ConflictResolver::new(temp.path());
    let outcome = resolver.resolve_conflicts(
        conflicts,
        ResolutionStrategy::Backup,
        &ResolveOptions {
            backup_dir: Some(backups.path().to_path_buf()),
            ..Default::default()
        },
    );
    resolver.apply_resolutions(&outcome.resolved);

    assert_eq!(
        fs::read(temp.path().join("settings.json")).unwrap(),
        br#"{"new": true}"#
    );

    let backup: Vec<_> = fs::read_dir(backups.path()).unwrap().collect();
    assert_eq!(backup.len(), 1);
    assert_eq!(
        fs::read(backup[0].as_ref().unwrap().path()).unwrap(),
        br#"{"old": true}"#
    );
}

#[test]
fn test_skip_strategy_is_idempotent() {
    common::init_tracing();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), b"keep me").unwrap();

    let files = incoming(&[("a.txt", b"replace me")]);
    let resolver = ConflictResolver::new(temp.path());

    for _ in 0..2 {
        let conflicts = detect_conflicts(temp.path(), &files).unwrap();
        let outcome = resolver.resolve_conflicts(
            conflicts,
            ResolutionStrategy::Skip,
            &ResolveOptions::default(),
        );
        resolver.apply_resolutions(&outcome.resolved);
    }

    assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"keep me");
}
