//! Loading profile descriptor directories into the registry.

use presetconv_core::{ErrorKind, PluginProfile, ProfileRegistry};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_directory_with_one_malformed_document() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    write(
        dir,
        "diva.json",
        r#"{ "pluginName": "Diva", "pluginId": "DiVa", "aliases": ["u-he Diva"] }"#,
    );
    write(
        dir,
        "serum.json",
        r#"{ "pluginName": "Serum", "pluginId": "XfsX", "isChunkBased": true }"#,
    );
    write(
        dir,
        "zebra.json",
        r#"{ "pluginName": "Zebra2", "pluginId": "Zbr2", "notes": "legacy" }"#,
    );
    write(dir, "broken.json", r#"{ "pluginName": "Broken", "#);
    // Not a descriptor document, never looked at.
    write(dir, "readme.txt", "profiles live here");

    let mut registry = ProfileRegistry::new();
    let before = registry.get_profile_count();

    assert_eq!(registry.load_profiles_from_directory(dir), 3);
    assert_eq!(registry.get_profile_count(), before + 3);

    let err = registry.last_error().expect("malformed file should be reported");
    assert!(err.contains("broken.json"), "{err}");
}

#[test]
fn test_report_keeps_every_failure() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    write(dir, "a.json", "[]");
    write(dir, "b.json", r#"{ "pluginName": "NoId" }"#);
    write(dir, "c.json", r#"{ "pluginName": "Repro-1", "pluginId": "RPR1" }"#);

    let mut registry = ProfileRegistry::new();
    let report = registry.load_profiles_from_directory_report(dir).unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|(_, e)| e.kind() == ErrorKind::MalformedDocument));
}

#[test]
fn test_empty_directory_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut registry = ProfileRegistry::new();

    assert_eq!(registry.load_profiles_from_directory(temp_dir.path()), 0);
    assert!(registry.last_error().is_none());
}

#[test]
fn test_subdirectories_are_not_scanned() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write(&nested, "diva.json", r#"{ "pluginName": "Diva", "pluginId": "DiVa" }"#);

    let mut registry = ProfileRegistry::new();
    assert_eq!(registry.load_profiles_from_directory(temp_dir.path()), 0);
}

#[test]
fn test_load_profile_rejects_invalid_without_registering() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("noname.json");
    fs::write(&path, r#"{ "pluginId": "ABCD" }"#).unwrap();

    let mut registry = ProfileRegistry::with_builtin_profiles();
    let before = registry.get_profile_count();

    assert!(!registry.load_profile(&path));
    assert_eq!(registry.get_profile_count(), before);
    assert!(registry.last_error().unwrap().contains("noname.json"));

    assert!(!registry.load_profile(&temp_dir.path().join("missing.json")));
    assert!(registry.last_error().unwrap().contains("not found"));
}

#[test]
fn test_user_profile_overrides_builtin() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "serum.json",
        r#"{ "pluginName": "Serum", "pluginId": "XfsX", "manufacturer": "Custom",
             "aliases": ["My Serum"] }"#,
    );

    let mut registry = ProfileRegistry::with_builtin_profiles();
    let before = registry.get_profile_count();
    assert_eq!(registry.load_profiles_from_directory(temp_dir.path()), 1);

    assert_eq!(registry.get_profile_count(), before);
    let serum = registry.get_profile_by_id("XfsX").unwrap();
    assert_eq!(serum.manufacturer, "Custom");
    assert!(registry.get_profile_by_alias("my serum").is_some());
    // The built-in aliases went away with the replaced entry.
    assert!(registry.get_profile_by_alias("xfer serum").is_none());
}

#[test]
fn test_saved_profile_loads_back_equal() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("omni.json");

    let mut profile = PluginProfile::new("AmbS", "Omnisphere");
    profile.manufacturer = "Spectrasonics".into();
    profile.aliases = vec!["Omnisphere 2".into()];
    profile.required_samples = vec!["STEAM".into()];
    profile.save_to_file(&path).unwrap();

    let mut registry = ProfileRegistry::new();
    assert_eq!(registry.load_profiles_from_directory(temp_dir.path()), 1);

    let loaded = registry.get_profile_by_alias(" OMNISPHERE 2 ").unwrap();
    assert_eq!(loaded.manufacturer, profile.manufacturer);
    assert_eq!(loaded.required_samples, profile.required_samples);
}
