// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camera_mirror::errors::AppError;
use camera_mirror::{Config, PreviewGravity, SessionPreset};
use std::io::Write;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.preview_gravity, PreviewGravity::Fill);
    assert_eq!(config.session_preset, SessionPreset::High);
    assert_eq!(config.video_sink, "autovideosink");
}

#[test]
fn test_preview_options_follow_config() {
    let config = Config {
        mirror_preview: false,
        preview_gravity: PreviewGravity::Fit,
        ..Config::default()
    };

    let options = config.preview_options();
    assert!(!options.mirror);
    assert_eq!(options.gravity, PreviewGravity::Fit);
    assert_eq!(options.fill_aspect, config.fill_aspect);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"mirror_preview": false, "session_preset": "low"}}"#).unwrap();

    let config = Config::load_from(file.path()).unwrap();
    assert!(!config.mirror_preview);
    assert_eq!(config.session_preset, SessionPreset::Low);
    assert_eq!(config.preview_gravity, PreviewGravity::Fill);
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let err = Config::load_from(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"fill_aspect": [0, 9]}}"#).unwrap();
    assert!(matches!(
        Config::load_from(file.path()),
        Err(AppError::Config(_))
    ));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"video_sink": " "}}"#).unwrap();
    assert!(matches!(
        Config::load_from(file.path()),
        Err(AppError::Config(_))
    ));
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""preview_gravity":"fill""#));
    assert!(json.contains(r#""session_preset":"high""#));
}
