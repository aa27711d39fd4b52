// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the configuration module

use photobooth::Config;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert!(
        !config.open_after_save,
        "Composites should not auto-open by default"
    );
    assert!(config.overlay_path.is_none(), "No overlay by default");
}

#[test]
fn test_config_roundtrip() {
    let mut config = Config::default();
    config.last_camera_path = Some("/dev/video2".to_string());
    config.output_dir = Some("/tmp/booth".into());
    config.mirror_preview = false;

    let json = serde_json::to_string(&config).expect("serialize");
    let parsed: Config = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(parsed, config);
}

#[test]
fn test_config_tolerates_partial_files() {
    // A config written by an older version must still load
    let parsed: Config = serde_json::from_str(r#"{"mirror_preview": false}"#).expect("parse");

    assert!(!parsed.mirror_preview);
    assert!(parsed.last_camera_path.is_none());
}
