//! Tests for loading renderer configuration from disk.

use std::io::Write;

use map_renderer::{EvictionPolicy, MapRenderer, RenderError, RendererConfig};
use tempfile::NamedTempFile;

// ============================================================================
// Helper functions
// ============================================================================

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let file = write_config(r#"{ "min_tiles_to_keep": 64, "anti_alias": false }"#);
    let config = RendererConfig::from_file(file.path()).unwrap();

    assert_eq!(config.min_tiles_to_keep, 64);
    assert!(!config.anti_alias);
    assert_eq!(config.tiles_to_keep_multiplier, 3);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = RendererConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(RenderError::Io(_))));
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("{ not json");
    let result = RendererConfig::from_file(file.path());
    assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_config(r#"{ "pattern_scale": 1000 }"#);
    assert!(matches!(
        RendererConfig::from_file(file.path()),
        Err(RenderError::InvalidConfig(_))
    ));
}

// ============================================================================
// Wiring
// ============================================================================

#[test]
fn test_config_drives_cache_policy() {
    let file = write_config(r#"{ "min_tiles_to_keep": 5, "tiles_to_keep_multiplier": 2 }"#);
    let config = RendererConfig::from_file(file.path()).unwrap();
    let renderer = MapRenderer::with_default_renderers(config).unwrap();

    assert_eq!(
        renderer.tile_cache().policy(),
        EvictionPolicy {
            min_tiles_to_keep: 5,
            tiles_to_keep_multiplier: 2,
        }
    );
    assert_eq!(renderer.iteration(), 0);
}

#[test]
fn test_renderer_rejects_invalid_config() {
    for config in [
        RendererConfig {
            pattern_scale: 0.0,
            ..RendererConfig::default()
        },
        RendererConfig {
            pattern_scale: 1.0e9,
            ..RendererConfig::default()
        },
        RendererConfig {
            tiles_to_keep_multiplier: 0,
            ..RendererConfig::default()
        },
    ] {
        assert!(matches!(
            MapRenderer::with_default_renderers(config),
            Err(RenderError::InvalidConfig(_))
        ));
    }
}
