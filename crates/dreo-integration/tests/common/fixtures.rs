//! Test fixtures

use std::path::{Path, PathBuf};

use dreo_client::DebugTestModePayload;

/// Base directory holding `debug_test_mode/devices.json`
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn load_payload() -> DebugTestModePayload {
    DebugTestModePayload::load(fixtures_dir())
        .unwrap_or_else(|e| panic!("Failed to load debug test mode payload: {}", e))
}

/// Write `devices.json` into a fresh temporary base directory
pub fn write_payload(json: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = DebugTestModePayload::path(dir.path());
    std::fs::create_dir_all(path.parent().expect("payload parent")).expect("create payload dir");
    std::fs::write(&path, json).expect("write payload");
    dir
}
