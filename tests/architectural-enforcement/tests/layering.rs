//! Integration Test: Conductor Layering
//!
//! **Policy**: The conductor core is headless. It must not depend on or name
//! any terminal UI crate; only the `tui` crate may.

use std::fs;

use architectural_enforcement::{rust_files, scan_source, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("conductor/core/Cargo.toml"))
        .expect("read core manifest");

    for ui in UI_CRATES {
        let declared = manifest
            .lines()
            .map(str::trim)
            .any(|line| line.starts_with(&format!("{ui} ")) || line.starts_with(&format!("{ui}=")));
        assert!(!declared, "conductor core depends on {ui}");
    }
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let core = workspace_root().join("conductor/core/src");
    let mut found = Vec::new();

    for path in rust_files(&core) {
        let content = fs::read_to_string(&path).unwrap_or_default();
        for line in scan_source(&path, &content) {
            if UI_CRATES
                .iter()
                .any(|ui| line.code.contains(&format!("{ui}::")))
            {
                found.push(line.to_string());
            }
        }
    }

    assert!(found.is_empty(), "UI code in the core:\n  {}", found.join("\n  "));
}
