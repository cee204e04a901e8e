//! Integration Test: Core/Surface Layering
//!
//! **Policy**: `delphi-core` is headless. It must not depend on or mention
//! terminal crates, so another surface can drive the same controller.
//! Surfaces talk to the backend only through the core, never directly.

use std::fs;

use architectural_enforcement::{code_part, rust_files, workspace_root};

const TERMINAL_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_terminal_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("core/Cargo.toml"))
        .expect("core/Cargo.toml readable");

    for krate in TERMINAL_CRATES {
        assert!(
            !manifest.lines().any(|l| l.trim_start().starts_with(krate)),
            "delphi-core must not depend on {krate}"
        );
    }
}

#[test]
fn test_core_sources_have_no_terminal_code() {
    for file in rust_files("core/src") {
        for (idx, line) in file.lines().iter().enumerate() {
            let code = code_part(line);
            for krate in TERMINAL_CRATES {
                assert!(
                    !code.contains(&format!("{krate}::")),
                    "{}:{} uses {krate} in the headless core",
                    file.path.display(),
                    idx + 1
                );
            }
        }
    }
}

#[test]
fn test_tui_does_not_call_backend_directly() {
    for file in rust_files("tui/src") {
        for (idx, line) in file.lines().iter().enumerate() {
            assert!(
                !code_part(line).contains("reqwest"),
                "{}:{} makes HTTP calls outside delphi-core",
                file.path.display(),
                idx + 1
            );
        }
    }
}
