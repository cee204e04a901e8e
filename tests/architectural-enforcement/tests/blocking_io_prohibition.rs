//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the TUI and the core MUST NOT use blocking I/O
//! once the runtime is running.
//! **Required**: Use `tokio::fs` and async `reqwest`, not `std::fs` or
//! `reqwest::blocking`.
//!
//! Blocking calls are tolerated in non-async functions that run before the
//! event loop starts (config loading, log file setup) and in test code.

use architectural_enforcement::{
    code_part, enclosing_fn, is_in_async_function, is_in_test_code, rust_files, SourceFile,
    PRODUCTION_DIRS,
};

/// Test that production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();
    for dir in PRODUCTION_DIRS {
        for file in rust_files(dir) {
            check_file(&file, &mut violations);
        }
    }

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nFORBIDDEN in async code:");
        eprintln!("  - std::fs::*, std::net::*");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("\nREQUIRED:");
        eprintln!("  - tokio::fs::read_to_string().await, tokio::fs::write().await");
        eprintln!("  - reqwest::Client with .await");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

fn check_file(file: &SourceFile, violations: &mut Vec<String>) {
    let lines = file.lines();

    for (idx, line) in lines.iter().enumerate() {
        let code = code_part(line);

        if is_in_test_code(&lines, idx) {
            continue;
        }

        // Always forbidden, sync or not
        if code.contains("reqwest::blocking") {
            violations.push(format!(
                "{}:{} - Blocking HTTP client: {}",
                file.path.display(),
                idx + 1,
                line.trim()
            ));
        }

        let blocking = code.contains("std::fs::") || code.contains("std::net::");
        if !blocking {
            continue;
        }

        // Before the runtime or outside any function (imports) is fine only in sync code
        let in_async = is_in_async_function(&lines, idx);
        let in_sync_fn = enclosing_fn(&lines, idx).is_some() && !in_async;
        if !in_sync_fn {
            violations.push(format!(
                "{}:{} - Blocking I/O: {}",
                file.path.display(),
                idx + 1,
                line.trim()
            ));
        }
    }
}

/// The conversation store must stay async; it runs inside spawned jobs
#[test]
fn test_store_uses_async_fs() {
    let files = rust_files("core/src");
    let store = files
        .iter()
        .find(|f| f.is("core/src/store.rs"))
        .expect("core/src/store.rs exists");

    let production: Vec<&str> = store
        .lines()
        .into_iter()
        .take_while(|l| l.trim() != "#[cfg(test)]")
        .collect();

    assert!(production.iter().any(|l| l.contains("tokio::fs::")));
    assert!(!production.iter().any(|l| code_part(l).contains("std::fs")));
}
