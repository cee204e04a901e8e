//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods.
//! **Exceptions**: the pause between retry attempts, test code.
//!
//! The TUI waits on terminal events, job outcomes and a
//! `tokio::time::interval` tick; nothing needs to sleep.

use architectural_enforcement::{code_part, is_in_test_code, rust_files, PRODUCTION_DIRS};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for file in rust_files(dir) {
            let lines = file.lines();
            for (idx, line) in lines.iter().enumerate() {
                let code = code_part(line);
                if !(code.contains("::sleep(") || code.contains(".sleep(")) {
                    continue;
                }
                if is_in_test_code(&lines, idx) || is_backoff_context(&lines, idx) {
                    continue;
                }
                violations.push(format!(
                    "{}:{} - {}",
                    file.path.display(),
                    idx + 1,
                    line.trim()
                ));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nACCEPTABLE: pause between retry attempts, test code.");
        eprintln!("Use tokio::time::interval() or wait on a channel instead.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

/// Test that blocking thread sleep is never used, not even for backoff
#[test]
fn test_no_thread_sleep_anywhere() {
    for dir in PRODUCTION_DIRS {
        for file in rust_files(dir) {
            for (idx, line) in file.lines().iter().enumerate() {
                assert!(
                    !code_part(line).contains("thread::sleep"),
                    "{}:{} blocks the runtime: {}",
                    file.path.display(),
                    idx + 1,
                    line.trim()
                );
            }
        }
    }
}

/// Check if sleep is the pause between retry attempts
fn is_backoff_context(lines: &[&str], current_idx: usize) -> bool {
    let context_range = current_idx.saturating_sub(6)..=current_idx;
    let has_retry_context = lines[context_range.clone()].iter().any(|l| {
        let l = l.to_lowercase();
        l.contains("retry") || l.contains("attempt")
    });
    let uses_backoff = lines[context_range]
        .iter()
        .any(|l| l.contains("backoff"));
    has_retry_context && uses_backoff
}
