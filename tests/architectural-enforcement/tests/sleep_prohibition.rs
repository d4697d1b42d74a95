//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code waits on I/O, channels or intervals, never on
//! a sleep. `std::thread::sleep` is forbidden everywhere; `tokio::time::sleep`
//! is allowed only for the backend startup delay.

use architectural_enforcement::production_lines;

/// Files where a timed async wait is the documented behavior
const TIMED_WAIT_ALLOWED: &[&str] = &["backend/process.rs"];

#[test]
fn test_no_thread_sleep_in_production_code() {
    let violations: Vec<String> = production_lines()
        .into_iter()
        .filter(|l| l.code.contains("thread::sleep"))
        .map(|l| l.to_string())
        .collect();

    assert!(
        violations.is_empty(),
        "Blocking sleeps in production code:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn test_async_sleep_only_for_startup_delay() {
    let violations: Vec<String> = production_lines()
        .into_iter()
        .filter(|l| l.code.contains("time::sleep"))
        .filter(|l| {
            let path = l.path.to_string_lossy().replace('\\', "/");
            !TIMED_WAIT_ALLOWED.iter().any(|allowed| path.ends_with(allowed))
        })
        .map(|l| l.to_string())
        .collect();

    assert!(
        violations.is_empty(),
        "Sleep used where an I/O wait or interval belongs:\n  {}",
        violations.join("\n  ")
    );
}
