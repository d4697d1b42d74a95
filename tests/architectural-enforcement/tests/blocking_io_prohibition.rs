//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code uses `tokio::process`, `tokio::net` and async
//! `reqwest`. `std::fs` is tolerated in plain functions that run before or
//! outside the event loop (config loading, log file setup).

use architectural_enforcement::{production_lines, SourceLine};

fn violations(check: impl Fn(&SourceLine) -> bool) -> Vec<String> {
    production_lines()
        .into_iter()
        .filter(|l| check(l))
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn test_no_blocking_process_spawns() {
    let found = violations(|l| l.code.contains("std::process::Command"));
    assert!(
        found.is_empty(),
        "Use tokio::process::Command instead:\n  {}",
        found.join("\n  ")
    );
}

#[test]
fn test_no_blocking_http_client() {
    let found = violations(|l| l.code.contains("reqwest::blocking"));
    assert!(found.is_empty(), "Blocking HTTP client:\n  {}", found.join("\n  "));
}

#[test]
fn test_no_blocking_network_io() {
    let found = violations(|l| l.code.contains("std::net::"));
    assert!(found.is_empty(), "Blocking network I/O:\n  {}", found.join("\n  "));
}

#[test]
fn test_no_blocking_fs_in_async_code() {
    let found = violations(|l| l.in_async_fn && l.code.contains("std::fs::"));
    assert!(
        found.is_empty(),
        "Blocking file I/O inside async functions:\n  {}",
        found.join("\n  ")
    );
}
