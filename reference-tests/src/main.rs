//! Reference test runner
//!
//! Runs every validation scenario against the shipped configurations and
//! exits non-zero if any of them fails.

use reference_tests::all_tests;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let tests = all_tests(Path::new("configs"));
    tracing::info!("SPH reference test suite: {} scenarios", tests.len());

    let mut results = Vec::new();
    let mut errors = 0;

    for test in tests {
        match test.run() {
            Ok(result) => {
                result.print_summary();
                results.push(result);
            }
            Err(e) => {
                eprintln!("\nERROR running test {}: {}", test.name, e);
                errors += 1;
            }
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed + errors;

    println!("\n{}", "=".repeat(80));
    println!("OVERALL SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total tests: {}", results.len() + errors);
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("{}", "=".repeat(80));

    if failed > 0 {
        std::process::exit(1);
    }
}
