//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the session core and the TUI MUST NOT call
//! sleep methods. Countdown and animation timing comes from
//! `tokio::time::interval` tasks owned by the scheduler.
//! **Exceptions**: test code

use architectural_enforcement::find_violations;

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(&["::sleep(", ".sleep(", "sleep_until("]);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ ACCEPTABLE:");
        eprintln!("  - Test code (#[cfg(test)] modules, tests/ directories)");
        eprintln!("  - Periodic tasks using tokio::time::interval()");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep to wait for a countdown or animation frame");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
