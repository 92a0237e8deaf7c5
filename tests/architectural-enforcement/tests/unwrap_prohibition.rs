//! Integration Test: Panic-Free Production Code
//!
//! **Policy**: Production code MUST NOT call `unwrap()` or `expect()`. Lookup
//! and execution failures are logged and surfaced as session messages; the
//! session loop must never panic on bad input.
//! **Allowed**: `unwrap_or`, `unwrap_or_else`, `unwrap_or_default`, test code

use architectural_enforcement::find_violations;

#[test]
fn test_no_unwrap_in_production_code() {
    let violations = find_violations(&[".unwrap()", ".expect("]);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Panicking calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ Use `?`, a typed error, or an `unwrap_or*` fallback instead.");

        panic!(
            "\nFound {} unwrap/expect call(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
