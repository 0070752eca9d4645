//! Enforcement over the display crates' production code

use architectural_enforcement::{find_violations, workspace_root, Violation};

fn report(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn engine_never_sleeps() {
    // Deadlines go through the scheduler; the runtime waits with `sleep_until`
    let dir = workspace_root().join("display/core/src");
    let violations = find_violations(
        &dir,
        &["thread::sleep", "time::sleep(", "block_on(", "blocking_recv("],
    );
    assert!(violations.is_empty(), "blocking calls:\n{}", report(&violations));
}

#[test]
fn production_code_propagates_errors() {
    for crate_dir in ["display/core/src", "display/daemon/src"] {
        let dir = workspace_root().join(crate_dir);
        let violations = find_violations(&dir, &[".unwrap()", ".expect("]);
        assert!(violations.is_empty(), "panicking calls:\n{}", report(&violations));
    }
}

#[test]
fn stdout_is_reserved_for_the_protocol() {
    for crate_dir in ["display/core/src", "display/daemon/src"] {
        let dir = workspace_root().join(crate_dir);
        let violations = find_violations(&dir, &["println!", "print!(", "dbg!("]);
        assert!(violations.is_empty(), "stdout writes:\n{}", report(&violations));
    }
}

#[test]
fn sources_are_found() {
    let core = architectural_enforcement::rust_sources(&workspace_root().join("display/core/src"));
    assert!(core.iter().any(|p| p.ends_with("engine.rs")));
}
