// Regression tests for the `monkey` binary: every subcommand against the
// scripts in tests/scripts, asserting only on what a user sees.

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn monkey() -> Command {
    Command::cargo_bin("monkey").unwrap()
}

#[test]
fn run_prints_program_output() {
    monkey()
        .args(["run", "tests/scripts/unless.mk"])
        .assert()
        .success()
        .stdout(contains("greater").and(contains("not greater").not()));
}

#[test]
fn run_prints_the_final_value() {
    monkey()
        .args(["run", "tests/scripts/arith.mk"])
        .assert()
        .success()
        .stdout(contains("10"));
}

#[test]
fn macroexpand_prints_the_expanded_program() {
    monkey()
        .args(["macroexpand", "tests/scripts/unless.mk"])
        .assert()
        .success()
        .stdout(contains(r#"if ((!(10 > 5))) { puts("not greater"); } else { puts("greater"); };"#))
        .stdout(contains("macro(").not());
}

#[test]
fn macrotrace_names_each_expansion() {
    monkey()
        .args(["macrotrace", "tests/scripts/arith.mk"])
        .assert()
        .success()
        .stdout(contains("Step 0: square").and(contains("(3 * 3)")));
}

#[test]
fn list_macros_prints_definitions() {
    monkey()
        .args(["list-macros", "tests/scripts/unless.mk"])
        .assert()
        .success()
        .stdout(contains("unless"));
}

#[test]
fn ast_prints_json() {
    monkey()
        .args(["ast", "tests/scripts/arith.mk"])
        .assert()
        .success()
        .stdout(contains("\"statements\"").and(contains("\"Macro\"")));
}

#[test]
fn cli_reports_miette_diagnostics_on_expansion_error() {
    monkey()
        .args(["run", "tests/scripts/malformed.mk"])
        .assert()
        .failure()
        .stderr(contains("monkey::expansion").or(contains("returned INTEGER")));
}

#[test]
fn cli_reports_miette_diagnostics_on_parse_error() {
    monkey()
        .args(["macroexpand", "tests/scripts/syntax_error.mk"])
        .assert()
        .failure()
        .stderr(contains("monkey::parse").or(contains("expected")));
}

#[test]
fn max_depth_flag_limits_recursion() {
    monkey()
        .args(["--max-depth", "20", "run", "tests/scripts/recursion.mk"])
        .assert()
        .failure()
        .stderr(contains("maximum call depth"));
}

#[test]
fn default_depth_runs_to_its_limit() {
    monkey()
        .args(["run", "tests/scripts/countdown.mk"])
        .assert()
        .success()
        .stdout(contains("reached\n0"));
}

#[test]
fn default_depth_reports_overflow_as_a_diagnostic() {
    monkey()
        .args(["run", "tests/scripts/countdown_past_limit.mk"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("maximum call depth of 256"));
}

#[test]
fn missing_file_is_reported() {
    monkey()
        .args(["run", "tests/scripts/does_not_exist.mk"])
        .assert()
        .failure()
        .stderr(contains("failed to read"));
}
