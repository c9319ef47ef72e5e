//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing, colorizing output and
//! rendering expansion traces. By centralizing output logic here, we keep a
//! consistent user experience across all commands.

// ============================================================================
// OUTPUT SINKS: OutputBuffer and StdoutSink implementations
// ============================================================================

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::macros::MacroExpansionStep;
use crate::runtime::OutputSink;

/// OutputBuffer: collects output into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
    lines: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        // Separators go between lines, so an empty first line still counts.
        if self.lines > 0 {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
        self.lines += 1;
    }
}

/// StdoutSink: writes output to stdout for CLI use.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

/// Prints a macro expansion trace with a colored diff per step.
///
/// Each step is shown as the diff between the call and the syntax that
/// replaced it.
pub fn print_trace(trace: &[MacroExpansionStep]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if trace.is_empty() {
        let _ = writeln!(stdout, "(no macro calls)");
        return;
    }

    for (i, step) in trace.iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "--- Step {}: {} ---", i, step.macro_name);
        let _ = stdout.reset();

        let before = step.input.value.to_string();
        let after = step.output.value.to_string();
        let changeset = Changeset::new(&before, &after, "\n");
        print_diff(&mut stdout, &changeset.diffs);
        let _ = writeln!(stdout);
    }
}

/// Prints an evaluation result to the console.
pub fn print_result(result: &impl std::fmt::Display) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = writeln!(stdout, "{}", result);
    let _ = stdout.reset();
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                let _ = stdout.reset();
                let _ = writeln!(stdout, " {}", x);
            }
            Difference::Add(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = writeln!(stdout, "+{}", x);
            }
            Difference::Rem(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = writeln!(stdout, "-{}", x);
            }
        }
    }
    let _ = stdout.reset();
}
