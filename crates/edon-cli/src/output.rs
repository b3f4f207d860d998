// crates/edon-cli/src/output.rs
// ============================================================================
// Module: Output Helpers
// Description: Small `stdout`-writing helpers so subcommands never reach
// for `println!` directly.
// Purpose: Keep output going through `std::io::Write`, so a broken pipe
// surfaces as a normal `CliError` rather than a `println!` panic.
// Dependencies: serde, serde_json
// ============================================================================

use std::io::Write;

use serde::Serialize;

use crate::error::CliError;

/// Writes a single line to stdout.
pub fn write_line(message: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(CliError::Output)
}

/// Pretty-prints `value` to stdout as JSON.
pub fn write_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    write_line(&rendered)
}
