//! Result printing shared by every command.

use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result as pretty JSON.
///
/// Text-mode printing is command specific, so nothing is printed here for it.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet || format != OutputFormat::Json {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: failed to serialize result: {e}"),
    }
}

/// Print a progress or status line to stderr in text mode.
pub fn status(message: &str, format: OutputFormat, quiet: bool) {
    if !quiet && format == OutputFormat::Text {
        eprintln!("{message}");
    }
}
