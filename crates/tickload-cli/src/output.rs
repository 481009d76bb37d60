use std::io::{self, Write};

use serde_json::Value;

use crate::error::CliError;

/// Write one JSON document to stdout.
pub fn render(value: &Value, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, value)?;
    } else {
        serde_json::to_writer(&mut handle, value)?;
    }
    writeln!(handle)?;
    Ok(())
}
