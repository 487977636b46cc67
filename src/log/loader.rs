//! Event Seed Loader
//!
//! Reads the initial event set for a log from a line-oriented file: one event
//! per line, in file order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{LogError, Result};

/// Load events from a file, one per line.
///
/// Lines are raw bytes and need not be UTF-8. Line terminators (`\n` or
/// `\r\n`) are not part of the event. Blank lines are kept as empty events;
/// a final terminator does not add one.
pub fn load_events_from_file(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    info!("Loading seed events from {:?}", path);

    let file = File::open(path)
        .map_err(|e| LogError::IoError(format!("Failed to open {:?}: {}", path, e)))?;

    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (line_num, line) in reader.split(b'\n').enumerate() {
        let mut line = line.map_err(|e| {
            LogError::IoError(format!("Failed to read line {}: {}", line_num + 1, e))
        })?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        events.push(line);
    }

    debug!("Loaded {} events from {:?}", events.len(), path);
    Ok(events)
}
