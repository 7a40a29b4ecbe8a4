//! Event-log reader: one JSON object per line with `case_id`, `activity`
//! and an RFC 3339 `timestamp`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;
use varscope_core::{Event, VarscopeError};

/// Read all events from a JSON-lines file.
pub fn read_events(path: &Path) -> Result<Vec<Event>, VarscopeError> {
    let file = File::open(path)?;
    let events = read_events_from(BufReader::new(file))?;
    info!(path = %path.display(), events = events.len(), "event log loaded");
    Ok(events)
}

/// Read events from any buffered reader. Blank lines are skipped.
pub fn read_events_from<R: BufRead>(reader: R) -> Result<Vec<Event>, VarscopeError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(trimmed).map_err(|e| VarscopeError::InvalidEvent {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        if event.activity.is_empty() {
            return Err(VarscopeError::InvalidEvent {
                line: idx + 1,
                reason: format!("empty activity label for case '{}'", event.case_id),
            });
        }
        events.push(event);
    }
    Ok(events)
}
