//! Append-only JSON-lines log of presence events.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::BoxError;
use crate::tracker::PresenceEvent;

/// Receives the presence events of every processed frame.
pub trait EventSink {
    fn record(&mut self, events: &[PresenceEvent]) -> Result<(), BoxError>;
}

/// Writes one JSON object per event, one event per line.
///
/// Opened in append mode; a path must have a single writer.
pub struct JsonLinesEventLog {
    writer: BufWriter<File>,
}

impl JsonLinesEventLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for JsonLinesEventLog {
    fn record(&mut self, events: &[PresenceEvent]) -> Result<(), BoxError> {
        if events.is_empty() {
            return Ok(());
        }
        for event in events {
            serde_json::to_writer(&mut self.writer, event)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
