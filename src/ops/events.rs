//! Packaging events.
//!
//! Archive builds report what they do through an [`EventSink`] instead of
//! logging directly, so that callers can route the same information to
//! `tracing`, to machine-readable JSON lines, or into a `Vec` for inspection.
//!
//! # Event Types
//!
//! - `placed`: a document was assigned its path inside the archive
//! - `outside-imports`: some documents live outside the main directory
//! - `import-rewritten`: an import statement line was rewritten
//! - `manifest`: the generated manifest
//! - `archiving`: compression of the staging directory started
//! - `archive-written`: the archive was moved to its destination

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

/// How loudly an event should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
}

/// An event emitted while building a source archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason")]
pub enum PackEvent {
    /// A document's archive path was chosen.
    #[serde(rename = "placed")]
    Placed {
        archive_path: String,
        abspath: String,
    },

    /// One or more documents were relocated under the quarantine directory.
    /// Emitted at most once per build.
    #[serde(rename = "outside-imports")]
    OutsideImports { quarantine_dir: String },

    /// An import statement line was rewritten.
    #[serde(rename = "import-rewritten")]
    ImportRewritten {
        document: String,
        line: usize,
        before: String,
        after: String,
    },

    /// The manifest that will be written into the archive.
    #[serde(rename = "manifest")]
    Manifest { manifest: serde_json::Value },

    /// Compression of the staging directory started.
    #[serde(rename = "archiving")]
    Archiving { staging_dir: PathBuf },

    /// The archive was moved to its final destination.
    #[serde(rename = "archive-written")]
    ArchiveWritten { archive: PathBuf, from: PathBuf },
}

impl PackEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            PackEvent::OutsideImports { .. } => EventLevel::Warn,
            PackEvent::ImportRewritten { .. } | PackEvent::Manifest { .. } => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }

    /// Human-readable one-line description.
    pub fn message(&self) -> String {
        match self {
            PackEvent::Placed {
                archive_path,
                abspath,
            } => format!("{} <= {}", archive_path, abspath),
            PackEvent::OutsideImports { quarantine_dir } => format!(
                "One or more source files are imported from outside the top-level WDL's directory. \
                 The source archive will store them under {}/ and WDL import statements will be \
                 rewritten to match.",
                quarantine_dir
            ),
            PackEvent::ImportRewritten {
                document,
                line,
                before,
                after,
            } => format!("{}:{}\n  {}\n  => {}", document, line, before, after),
            PackEvent::Manifest { manifest } => format!("manifest = {}", manifest),
            PackEvent::Archiving { staging_dir } => {
                format!("archiving {}", staging_dir.display())
            }
            PackEvent::ArchiveWritten { archive, from } => {
                format!("{} <= {}", archive.display(), from.display())
            }
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receiver of packaging events.
pub trait EventSink {
    fn emit(&mut self, event: PackEvent);
}

/// Forwards events to `tracing` at their level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: PackEvent) {
        match event.level() {
            EventLevel::Debug => tracing::debug!("{}", event.message()),
            EventLevel::Info => tracing::info!("{}", event.message()),
            EventLevel::Warn => tracing::warn!("{}", event.message()),
        }
    }
}

/// Writes each event as one JSON object per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn emit(&mut self, event: PackEvent) {
        if let Err(e) = writeln!(self.out, "{}", event.to_json()) {
            tracing::debug!("failed to write event: {}", e);
        }
    }
}

impl EventSink for Vec<PackEvent> {
    fn emit(&mut self, event: PackEvent) {
        self.push(event);
    }
}
