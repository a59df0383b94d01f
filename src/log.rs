//! Workflow event side-channel.
//!
//! Workflows and the orchestrator report lifecycle events through an
//! [`EventSink`] handed in at construction time. Sinks are side-effect-only:
//! they observe `(event, payload)` pairs and never alter the payload's
//! journey through the data path. Events arrive concurrently from
//! independently scheduled tasks, so every sink must be safe to call from
//! any execution unit.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Lifecycle stages reported through a sink.
pub mod stage {
    pub const REQUEST_RECEIVED: &str = "request_received";
    pub const REQUEST_PREPARED: &str = "request_prepared";
    pub const REQUEST_SENT: &str = "request_sent";
    pub const RESPONSE_RECEIVED: &str = "response_received";
    pub const RESPONSE_PREPARED: &str = "response_prepared";
    pub const REQUEST_FAILED: &str = "request_failed";
    pub const REQUEST_ABANDONED: &str = "request_abandoned";
}

/// Compose a workflow-scoped event name, e.g. `pbm_workflow::request_sent`.
pub fn scoped(workflow: &str, stage: &str) -> String {
    format!("{workflow}::{stage}")
}

/// A sink for workflow lifecycle events.
pub trait EventSink: Send + Sync {
    /// Record one event. Side-effect-only.
    fn emit(&self, event: &str, payload: &str);
}

/// Render one event in the record format: timestamp, calling thread, event
/// name, payload.
fn format_record(event: &str, payload: &str) -> String {
    let thread = std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string();
    let timestamp = chrono::Local::now().format("%H:%M:%S%.6f");
    format!("[{}] [{}] {} {}", timestamp, thread, event, payload)
}

/// Writes records to stderr.
pub struct StderrSink;

impl EventSink for StderrSink {
    fn emit(&self, event: &str, payload: &str) {
        eprintln!("{}", format_record(event, payload));
    }
}

/// Appends records to a log file, one per line. Write failures are dropped;
/// logging must never fail a request.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default log location under the home dot-directory.
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or(Error::NoHomeDir)?
            .join(".rxfan")
            .join("rxfan.log"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl EventSink for FileSink {
    fn emit(&self, event: &str, payload: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(file, "{}", format_record(event, payload));
        }
    }
}

/// Swallows every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &str, _payload: &str) {}
}

/// Buffers events in memory so tests can assert on emission.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(event, payload)` pairs recorded so far, in emission order.
    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().unwrap().clone()
    }

    /// Event names only, in emission order.
    pub fn names(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(recorded, _)| recorded == event)
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &str, payload: &str) {
        self.records
            .lock()
            .unwrap()
            .push((event.to_string(), payload.to_string()));
    }
}
