//! # Logger Service
//!
//! Structured diagnostics for the task subsystem.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Entries are kept in memory so tests can assert on them, and each one is
//! forwarded to `tracing` so a host process can attach any subscriber.

use core_types::TaskId;
use serde::{Deserialize, Serialize};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Task the entry is about (if any)
    pub source: Option<TaskId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Sets the source task
    pub fn with_source(mut self, source: TaskId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Returns the value of the first field named `key`
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn emit(&self) {
        let source = self
            .source
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        match self.level {
            LogLevel::Debug => tracing::debug!(%source, %fields, "{}", self.message),
            LogLevel::Info => tracing::info!(%source, %fields, "{}", self.message),
            LogLevel::Warn => tracing::warn!(%source, %fields, "{}", self.message),
            LogLevel::Error => tracing::error!(%source, %fields, "{}", self.message),
        }
    }
}

/// In-memory diagnostic log
///
/// Keeps every recorded entry in order. Recording also emits the entry as a
/// `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records an entry
    pub fn record(&mut self, entry: LogEntry) {
        entry.emit();
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at exactly `level`
    pub fn at_level(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// Counts entries at exactly `level`
    pub fn count(&self, level: LogLevel) -> usize {
        self.at_level(level).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
