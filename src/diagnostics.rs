// CLASSIFICATION: COMMUNITY
// Filename: diagnostics.rs v1.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Diagnostics sink.
//!
//! Thread helpers never print. Failures and fault reports are handed to a
//! [`DiagnosticSink`] supplied by the caller; [`LogSink`] routes them into
//! the `log` facade and [`MemorySink`] keeps them for inspection.

use std::sync::Mutex;

use log::Level;

/// Severity of a diagnostic event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl DiagnosticLevel {
    fn log_level(self) -> Level {
        match self {
            DiagnosticLevel::Info => Level::Info,
            DiagnosticLevel::Warning => Level::Warn,
            DiagnosticLevel::Error | DiagnosticLevel::Critical => Level::Error,
        }
    }
}

/// A single diagnostic event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub category: &'static str,
    pub message: String,
    pub severity: DiagnosticLevel,
}

/// Destination for diagnostics. Emission is fire-and-forget.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, entry: DiagnosticEntry);
}

/// Build an entry and hand it to `sink`.
pub fn capture(sink: &dyn DiagnosticSink, category: &'static str, message: String, severity: DiagnosticLevel) {
    sink.emit(DiagnosticEntry {
        category,
        message,
        severity,
    });
}

/// Forwards entries to the `log` facade under `cohesix_thread::<category>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, entry: DiagnosticEntry) {
        log::log!(
            target: "cohesix_thread::diagnostics",
            entry.severity.log_level(),
            "[{}] {}",
            entry.category,
            entry.message
        );
    }
}

/// Records every entry in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages only, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.message).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, entry: DiagnosticEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
