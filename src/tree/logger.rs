//! Logging capability handed to tree views.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

pub trait TreeLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards to the process `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TreeLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "family_tree::tree", "{}", message),
            LogLevel::Info => tracing::info!(target: "family_tree::tree", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "family_tree::tree", "{}", message),
            LogLevel::Error => tracing::error!(target: "family_tree::tree", "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Keeps the most recent entries in memory for inspection.
#[derive(Debug)]
pub struct MemoryLogger {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl MemoryLogger {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("log buffer lock poisoned");
        entries.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("log buffer lock poisoned")
            .clear();
    }

    /// One `timestamp [LEVEL] message` line per entry.
    pub fn export(&self) -> String {
        self.entries()
            .iter()
            .map(|e| format!("{} [{}] {}", e.timestamp.to_rfc3339(), e.level, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl TreeLogger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let mut entries = self.entries.lock().expect("log buffer lock poisoned");
        entries.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }
}
