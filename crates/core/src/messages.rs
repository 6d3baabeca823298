//! Messages sent from a panel's background worker to its interactive side.

use std::time::SystemTime;

use crate::error::Result;
use crate::state::State;

/// Identifier of one run of a plugin panel.
pub type RunId = u64;

/// Messages sent from the background context to the panel.
#[derive(Debug)]
pub enum PanelMessage {
    /// Progress in percent, already clamped to `0..=100`.
    Progress { run: RunId, percent: u8 },
    /// A log line emitted by the algorithm.
    Log { run: RunId, entry: LogEntry },
    /// The run finished. Always the last message of a run.
    Completed { run: RunId, outcome: Result<State> },
}

impl PanelMessage {
    pub fn run(&self) -> RunId {
        match self {
            Self::Progress { run, .. } | Self::Log { run, .. } | Self::Completed { run, .. } => *run,
        }
    }
}

/// Log level for console messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// A log entry for a panel console.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: SystemTime,
}

impl LogEntry {
    fn at(level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            level,
            message: msg.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Info, msg)
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Warning, msg)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Error, msg)
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::at(LogLevel::Success, msg)
    }
}
