//! Per-entity logging with a verbosity ladder
//!
//! Each entity carries a [`Logger`] handle. Emission filters against the
//! entity's [`Verbosity`] and appends to the attached sinks; sinks must not
//! block, so the hot recompute path never waits on I/O.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Per-entity verbosity threshold
///
/// Each step of the ladder admits one more severity band than the previous
/// one; `All` additionally admits `Debug` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Verbosity {
    /// Emit nothing
    None,
    /// Errors only
    #[default]
    Error,
    /// Warnings and errors
    WarningError,
    /// Info, warnings and errors
    InfoWarningError,
    /// Everything, including debug records
    All,
}

impl Verbosity {
    /// Check whether a record of the given level passes this threshold
    pub fn admits(&self, level: LogLevel) -> bool {
        match self {
            Verbosity::None => false,
            Verbosity::Error => matches!(level, LogLevel::Error),
            Verbosity::WarningError => matches!(level, LogLevel::Warn | LogLevel::Error),
            Verbosity::InfoWarningError => {
                matches!(level, LogLevel::Info | LogLevel::Warn | LogLevel::Error)
            }
            Verbosity::All => true,
        }
    }

    /// Decode the integer form used by the `set_verbosity` command
    pub fn from_int(i: i64) -> Option<Verbosity> {
        match i {
            0 => Some(Verbosity::None),
            1 => Some(Verbosity::Error),
            2 => Some(Verbosity::WarningError),
            3 => Some(Verbosity::InfoWarningError),
            4 => Some(Verbosity::All),
            _ => None,
        }
    }

    /// Integer form used by the `get_verbosity` command
    pub fn as_int(&self) -> i64 {
        match self {
            Verbosity::None => 0,
            Verbosity::Error => 1,
            Verbosity::WarningError => 2,
            Verbosity::InfoWarningError => 3,
            Verbosity::All => 4,
        }
    }
}

/// One emitted log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity of the record
    pub level: LogLevel,
    /// Instance name of the emitting entity
    pub source: String,
    /// Record text
    pub message: String,
}

/// Output sink for log records
///
/// `write` must return quickly; buffered or in-memory sinks only on the
/// recompute path.
pub trait LogSink {
    fn write(&self, entry: &LogEntry);
}

/// In-memory sink, inspectable after the fact
#[derive(Debug, Default)]
pub struct BufferSink {
    entries: RefCell<Vec<LogEntry>>,
}

impl BufferSink {
    /// Create a shareable buffer sink
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Snapshot of the captured records
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Number of captured records
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if nothing was captured
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl LogSink for BufferSink {
    fn write(&self, entry: &LogEntry) {
        self.entries.borrow_mut().push(entry.clone());
    }
}

/// Stderr sink for host processes and demos
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, entry: &LogEntry) {
        eprintln!("[{}] {}: {}", entry.level, entry.source, entry.message);
    }
}

struct LoggerInner {
    source: String,
    verbosity: Cell<Verbosity>,
    sinks: RefCell<Vec<Rc<dyn LogSink>>>,
}

/// Cloneable logging handle owned by one entity
#[derive(Clone)]
pub struct Logger {
    inner: Rc<LoggerInner>,
}

impl Logger {
    /// Create a logger for the named source with no sinks attached
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(LoggerInner {
                source: source.into(),
                verbosity: Cell::new(Verbosity::default()),
                sinks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get the current verbosity threshold
    pub fn verbosity(&self) -> Verbosity {
        self.inner.verbosity.get()
    }

    /// Set the verbosity threshold
    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.inner.verbosity.set(verbosity);
    }

    /// Attach an output sink
    pub fn add_sink(&self, sink: Rc<dyn LogSink>) {
        self.inner.sinks.borrow_mut().push(sink);
    }

    /// Emit a record if the verbosity threshold admits it
    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        if !self.inner.verbosity.get().admits(level) {
            return;
        }
        let entry = LogEntry {
            level,
            source: self.inner.source.clone(),
            message: message.into(),
        };
        for sink in self.inner.sinks.borrow().iter() {
            sink.write(&entry);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("source", &self.inner.source)
            .field("verbosity", &self.inner.verbosity.get())
            .field("sinks", &self.inner.sinks.borrow().len())
            .finish()
    }
}
