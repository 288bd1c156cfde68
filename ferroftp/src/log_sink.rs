//! # Log sink
//!
//! Destination of the protocol trace written by sessions and listing parsers

use std::fmt;
use std::sync::Arc;

use log::Level;

/// Receives leveled trace lines.
///
/// A sink is injected at construction and shared with clones; nothing is routed through
/// process wide state unless the [`LogCrateSink`] is used.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, line: &str) {
        self(level, line)
    }
}

/// Forwards every line to the `log` facade, with target `ferroftp`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, level: Level, line: &str) {
        log!(target: "ferroftp", level, "{line}");
    }
}

/// Shared handle to a sink
#[derive(Clone)]
pub struct SharedLogSink(Arc<dyn LogSink>);

impl SharedLogSink {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub(crate) fn error(&self, line: impl AsRef<str>) {
        self.0.log(Level::Error, line.as_ref());
    }

    pub(crate) fn warn(&self, line: impl AsRef<str>) {
        self.0.log(Level::Warn, line.as_ref());
    }

    pub(crate) fn info(&self, line: impl AsRef<str>) {
        self.0.log(Level::Info, line.as_ref());
    }

    pub(crate) fn debug(&self, line: impl AsRef<str>) {
        self.0.log(Level::Debug, line.as_ref());
    }

    pub(crate) fn trace(&self, line: impl AsRef<str>) {
        self.0.log(Level::Trace, line.as_ref());
    }
}

impl Default for SharedLogSink {
    fn default() -> Self {
        Self::new(LogCrateSink)
    }
}

impl fmt::Debug for SharedLogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedLogSink")
    }
}
