//! Audit channel for anomalies the engine absorbs instead of raising
//!
//! Duplicate positions, unparseable file names, unreadable WAVs and the like
//! never abort a reconciliation, but callers still need to see and count
//! them. Every stage takes a `&mut dyn AuditSink` and reports through it.
//!
//! - [`AuditLog`] keeps the events in memory (one per processed pair) so the
//!   driver can count them and write them out as JSON lines.
//! - [`LogSink`] forwards straight to the `log` facade.
//! - [`NullSink`] drops everything.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl Severity {
    fn log_level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error | Severity::Critical => log::Level::Error,
        }
    }
}

pub trait AuditSink {
    fn record(&mut self, event: &str, severity: Severity, context: Value);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    pub severity: Severity,
    pub context: Value,
}

/// In-memory collection of events for one pair
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of occurrences of a named event
    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.event == event).count()
    }

    /// Events at WARN or above
    pub fn anomaly_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.severity >= Severity::Warn)
            .count()
    }

    /// Write one JSON object per line, each tagged with run tag and pair id
    pub fn write_jsonl<W: Write>(&self, writer: &mut W, run_tag: &str, pair_id: Option<&str>) -> io::Result<()> {
        for event in &self.events {
            let line = serde_json::json!({
                "timestamp": event.timestamp,
                "level": event.severity,
                "event": event.event,
                "run_tag": run_tag,
                "pair_id": pair_id,
                "data": event.context,
            });
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    /// Replay the collected events into another sink
    pub fn forward_to(&self, sink: &mut dyn AuditSink) {
        for event in &self.events {
            sink.record(&event.event, event.severity, event.context.clone());
        }
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, event: &str, severity: Severity, context: Value) {
        self.events.push(AuditEvent {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            event: event.to_string(),
            severity,
            context,
        });
    }
}

/// Forwards events to the `log` facade, tagged with a pair id
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    pub pair_id: Option<String>,
}

impl LogSink {
    pub fn for_pair(pair_id: impl Into<String>) -> Self {
        Self {
            pair_id: Some(pair_id.into()),
        }
    }
}

impl AuditSink for LogSink {
    fn record(&mut self, event: &str, severity: Severity, context: Value) {
        let pair = self.pair_id.as_deref().unwrap_or("-");
        log::log!(severity.log_level(), "[{}] {} {}", pair, event, context);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn record(&mut self, _event: &str, _severity: Severity, _context: Value) {}
}
