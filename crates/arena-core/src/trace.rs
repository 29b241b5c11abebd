//! Trace events for competition and debate lifecycles
//!
//! Events are pushed through a [`TraceSink`]. Emission is fire-and-forget:
//! sinks never return errors, and [`NoopSink`] stands in when the caller does
//! not care about traces.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle occurrence kinds. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceEventType {
    #[serde(rename = "competition.start")]
    CompetitionStart,
    #[serde(rename = "competition.end")]
    CompetitionEnd,
    #[serde(rename = "provider.invoke")]
    ProviderInvoke,
    #[serde(rename = "provider.error")]
    ProviderError,
    #[serde(rename = "judge.score")]
    JudgeScore,
    #[serde(rename = "debate.turn")]
    DebateTurn,
    #[serde(rename = "debug.info")]
    DebugInfo,
}

impl TraceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompetitionStart => "competition.start",
            Self::CompetitionEnd => "competition.end",
            Self::ProviderInvoke => "provider.invoke",
            Self::ProviderError => "provider.error",
            Self::JudgeScore => "judge.score",
            Self::DebateTurn => "debate.turn",
            Self::DebugInfo => "debug.info",
        }
    }
}

impl fmt::Display for TraceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
}

impl std::str::FromStr for TraceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown trace level: {}", other)),
        }
    }
}

/// A single append-only trace record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub event_type: TraceEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<TraceLevel>,
    pub data: serde_json::Value,
}

impl TraceEvent {
    /// Create an event stamped with the current time
    pub fn new(session_id: &str, event_type: TraceEventType, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            event_type,
            level: None,
            data,
        }
    }

    pub fn with_level(mut self, level: TraceLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Level used for filtering; unlevelled events count as `info`
    pub fn effective_level(&self) -> TraceLevel {
        self.level.unwrap_or(TraceLevel::Info)
    }
}

/// Destination for trace events. Must never fail or panic on emit.
pub trait TraceSink: Send + Sync {
    fn emit(&self, event: TraceEvent);
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn TraceSink>;

/// Inert sink used when no tracing is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn emit(&self, _event: TraceEvent) {}
}

/// Shared inert sink
pub fn noop_sink() -> SharedSink {
    Arc::new(NoopSink)
}

/// Output format for [`TraceEmitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    #[default]
    Json,
    Pretty,
}

/// Emitter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceEmitterConfig {
    /// Events below this level are dropped
    pub min_level: TraceLevel,
    pub format: TraceFormat,
}

/// Line-oriented emitter with severity filtering
pub struct TraceEmitter {
    config: TraceEmitterConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for TraceEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceEmitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TraceEmitter {
    /// Emitter writing to stdout
    pub fn new(config: TraceEmitterConfig) -> Self {
        Self::with_writer(config, Box::new(std::io::stdout()))
    }

    /// Emitter writing to an arbitrary writer
    pub fn with_writer(config: TraceEmitterConfig, writer: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            writer: Mutex::new(writer),
        }
    }

    pub fn config(&self) -> &TraceEmitterConfig {
        &self.config
    }

    fn render(&self, event: &TraceEvent) -> Option<String> {
        match self.config.format {
            TraceFormat::Json => serde_json::to_string(event).ok(),
            TraceFormat::Pretty => Some(format!(
                "[{}] {:<7} {} session={} {}",
                event.timestamp.to_rfc3339(),
                format!("{:?}", event.effective_level()).to_uppercase(),
                event.event_type,
                event.session_id,
                event.data
            )),
        }
    }
}

impl TraceSink for TraceEmitter {
    fn emit(&self, event: TraceEvent) {
        if event.effective_level() < self.config.min_level {
            return;
        }
        let Some(line) = self.render(&event) else {
            tracing::warn!(event_type = %event.event_type, "Failed to render trace event");
            return;
        };
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::warn!(error = %e, "Failed to write trace event");
        }
    }
}

/// In-memory sink that keeps every event it receives
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in emission order
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded events of one type
    pub fn of_type(&self, event_type: TraceEventType) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
