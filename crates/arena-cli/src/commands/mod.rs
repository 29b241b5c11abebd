//! Subcommands and the settings they share

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arena_core::{noop_sink, SharedSink, TraceEmitter, TraceEmitterConfig, TraceFormat, TraceLevel};
use arena_llm::{ArenaConfig, DEFAULT_CONFIG_PATH};
use clap::{Args, ValueEnum};

pub mod compete;
pub mod debate;
pub mod info;
pub mod models;
pub mod validate;

/// Trace output on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceMode {
    Off,
    Json,
    Pretty,
}

/// Flags accepted by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file (defaults to ./arena.config.json, then environment variables)
    #[arg(long, global = true, env = "ARENA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit trace events
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub trace: TraceMode,

    /// Minimum trace level (debug, info, warning, error); overrides the config file
    #[arg(long, global = true)]
    pub trace_level: Option<TraceLevel>,
}

/// Where the active configuration came from
pub enum ConfigSource {
    File(PathBuf),
    Environment,
}

impl GlobalArgs {
    /// Load configuration: explicit path, then the default file, then the environment
    pub fn load_config(&self) -> Result<(ArenaConfig, ConfigSource)> {
        if let Some(path) = &self.config {
            let config = ArenaConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            return Ok((config, ConfigSource::File(path.clone())));
        }

        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.exists() {
            let config = ArenaConfig::load(default)
                .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_PATH))?;
            return Ok((config, ConfigSource::File(default.to_path_buf())));
        }

        tracing::debug!("No config file found, using environment");
        Ok((ArenaConfig::from_env(), ConfigSource::Environment))
    }

    /// Trace sink for this run; `--trace off` gives the inert sink
    pub fn trace_sink(&self, config: &ArenaConfig) -> SharedSink {
        let format = match self.trace {
            TraceMode::Off => return noop_sink(),
            TraceMode::Json => TraceFormat::Json,
            TraceMode::Pretty => TraceFormat::Pretty,
        };
        Arc::new(TraceEmitter::new(TraceEmitterConfig {
            min_level: self.trace_level.unwrap_or(config.trace.min_level),
            format,
        }))
    }
}

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}
