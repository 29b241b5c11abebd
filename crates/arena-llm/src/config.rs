//! Configuration management for Arena
//!
//! Loads provider credentials and model lists from a JSON file (with `${VAR}`
//! environment substitution) or straight from the environment, and turns
//! them into an explicit [`ProviderRegistry`].

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use arena_core::TraceEmitterConfig;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::anthropic::AnthropicProvider;
use crate::google::GoogleProvider;
use crate::mock::MockProvider;
use crate::openai::OpenAICompatibleProvider;
use crate::provider::ModelLimits;
use crate::registry::ProviderRegistry;

/// Default config file name
pub const DEFAULT_CONFIG_PATH: &str = "arena.config.json";

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A model served by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Settings for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl ProviderConfig {
    fn with_key(api_key: String) -> Self {
        Self {
            api_key: Some(api_key),
            ..Self::default()
        }
    }

    fn model_ids(&self) -> Vec<String> {
        self.models.iter().map(|m| m.id.clone()).collect()
    }

    /// `maxTokens` of every model that sets one
    pub fn model_limits(&self) -> ModelLimits {
        self.models
            .iter()
            .filter_map(|m| m.max_tokens.map(|cap| (m.id.clone(), cap)))
            .collect()
    }
}

/// Full Arena configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaConfig {
    /// Provider name -> settings
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    /// Trace emitter settings
    #[serde(default)]
    pub trace: TraceEmitterConfig,
}

impl ArenaConfig {
    /// Load a JSON config file, substituting `${VAR}` from the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, |name| env::var(name).ok())
    }

    /// Parse config text, resolving `${VAR}` placeholders through `lookup`
    pub fn parse(text: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let substituted = substitute_vars(text, lookup)?;
        Ok(serde_json::from_str(&substituted)?)
    }

    /// Build configuration from well-known environment variables
    pub fn from_env() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert("mock".to_string(), ProviderConfig::default());

        for (name, var) in [
            ("openai", "OPENAI_API_KEY"),
            ("anthropic", "ANTHROPIC_API_KEY"),
            ("google", "GOOGLE_API_KEY"),
            ("xai", "XAI_API_KEY"),
            ("deepseek", "DEEPSEEK_API_KEY"),
        ] {
            if let Ok(key) = env::var(var) {
                providers.insert(name.to_string(), ProviderConfig::with_key(key));
            }
        }

        if let Ok(url) = env::var("ARENA_LOCAL_URL") {
            providers.insert(
                "local".to_string(),
                ProviderConfig {
                    endpoint: Some(url),
                    ..ProviderConfig::default()
                },
            );
        }

        Self {
            providers,
            trace: TraceEmitterConfig::default(),
        }
    }

    /// Check if a provider is configured
    pub fn is_configured(&self, provider: &str) -> bool {
        self.providers.contains_key(&provider.to_lowercase())
    }

    /// Build the provider registry.
    ///
    /// Providers that cannot be constructed are logged and skipped.
    pub fn build_registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (name, cfg) in &self.providers {
            match build_provider(name, cfg) {
                Ok(provider) => registry.register(provider),
                Err(e) => tracing::warn!(provider = %name, error = %e, "Skipping provider"),
            }
        }
        registry
    }
}

fn build_provider(
    name: &str,
    cfg: &ProviderConfig,
) -> Result<Arc<dyn crate::ChatProvider>, ConfigError> {
    let require_key = || {
        cfg.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Invalid(format!("{} requires apiKey", name)))
    };

    let with_endpoint = |p: OpenAICompatibleProvider| {
        let p = p.with_models(cfg.model_ids()).with_model_limits(cfg.model_limits());
        match cfg.endpoint.as_deref() {
            Some(url) => p.with_base_url(url),
            None => p,
        }
    };

    let provider: Arc<dyn crate::ChatProvider> = match name {
        "openai" => Arc::new(with_endpoint(OpenAICompatibleProvider::openai(require_key()?))),
        "xai" => Arc::new(with_endpoint(OpenAICompatibleProvider::xai(require_key()?))),
        "deepseek" => Arc::new(with_endpoint(OpenAICompatibleProvider::deepseek(require_key()?))),
        "local" => Arc::new(with_endpoint(OpenAICompatibleProvider::local(None))),
        "anthropic" => {
            let provider = AnthropicProvider::new(require_key()?)
                .with_models(cfg.model_ids())
                .with_model_limits(cfg.model_limits());
            Arc::new(match cfg.endpoint.as_deref() {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        "google" => {
            let provider = GoogleProvider::new(require_key()?)
                .with_models(cfg.model_ids())
                .with_model_limits(cfg.model_limits());
            Arc::new(match cfg.endpoint.as_deref() {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        "mock" => {
            let mock = MockProvider::named("mock");
            let ids = cfg.model_ids();
            Arc::new(if ids.is_empty() {
                mock
            } else {
                mock.with_models(ids.iter().map(String::as_str).collect())
            })
        }
        other => return Err(ConfigError::Invalid(format!("unknown provider kind: {}", other))),
    };
    Ok(provider)
}

/// Replace every `${VAR}` in `text`; a missing variable is an error naming it
pub fn substitute_vars(
    text: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is a valid regex");

    if let Some(missing) = re
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|name| lookup(name).is_none())
    {
        return Err(ConfigError::MissingEnvVar(missing));
    }

    Ok(re
        .replace_all(text, |caps: &Captures| lookup(&caps[1]).unwrap_or_default())
        .into_owned())
}
