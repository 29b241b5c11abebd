//! Explicit provider registry
//!
//! Built once at startup and handed to whatever needs provider lookup; there
//! is no process-wide registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::provider::{ChatProvider, LlmError};

/// Split a `provider/model` target into its parts
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('/') {
        Some((provider, model)) if !model.is_empty() => (provider, Some(model)),
        Some((provider, _)) => (provider, None),
        None => (target, None),
    }
}

/// Named collection of provider capabilities
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous entry
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::debug!(provider = %name, "Replaced registered provider");
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Look up a provider by `provider` or `provider/model`
    pub fn get(&self, target: &str) -> Result<Arc<dyn ChatProvider>, LlmError> {
        let (name, _) = split_target(target);
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| LlmError::UnknownProvider(target.to_string()))
    }

    /// Resolve a target to a provider and model.
    ///
    /// A bare provider name uses the first model the provider lists.
    pub async fn resolve(&self, target: &str) -> Result<(Arc<dyn ChatProvider>, String), LlmError> {
        let provider = self.get(target)?;
        let model = match split_target(target).1 {
            Some(model) => model.to_string(),
            None => provider
                .list_models()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::NoModel(provider.name().to_string()))?,
        };
        Ok((provider, model))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(split_target(name).0)
    }

    /// All providers, ordered by name
    pub fn providers(&self) -> Vec<Arc<dyn ChatProvider>> {
        self.providers.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with(Arc::new(MockProvider::named("openai")))
            .with(Arc::new(MockProvider::named("google").with_models(vec!["gemini-2.5-flash"])))
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("openai/gpt-4o-mini"), ("openai", Some("gpt-4o-mini")));
        assert_eq!(split_target("openai"), ("openai", None));
        assert_eq!(split_target("openai/"), ("openai", None));
    }

    #[test]
    fn test_get_accepts_model_suffix() {
        let reg = registry();
        assert_eq!(reg.get("openai/gpt-4o").unwrap().name(), "openai");
        assert_eq!(reg.get("google").unwrap().name(), "google");
    }

    #[test]
    fn test_unknown_provider() {
        let err = registry().get("cohere/command").unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(ref t) if t == "cohere/command"));
    }

    #[tokio::test]
    async fn test_resolve_defaults_to_first_model() {
        let reg = registry();
        let (provider, model) = reg.resolve("google").await.unwrap();
        assert_eq!(provider.name(), "google");
        assert_eq!(model, "gemini-2.5-flash");

        let (_, model) = reg.resolve("google/gemini-pro").await.unwrap();
        assert_eq!(model, "gemini-pro");
    }

    #[test]
    fn test_names_sorted() {
        assert_eq!(registry().names(), vec!["google", "openai"]);
    }
}
