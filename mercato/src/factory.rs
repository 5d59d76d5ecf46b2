//! Name-keyed provider constructors used by config-driven startup.

use std::collections::HashMap;
use std::sync::Arc;

use mercato_core::{MercatoError, ProviderAdapter, ProviderConfig, ResolvedCredentials};

type Ctor = Arc<
    dyn Fn(&ProviderConfig, Option<&ResolvedCredentials>) -> Result<Arc<dyn ProviderAdapter>, MercatoError>
        + Send
        + Sync,
>;

/// Maps provider names to adapter constructors.
///
/// Constructors receive the provider's configuration and its resolved
/// credentials (`None` when the config has no credentials block).
#[derive(Clone, Default)]
pub struct ProviderFactory {
    ctors: HashMap<String, Ctor>,
}

impl ProviderFactory {
    /// Empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor used for providers named `name`.
    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&ProviderConfig, Option<&ResolvedCredentials>) -> Result<Arc<dyn ProviderAdapter>, MercatoError>
            + Send
            + Sync
            + 'static,
    {
        self.ctors.insert(name.into(), Arc::new(ctor));
        self
    }

    /// Whether a constructor is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Instantiate the adapter for `config`.
    ///
    /// # Errors
    /// Returns `Config` when no constructor is registered for the provider's
    /// name, otherwise whatever the constructor returns.
    pub fn build(
        &self,
        config: &ProviderConfig,
        credentials: Option<&ResolvedCredentials>,
    ) -> Result<Arc<dyn ProviderAdapter>, MercatoError> {
        let ctor = self.ctors.get(&config.name).ok_or_else(|| {
            MercatoError::Config(format!("no constructor registered for provider {}", config.name))
        })?;
        ctor(config, credentials)
    }
}

impl core::fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderFactory").field("providers", &names).finish()
    }
}
