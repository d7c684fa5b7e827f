//! Storage Bootstrap
//!
//! TigerStyle: One place where the host wires configuration to storage.
//!
//! Builds the platform's candidate list, resolves the configured key, and
//! hands back the active store. On failure it logs what was known and the
//! caller aborts startup. Teardown shuts the store down once.

use vault_core::{
    ActiveStore, BackendDescriptor, BackendRegistry, BackendResolver, Platform, ResolveError,
    ResolverState, StorageConfig,
};

/// Owns the resolver for the lifetime of the process.
#[derive(Debug)]
pub struct StorageBootstrap {
    platform: Platform,
    resolver: BackendResolver,
}

impl StorageBootstrap {
    /// Build the candidate list for `platform` from `config`.
    ///
    /// # Errors
    /// Returns an error if the candidate list cannot be registered.
    pub fn new(platform: Platform, config: &StorageConfig) -> Result<Self, ResolveError> {
        let registry = platform.candidates(config)?;
        Ok(Self::from_registry(platform, registry))
    }

    /// Use a prepared candidate list.
    #[must_use]
    pub fn from_registry(platform: Platform, registry: BackendRegistry) -> Self {
        tracing::debug!(
            %platform,
            candidates = ?registry.keys().collect::<Vec<_>>(),
            "storage candidates registered"
        );
        Self {
            platform,
            resolver: BackendResolver::new(registry),
        }
    }

    /// Resolve `db_type` and initialize that backend.
    ///
    /// # Errors
    /// Returns the resolver's error. Storage is then unavailable for the
    /// rest of the process; nothing else is tried.
    pub async fn start(&mut self, db_type: &str) -> Result<ActiveStore, ResolveError> {
        match self.resolver.resolve(db_type).await {
            Ok(store) => {
                tracing::info!(
                    platform = %self.platform,
                    key = store.key(),
                    backend = store.backend_name(),
                    "storage ready"
                );
                Ok(store)
            }
            Err(err) => {
                if let Some(known) = err.known_keys() {
                    tracing::error!(
                        platform = %self.platform,
                        configured = db_type.trim(),
                        known = %known.join(", "),
                        "configured database type is not available on this platform"
                    );
                } else {
                    tracing::error!(platform = %self.platform, "storage unavailable: {err}");
                }
                Err(err)
            }
        }
    }

    /// Resolver state.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.resolver.state()
    }

    /// Platform the candidates were built for.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Per-candidate lifecycle snapshot.
    #[must_use]
    pub fn descriptors(&self) -> &[BackendDescriptor] {
        self.resolver.descriptors()
    }

    /// Shut down the active store, if any. Safe to call more than once.
    pub async fn teardown(&self) {
        if let Some(store) = self.resolver.active() {
            store.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::{BackendState, SimStorageBackend};

    #[tokio::test]
    async fn test_start_and_teardown() {
        let sim = SimStorageBackend::new("memory");
        let probe = sim.probe();
        let registry = BackendRegistry::new().with("memory", sim).unwrap();
        let mut bootstrap = StorageBootstrap::from_registry(Platform::GameServer, registry);

        let store = bootstrap.start("MEMORY").await.unwrap();
        assert_eq!(bootstrap.state(), ResolverState::Active);
        assert_eq!(bootstrap.descriptors()[0].state, BackendState::Ready);

        bootstrap.teardown().await;
        bootstrap.teardown().await;

        assert!(store.is_shut_down());
        assert_eq!(probe.shutdown_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_key_aborts() {
        let registry = BackendRegistry::new()
            .with("mysql", SimStorageBackend::new("mysql"))
            .unwrap();
        let mut bootstrap = StorageBootstrap::from_registry(Platform::Proxy, registry);

        let err = bootstrap.start("sqlite").await.unwrap_err();

        assert!(matches!(err, ResolveError::UnknownBackendKey { .. }));
        assert_eq!(bootstrap.state(), ResolverState::Unavailable);

        // Nothing to release
        bootstrap.teardown().await;
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_game_server_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        config.sqlite.resolve_against(dir.path());

        let mut bootstrap = StorageBootstrap::new(Platform::GameServer, &config).unwrap();
        let store = bootstrap.start(&config.db_type).await.unwrap();

        assert_eq!(store.backend_name(), "SQLite");
        assert!(config.sqlite.file.exists());
        bootstrap.teardown().await;
    }

    #[cfg(feature = "mysql")]
    #[tokio::test]
    async fn test_proxy_rejects_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        config.sqlite.resolve_against(dir.path());

        let mut bootstrap = StorageBootstrap::new(Platform::Proxy, &config).unwrap();
        let err = bootstrap.start("sqlite").await.unwrap_err();

        assert_eq!(err.known_keys(), Some(&["mysql".to_string()][..]));
        assert!(!config.sqlite.file.exists());
    }
}
