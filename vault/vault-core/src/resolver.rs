//! Backend Resolver
//!
//! TigerStyle: A single-shot state machine. One configured key, one `init`,
//! no fallback.
//!
//! ```text
//! Unresolved ──resolve()──► Resolving ──lookup──► init() ──ok──► Active
//!                                 │                  │
//!                                 └─unknown key──────┴─error──► Unavailable
//! ```
//!
//! Only the backend named by configuration is ever initialized. If it fails,
//! the other candidates stay untouched and the error goes back to the caller.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ResolveError;
use crate::registry::{BackendDescriptor, BackendRegistry, BackendState, SelectorKey};
use crate::storage::{KillStore, PlayerKill, StorageBackend, StorageError, StorageResult};

// =============================================================================
// Resolver State
// =============================================================================

/// Where the resolver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverState {
    /// No configuration read yet
    Unresolved,
    /// Selector read, lookup and init in progress
    Resolving,
    /// A backend is ready (terminal)
    Active,
    /// Unknown key or init failure (terminal)
    Unavailable,
}

impl ResolverState {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolving => "resolving",
            Self::Active => "active",
            Self::Unavailable => "unavailable",
        }
    }

    /// True for `Active` and `Unavailable`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Active | Self::Unavailable)
    }
}

impl fmt::Display for ResolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ActiveStore
// =============================================================================

struct ActiveInner {
    key: SelectorKey,
    backend: Box<dyn StorageBackend>,
    shut_down: AtomicBool,
}

/// Shared handle to the one initialized backend.
///
/// Cloning is cheap. Only the [`KillStore`] operations are reachable through
/// it, plus a [`shutdown`](ActiveStore::shutdown) that releases the backend
/// exactly once however many clones call it.
#[derive(Clone)]
pub struct ActiveStore {
    inner: Arc<ActiveInner>,
}

impl ActiveStore {
    fn new(key: SelectorKey, backend: Box<dyn StorageBackend>) -> Self {
        Self {
            inner: Arc::new(ActiveInner {
                key,
                backend,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Selector key the store was resolved from.
    #[must_use]
    pub fn key(&self) -> &str {
        self.inner.key.as_str()
    }

    /// Backend name (e.g. "SQLite").
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    /// True once [`ActiveStore::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Release the backend. Later calls, from any clone, do nothing.
    pub async fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!(key = %self.inner.key, "storage already shut down");
            return;
        }

        tracing::info!(
            key = %self.inner.key,
            backend = self.backend_name(),
            "shutting down storage backend"
        );
        self.inner.backend.shutdown().await;
    }

    fn open(&self) -> StorageResult<&dyn StorageBackend> {
        if self.is_shut_down() {
            return Err(StorageError::closed(self.backend_name()));
        }
        Ok(self.inner.backend.as_ref())
    }
}

impl fmt::Debug for ActiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveStore")
            .field("key", &self.inner.key)
            .field("backend", &self.backend_name())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[async_trait]
impl KillStore for ActiveStore {
    async fn store_kill(&self, killer: Uuid, kill: &PlayerKill) -> StorageResult<()> {
        self.open()?.store_kill(killer, kill).await
    }

    async fn player_kills(&self, killer: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        self.open()?.player_kills(killer, limit).await
    }

    async fn player_deaths(&self, victim: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        self.open()?.player_deaths(victim, limit).await
    }

    async fn kill_count(&self, killer: Option<Uuid>) -> StorageResult<usize> {
        self.open()?.kill_count(killer).await
    }
}

// =============================================================================
// BackendResolver
// =============================================================================

/// Selects and initializes exactly one backend from a registry.
pub struct BackendResolver {
    registry: BackendRegistry,
    descriptors: Vec<BackendDescriptor>,
    state: ResolverState,
    active: Option<ActiveStore>,
}

impl BackendResolver {
    /// Take ownership of the candidate list.
    #[must_use]
    pub fn new(registry: BackendRegistry) -> Self {
        let descriptors = registry.descriptors();
        Self {
            registry,
            descriptors,
            state: ResolverState::Unresolved,
            active: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// The active store, once resolution succeeded.
    #[must_use]
    pub fn active(&self) -> Option<ActiveStore> {
        self.active.clone()
    }

    /// Per-candidate lifecycle snapshot, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[BackendDescriptor] {
        &self.descriptors
    }

    /// Resolve `selector` to a backend and initialize it.
    ///
    /// If the returned future is dropped before it completes, the resolver
    /// ends up `Unavailable` and the selected candidate `Failed`.
    ///
    /// # Errors
    /// - `AlreadyResolved` if called again; the state does not change.
    /// - `UnknownBackendKey` if no candidate matches; state becomes `Unavailable`.
    /// - `BackendInit` if the match fails to initialize; state becomes
    ///   `Unavailable`. No other candidate is tried.
    pub async fn resolve(&mut self, selector: &str) -> Result<ActiveStore, ResolveError> {
        if self.state != ResolverState::Unresolved {
            return Err(ResolveError::AlreadyResolved { state: self.state });
        }
        let mut flight = InFlight::start(&mut self.state, &mut self.descriptors);
        tracing::info!(
            selector = selector.trim(),
            candidates = ?self.registry.keys().collect::<Vec<_>>(),
            "resolving storage backend"
        );

        let ordinal = match self.registry.lookup(selector) {
            Ok(ordinal) => ordinal,
            Err(err) => {
                tracing::error!("{err}");
                flight.finish(ResolverState::Unavailable);
                return Err(err);
            }
        };

        // Unselected candidates were never initialized; dropping them releases nothing.
        let mut candidates = self.registry.take_candidates();
        let candidate = candidates.swap_remove(ordinal);
        drop(candidates);

        let key = candidate.key;
        let mut backend = candidate.backend;
        flight.mark(ordinal, BackendState::Initializing);

        match backend.init().await {
            Ok(()) => {
                flight.mark(ordinal, BackendState::Ready);
                // Postcondition
                assert_eq!(
                    flight.count(BackendState::Ready),
                    1,
                    "exactly one backend must be ready"
                );
                flight.finish(ResolverState::Active);
                tracing::info!(key = %key, backend = backend.name(), "storage backend active");

                let store = ActiveStore::new(key, backend);
                self.active = Some(store.clone());
                Ok(store)
            }
            Err(source) => {
                flight.mark(ordinal, BackendState::Failed);
                let err = ResolveError::BackendInit {
                    key: key.as_str().to_string(),
                    backend: backend.name(),
                    source,
                };
                tracing::error!("{err}");

                // Release anything a partial init left behind.
                backend.shutdown().await;
                flight.finish(ResolverState::Unavailable);
                Err(err)
            }
        }
    }
}

/// Holds the resolver in `Resolving` until a terminal state is recorded.
///
/// Dropped without [`InFlight::finish`] (the resolve future was cancelled),
/// it settles the resolver as `Unavailable`.
struct InFlight<'a> {
    state: &'a mut ResolverState,
    descriptors: &'a mut [BackendDescriptor],
    selected: Option<usize>,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut ResolverState, descriptors: &'a mut [BackendDescriptor]) -> Self {
        // Precondition
        assert_eq!(*state, ResolverState::Unresolved, "resolve runs once");

        *state = ResolverState::Resolving;
        Self {
            state,
            descriptors,
            selected: None,
        }
    }

    fn mark(&mut self, ordinal: usize, state: BackendState) {
        self.selected = Some(ordinal);
        self.descriptors[ordinal].state = state;
    }

    fn count(&self, state: BackendState) -> usize {
        self.descriptors.iter().filter(|d| d.state == state).count()
    }

    fn finish(mut self, state: ResolverState) {
        // Precondition
        assert!(state.is_terminal(), "resolution must end in a terminal state");

        *self.state = state;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state != ResolverState::Resolving {
            return;
        }
        if let Some(ordinal) = self.selected {
            if self.descriptors[ordinal].state == BackendState::Initializing {
                self.descriptors[ordinal].state = BackendState::Failed;
            }
        }
        *self.state = ResolverState::Unavailable;
        tracing::warn!("storage resolution cancelled before completion");
    }
}

impl fmt::Debug for BackendResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendResolver")
            .field("state", &self.state)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SimStorageBackend;
    use std::time::Duration;

    /// Backend whose `init` never completes.
    struct StalledBackend;

    #[async_trait]
    impl KillStore for StalledBackend {
        async fn store_kill(&self, _killer: Uuid, _kill: &PlayerKill) -> StorageResult<()> {
            Err(StorageError::not_initialized("stalled"))
        }

        async fn player_kills(
            &self,
            _killer: Uuid,
            _limit: usize,
        ) -> StorageResult<Vec<PlayerKill>> {
            Err(StorageError::not_initialized("stalled"))
        }

        async fn player_deaths(
            &self,
            _victim: Uuid,
            _limit: usize,
        ) -> StorageResult<Vec<PlayerKill>> {
            Err(StorageError::not_initialized("stalled"))
        }

        async fn kill_count(&self, _killer: Option<Uuid>) -> StorageResult<usize> {
            Err(StorageError::not_initialized("stalled"))
        }
    }

    #[async_trait]
    impl StorageBackend for StalledBackend {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn init(&mut self) -> StorageResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn shutdown(&self) {}
    }

    #[test]
    fn test_starts_unresolved() {
        let resolver = BackendResolver::new(BackendRegistry::new());

        assert_eq!(resolver.state(), ResolverState::Unresolved);
        assert!(resolver.active().is_none());
        assert!(!resolver.state().is_terminal());
    }

    #[tokio::test]
    async fn test_resolves_normalized_key() {
        let sqlite = SimStorageBackend::new("sqlite-sim");
        let probe = sqlite.probe();
        let registry = BackendRegistry::new().with("sqlite", sqlite).unwrap();
        let mut resolver = BackendResolver::new(registry);

        let store = resolver.resolve("  SQLite ").await.unwrap();

        assert_eq!(resolver.state(), ResolverState::Active);
        assert_eq!(store.key(), "sqlite");
        assert_eq!(store.backend_name(), "sqlite-sim");
        assert_eq!(probe.init_calls(), 1);
        assert_eq!(resolver.descriptors()[0].state, BackendState::Ready);
        assert!(resolver.active().is_some());
    }

    #[tokio::test]
    async fn test_empty_registry_is_unavailable() {
        let mut resolver = BackendResolver::new(BackendRegistry::new());

        let result = resolver.resolve("sqlite").await;

        assert!(matches!(
            result,
            Err(ResolveError::UnknownBackendKey { ref known, .. }) if known.is_empty()
        ));
        assert_eq!(resolver.state(), ResolverState::Unavailable);
    }

    #[tokio::test]
    async fn test_second_resolve_rejected() {
        let registry = BackendRegistry::new()
            .with("memory", SimStorageBackend::new("memory"))
            .unwrap();
        let mut resolver = BackendResolver::new(registry);
        resolver.resolve("memory").await.unwrap();

        let again = resolver.resolve("memory").await;

        assert!(matches!(
            again,
            Err(ResolveError::AlreadyResolved {
                state: ResolverState::Active
            })
        ));
        assert_eq!(resolver.state(), ResolverState::Active);
    }

    #[tokio::test]
    async fn test_failed_init_releases_backend() {
        let failing = SimStorageBackend::failing("sqlite");
        let probe = failing.probe();
        let registry = BackendRegistry::new().with("sqlite", failing).unwrap();
        let mut resolver = BackendResolver::new(registry);

        let result = resolver.resolve("sqlite").await;

        assert!(matches!(result, Err(ResolveError::BackendInit { .. })));
        assert_eq!(resolver.descriptors()[0].state, BackendState::Failed);
        assert_eq!(probe.shutdown_calls(), 1);
        assert!(resolver.active().is_none());
    }

    #[tokio::test]
    async fn test_store_rejects_use_after_shutdown() {
        let registry = BackendRegistry::new()
            .with("memory", SimStorageBackend::new("memory"))
            .unwrap();
        let mut resolver = BackendResolver::new(registry);
        let store = resolver.resolve("memory").await.unwrap();

        store.shutdown().await;

        assert!(store.is_shut_down());
        assert!(matches!(
            store.kill_count(None).await,
            Err(StorageError::Closed { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_resolve_is_unavailable() {
        let registry = BackendRegistry::new()
            .with("memory", SimStorageBackend::new("memory"))
            .unwrap()
            .with("stalled", StalledBackend)
            .unwrap();
        let mut resolver = BackendResolver::new(registry);

        let resolve = resolver.resolve("stalled");
        let timed_out = tokio::time::timeout(Duration::from_millis(10), resolve).await;

        assert!(timed_out.is_err());
        assert_eq!(resolver.state(), ResolverState::Unavailable);
        assert_eq!(resolver.descriptors()[0].state, BackendState::Uninitialized);
        assert_eq!(resolver.descriptors()[1].state, BackendState::Failed);
        assert!(resolver.active().is_none());
        assert!(matches!(
            resolver.resolve("memory").await,
            Err(ResolveError::AlreadyResolved {
                state: ResolverState::Unavailable
            })
        ));
    }
}
