//! Backend Registry
//!
//! TigerStyle: Append-only, ordered, keys normalized once at the door.
//!
//! Registration order is kept so diagnostics always list candidates the same
//! way ("known: mysql, sqlite").

use std::fmt;

use crate::constants::SELECTOR_KEY_BYTES_MAX;
use crate::error::ResolveError;
use crate::storage::StorageBackend;

// =============================================================================
// SelectorKey
// =============================================================================

/// A normalized (trimmed, lowercase) backend selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorKey(String);

impl SelectorKey {
    /// Normalize `raw`. Returns None for blank or oversized keys.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() || normalized.len() > SELECTOR_KEY_BYTES_MAX {
            return None;
        }
        Some(Self(normalized))
    }

    /// Normalized key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// =============================================================================
// Backend Descriptor
// =============================================================================

/// Lifecycle of one registered candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendState {
    /// Registered, never touched
    Uninitialized,
    /// `init` in progress
    Initializing,
    /// `init` succeeded; this is the active backend
    Ready,
    /// `init` failed
    Failed,
}

impl BackendState {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Diagnostic snapshot of a registered candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Selector key
    pub key: SelectorKey,
    /// Backend name (e.g. "SQLite")
    pub name: &'static str,
    /// Registration order, starting at 0
    pub ordinal: usize,
    /// Lifecycle state
    pub state: BackendState,
}

// =============================================================================
// BackendRegistry
// =============================================================================

pub(crate) struct Candidate {
    pub(crate) key: SelectorKey,
    pub(crate) backend: Box<dyn StorageBackend>,
}

/// Ordered set of candidate backends, keyed by selector.
#[derive(Default)]
pub struct BackendRegistry {
    candidates: Vec<Candidate>,
}

impl BackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate under `key`.
    ///
    /// # Errors
    /// `InvalidSelector` for a blank or oversized key, `DuplicateRegistration`
    /// if the normalized key is already taken.
    pub fn register<B>(&mut self, key: &str, backend: B) -> Result<(), ResolveError>
    where
        B: StorageBackend + 'static,
    {
        let key = SelectorKey::parse(key).ok_or_else(|| ResolveError::InvalidSelector {
            raw: key.to_string(),
        })?;

        if self.candidates.iter().any(|c| c.key == key) {
            return Err(ResolveError::DuplicateRegistration {
                key: key.as_str().to_string(),
            });
        }

        tracing::debug!(
            key = %key,
            backend = backend.name(),
            ordinal = self.candidates.len(),
            "registered storage backend"
        );
        self.candidates.push(Candidate {
            key,
            backend: Box::new(backend),
        });
        Ok(())
    }

    /// Builder form of [`BackendRegistry::register`].
    ///
    /// # Errors
    /// Same as [`BackendRegistry::register`].
    pub fn with<B>(mut self, key: &str, backend: B) -> Result<Self, ResolveError>
    where
        B: StorageBackend + 'static,
    {
        self.register(key, backend)?;
        Ok(self)
    }

    /// Find the ordinal of the candidate matching `key` (normalized).
    ///
    /// # Errors
    /// `UnknownBackendKey`, carrying every known key in registration order.
    pub fn lookup(&self, key: &str) -> Result<usize, ResolveError> {
        SelectorKey::parse(key)
            .and_then(|key| self.candidates.iter().position(|c| c.key == key))
            .ok_or_else(|| ResolveError::UnknownBackendKey {
                key: key.trim().to_string(),
                known: self.keys().map(str::to_string).collect(),
            })
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.key.as_str())
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Snapshot of every candidate. All are `Uninitialized` here; only the
    /// resolver moves them forward.
    #[must_use]
    pub fn descriptors(&self) -> Vec<BackendDescriptor> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(ordinal, c)| BackendDescriptor {
                key: c.key.clone(),
                name: c.backend.name(),
                ordinal,
                state: BackendState::Uninitialized,
            })
            .collect()
    }

    /// Hand every candidate over, leaving the registry empty.
    pub(crate) fn take_candidates(&mut self) -> Vec<Candidate> {
        std::mem::take(&mut self.candidates)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
