//! ResolveError - Backend Selection Failures
//!
//! All of these are fatal to startup. Nothing here is retried.

use crate::resolver::ResolverState;
use crate::storage::StorageError;

/// Why no active backend could be produced.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The configured selector matches no registered backend.
    #[error("unknown database type '{key}' (known: {})", .known.join(", "))]
    UnknownBackendKey {
        /// Configured key, trimmed
        key: String,
        /// Registered keys in registration order
        known: Vec<String>,
    },

    /// The selected backend failed to initialize.
    #[error("failed to initialize {backend} backend '{key}': {source}")]
    BackendInit {
        /// Selector key
        key: String,
        /// Backend name
        backend: &'static str,
        /// Underlying cause
        #[source]
        source: StorageError,
    },

    /// Two candidates share a normalized key.
    #[error("database type '{key}' registered twice")]
    DuplicateRegistration {
        /// Normalized key
        key: String,
    },

    /// A blank or oversized key was registered.
    #[error("invalid database type key {raw:?}")]
    InvalidSelector {
        /// Key as given
        raw: String,
    },

    /// `resolve` was called on a resolver that already finished.
    #[error("storage backend already resolved (state: {state})")]
    AlreadyResolved {
        /// State the resolver is in
        state: ResolverState,
    },
}

impl ResolveError {
    /// Registered keys when the error is `UnknownBackendKey`.
    #[must_use]
    pub fn known_keys(&self) -> Option<&[String]> {
        match self {
            Self::UnknownBackendKey { known, .. } => Some(known),
            _ => None,
        }
    }
}
