//! SimStorageBackend - In-Memory Storage for Simulation
//!
//! TigerStyle: Same contract as the SQL backends, deterministic faults, and a
//! probe that keeps counting lifecycle calls after the backend has been moved
//! into a registry.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::backend::{assert_query_limit, KillStore, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::kill::{DateHolder, PlayerKill};
use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};

// =============================================================================
// SimProbe
// =============================================================================

#[derive(Debug, Default)]
struct ProbeCounters {
    init_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

/// Observes lifecycle calls made on a [`SimStorageBackend`].
#[derive(Debug, Clone, Default)]
pub struct SimProbe {
    counters: Arc<ProbeCounters>,
}

impl SimProbe {
    /// Number of times `init` was called.
    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.counters.init_calls.load(Ordering::SeqCst)
    }

    /// Number of times `shutdown` was called.
    #[must_use]
    pub fn shutdown_calls(&self) -> usize {
        self.counters.shutdown_calls.load(Ordering::SeqCst)
    }
}

// =============================================================================
// SimStorageBackend
// =============================================================================

#[derive(Debug)]
struct StoredKill {
    killer: Uuid,
    kill: PlayerKill,
}

#[derive(Debug)]
struct SimState {
    init_attempted: bool,
    ready: bool,
    rows: Vec<StoredKill>,
    faults: FaultInjector,
}

/// In-memory backend with fault injection.
///
/// All access goes through one async mutex, so concurrent callers are
/// serialized.
#[derive(Debug)]
pub struct SimStorageBackend {
    name: &'static str,
    state: Mutex<SimState>,
    probe: SimProbe,
}

impl SimStorageBackend {
    /// Create a backend with seed 0 and no faults.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_rng(name, DeterministicRng::new(0))
    }

    /// Create a backend whose faults are drawn from `rng`.
    #[must_use]
    pub fn with_rng(name: &'static str, rng: DeterministicRng) -> Self {
        Self {
            name,
            state: Mutex::new(SimState {
                init_attempted: false,
                ready: false,
                rows: Vec::new(),
                faults: FaultInjector::new(rng),
            }),
            probe: SimProbe::default(),
        }
    }

    /// Declare a fault.
    #[must_use]
    pub fn with_fault(mut self, fault: FaultConfig) -> Self {
        let state = self.state.get_mut();
        state.faults = state.faults.clone().with_fault(fault);
        self
    }

    /// Backend whose `init` always fails.
    #[must_use]
    pub fn failing(name: &'static str) -> Self {
        Self::new(name).with_fault(FaultConfig::always(FaultType::InitFail))
    }

    /// Handle for observing lifecycle calls.
    #[must_use]
    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }
}

fn ready_state<'a>(
    name: &'static str,
    state: &'a mut SimState,
    fault: FaultType,
) -> StorageResult<&'a mut SimState> {
    if !state.ready {
        return Err(StorageError::not_initialized(name));
    }
    if state.faults.should_inject(fault) {
        return Err(StorageError::FaultInjected(format!("{fault:?} on {name}")));
    }
    Ok(state)
}

fn newest_first(mut kills: Vec<PlayerKill>, limit: usize) -> Vec<PlayerKill> {
    kills.sort_by_key(|kill| Reverse(kill.date()));
    kills.truncate(limit);
    kills
}

#[async_trait]
impl KillStore for SimStorageBackend {
    async fn store_kill(&self, killer: Uuid, kill: &PlayerKill) -> StorageResult<()> {
        let mut guard = self.state.lock().await;
        let state = ready_state(self.name, &mut guard, FaultType::WriteFail)?;

        match state
            .rows
            .iter_mut()
            .find(|row| row.killer == killer && row.kill == *kill)
        {
            Some(row) => row.kill = kill.clone(),
            None => state.rows.push(StoredKill {
                killer,
                kill: kill.clone(),
            }),
        }
        Ok(())
    }

    async fn player_kills(&self, killer: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        assert_query_limit(limit);

        let mut guard = self.state.lock().await;
        let state = ready_state(self.name, &mut guard, FaultType::ReadFail)?;

        let kills = state
            .rows
            .iter()
            .filter(|row| row.killer == killer)
            .map(|row| row.kill.clone())
            .collect();
        Ok(newest_first(kills, limit))
    }

    async fn player_deaths(&self, victim: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        assert_query_limit(limit);

        let mut guard = self.state.lock().await;
        let state = ready_state(self.name, &mut guard, FaultType::ReadFail)?;

        let kills = state
            .rows
            .iter()
            .filter(|row| row.kill.victim() == victim)
            .map(|row| row.kill.clone())
            .collect();
        Ok(newest_first(kills, limit))
    }

    async fn kill_count(&self, killer: Option<Uuid>) -> StorageResult<usize> {
        let mut guard = self.state.lock().await;
        let state = ready_state(self.name, &mut guard, FaultType::ReadFail)?;

        Ok(match killer {
            Some(killer) => state.rows.iter().filter(|row| row.killer == killer).count(),
            None => state.rows.len(),
        })
    }
}

#[async_trait]
impl StorageBackend for SimStorageBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn init(&mut self) -> StorageResult<()> {
        self.probe.counters.init_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.get_mut();

        // Precondition
        assert!(!state.init_attempted, "init called twice on {}", self.name);
        state.init_attempted = true;

        if state.faults.should_inject(FaultType::InitFail) {
            return Err(StorageError::FaultInjected(format!(
                "init of {} failed",
                self.name
            )));
        }

        state.ready = true;
        Ok(())
    }

    async fn shutdown(&self) {
        self.probe
            .counters
            .shutdown_calls
            .fetch_add(1, Ordering::SeqCst);
        self.state.lock().await.ready = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
