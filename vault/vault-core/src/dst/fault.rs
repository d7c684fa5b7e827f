//! Fault Injection
//!
//! TigerStyle: Faults are declared up front with a probability and drawn
//! from the deterministic RNG, so the same seed fails the same calls.

use super::rng::DeterministicRng;

/// Kinds of fault the simulation backend can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    /// `init` fails (unreachable host, corrupt file, failed migration)
    InitFail,
    /// `store_kill` fails
    WriteFail,
    /// Any query fails
    ReadFail,
}

/// A fault and how often it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultConfig {
    /// What fails
    pub fault_type: FaultType,
    /// Probability in `0.0..=1.0`
    pub probability: f64,
}

impl FaultConfig {
    /// Declare a fault.
    ///
    /// # Panics
    /// Panics if `probability` is outside `0.0..=1.0`.
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "fault probability {} out of range",
            probability
        );
        Self {
            fault_type,
            probability,
        }
    }

    /// A fault that fires on every call.
    #[must_use]
    pub fn always(fault_type: FaultType) -> Self {
        Self::new(fault_type, 1.0)
    }
}

/// Decides, call by call, whether a declared fault fires.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    faults: Vec<FaultConfig>,
    rng: DeterministicRng,
    injected_count: u64,
}

impl FaultInjector {
    /// Injector with no faults declared.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            faults: Vec::new(),
            rng,
            injected_count: 0,
        }
    }

    /// Declare another fault.
    #[must_use]
    pub fn with_fault(mut self, fault: FaultConfig) -> Self {
        self.faults.push(fault);
        self
    }

    /// Roll for `fault_type`. Returns true if the fault fires.
    pub fn should_inject(&mut self, fault_type: FaultType) -> bool {
        let mut fired = false;
        for fault in self.faults.iter().filter(|f| f.fault_type == fault_type) {
            if self.rng.next_bool(fault.probability) {
                fired = true;
                break;
            }
        }

        if fired {
            self.injected_count += 1;
            tracing::debug!(?fault_type, seed = self.rng.seed(), "injecting fault");
        }
        fired
    }

    /// Number of faults fired so far.
    #[must_use]
    pub fn injected_count(&self) -> u64 {
        self.injected_count
    }
}
