//! DST - Deterministic Simulation Testing
//!
//! Seeded randomness and fault injection for the simulation backend.
//!
//! # Usage
//!
//! ```rust
//! use vault_core::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};
//!
//! let mut injector = FaultInjector::new(DeterministicRng::new(42))
//!     .with_fault(FaultConfig::always(FaultType::InitFail));
//!
//! assert!(injector.should_inject(FaultType::InitFail));
//! assert!(!injector.should_inject(FaultType::WriteFail));
//! ```
//!
//! Run with explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

mod fault;
mod rng;

pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use rng::DeterministicRng;
