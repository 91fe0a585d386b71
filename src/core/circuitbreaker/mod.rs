//! Implements the circuit breaker pattern, which provides stability and prevents cascading
//! failures in distributed systems.
//!
//! Four strategies are supported:
//!
//!  1. `SlowRequestRatio`: the ratio of slow entries (response time above the configured max)
//!     exceeds the threshold. A max response time must be set.
//!
//!  2. `ErrorRatio`: the ratio of error entries exceeds the threshold.
//!
//!  3. `ErrorCount`: the number of error entries exceeds the threshold.
//!
//!  4. `AvgRt`: the average response time exceeds the threshold. Observations above the
//!     threshold are admitted for a five-call probation window before the breaker trips.
//!
//! Each circuit breaking rule is converted into a `CircuitBreaker` with its own statistical
//! structure, implemented as a state machine with three states:
//!
//!  1. Closed: all entries pass the check.
//!
//!  2. Open: the breaker has tripped, all entries are blocked. After the retry timeout elapses
//!     the breaker moves to Half-Open and allows one entry through to probe recovery.
//!
//!  3. Half-Open: only one entry is allowed to probe the resource; others are blocked.
//!
//! `StateChangeListener` lets callers observe state transitions.

pub mod breaker;
pub mod rule;
pub mod rule_manager;
pub mod slot;
pub mod stat_slot;

pub use breaker::*;
pub use rule::*;
pub use rule_manager::*;
pub use slot::*;
pub use stat_slot::*;
