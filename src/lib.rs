#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # traffic governance for in-process resources
//!
//! This crate guards application resources (method calls, endpoints, downstream
//! dependencies) against overload. For each designated resource, every call passes
//! through an ordered pipeline of protection checks — flow control, circuit
//! breaking, parameter (hot-key) flow control, authority allow/deny, and system
//! adaptive protection; if any check fails the call is rejected with a typed block
//! signal, otherwise it proceeds and its latency/outcome feed the statistics that
//! future checks consult.
//!
//! The checks are arranged as a Chain-of-Responsibility: user-defined rules are
//! checked automatically via slots in `base::SlotChain`. Generally there are
//! several steps to using this crate:
//! 1. Initialize the runtime configuration.
//! 2. Define a resource to be protected and build an entry.
//! 3. Load the rules for each resource.
//! 4. Write the guarded code at the entry/exit points.
//!
//! ## Add Dependency
//!
//! ```toml
//! [dependencies]
//! traffic-guard = { version = "0.1.0", features = ["full"] }
//! ```
//!
//! Optional features:
//! - `async`: use `Arc`/`RwLock` contexts so entries can be shared across threads.
//! - `exporter`: export metric statistics to Prometheus.
//! - `logger_env`: use `env_logger` to initialize logging.
//! - `logger_log4rs`: use `log4rs` to initialize logging.
//! - `metric_log`: store formatted metric logs on disk per resource.
//!
//! ## General Configuration and Initialization
//!
//! The runtime must be initialized before loading rules. The `api` module provides:
//!
//! - `init_default()`: load configuration from the system environment, defaulting the rest.
//! - `init_with_config_file(config_path: &mut String)`: load configuration from a YAML file.
//! - `init_with_config(config_entity: ConfigEntity)`: initialize from a hand-crafted `ConfigEntity`.
//!
//! ```rust
//! use traffic_guard::{init_default, logging};
//! init_default().unwrap_or_else(|err| logging::error!("{:?}", err));
//! ```
//!
//! ## Resource Definition
//!
//! A snippet of code is regarded as a resource, protected by constructing an
//! `EntryBuilder` and calling `build()`; a blocked call returns an error.
//!
//! ```rust
//! use traffic_guard::base;
//! use traffic_guard::api::EntryBuilder;
//! let entry_builder = EntryBuilder::new(res_name.clone())
//!     .with_traffic_type(base::TrafficType::Inbound);
//! if let Ok(entry) = entry_builder.build() {
//!     // The request is allowed to be processed.
//!     // after finish the logic, exit the entry.
//!     entry.exit()
//! } else {
//!     // The request is blocked.
//!     // you do not need to call `exit()` on entry now.
//! }
//! ```
//!
//! ## Loading Rules
//!
//! Rules are loaded per-module. `load_rules()` overwrites all rules defined
//! before; `append_rules()` appends incrementally — currently the only way to
//! define several rules for a single resource. For example:
//!
//! ```rust
//! flow::load_rules(vec![Arc::new(flow::Rule {
//!     resource: "example".into(),
//!     threshold: 10.0,
//!     calculate_strategy: flow::CalculateStrategy::Direct,
//!     control_strategy: flow::ControlStrategy::Reject,
//!     ..Default::default()
//! })]);
//! ```

// This module is not intended to be part of the public API. In general, any
// `doc(hidden)` code is not part of the crate's public and stable API.
#[macro_use]
#[doc(hidden)]
pub mod macros;

/// Topmost fundamental APIs: initialization and resource entries.
pub mod api;
/// Core implementations: the statistic structures (sliding window and its
/// underlying leap array), the rule managers, and configuration/metric-log
/// utilities. The rule managers manage the flow controller, circuit breaker,
/// authority, and system protection rules.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
cfg_exporter! {
    /// Metric exporter implementations. Currently, only Prometheus is supported.
    pub mod exporter;
}
/// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
