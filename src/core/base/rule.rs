use crate::Result;
use std::fmt;

/// `SentinelRule` is implemented by every rule kind (flow, circuit breaker,
/// hotspot param flow, authority, system).
pub trait SentinelRule: fmt::Debug + Send + Sync {
    fn resource_name(&self) -> String;

    /// `is_valid` checks whether the rule is well-formed. Rule managers drop
    /// invalid rules instead of loading them.
    fn is_valid(&self) -> Result<()>;
}
