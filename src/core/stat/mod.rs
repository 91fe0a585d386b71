/// The `stat` mod implements statistic slots and basic data structures,
/// such as the slding window and its underlying LeapArray
mod base;
mod node_storage;
mod resource_node;
mod stat_prepare_slot;
mod stat_slot;

pub(crate) use base::*;
pub use node_storage::*;
pub(crate) use resource_node::*;
pub(crate) use stat_prepare_slot::*;
pub(crate) use stat_slot::*;
