use crate::{utils, Error, Result};
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// A node's role with respect to the cluster token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterRole {
    /// No cluster participation; every check runs the local path.
    Off,
    /// Delegates admission to a remote [`super::TokenService`].
    Client,
    /// Serves tokens to other nodes (sketch only; no transport is implemented here).
    Server,
}

const ROLE_OFF: u8 = 0;
const ROLE_CLIENT: u8 = 1;
const ROLE_SERVER: u8 = 2;

fn encode(role: ClusterRole) -> u8 {
    match role {
        ClusterRole::Off => ROLE_OFF,
        ClusterRole::Client => ROLE_CLIENT,
        ClusterRole::Server => ROLE_SERVER,
    }
}

fn decode(val: u8) -> ClusterRole {
    match val {
        ROLE_CLIENT => ClusterRole::Client,
        ROLE_SERVER => ClusterRole::Server,
        _ => ClusterRole::Off,
    }
}

/// Tracks the node's current cluster role, rejecting transitions that arrive
/// less than `MIN_INTERVAL_MS` after the previous one.
pub struct ClusterStateMachine {
    role: AtomicU8,
    last_transition_ms: AtomicU64,
}

const MIN_INTERVAL_MS: u64 = 5000;

impl ClusterStateMachine {
    pub fn new() -> Self {
        ClusterStateMachine {
            role: AtomicU8::new(ROLE_OFF),
            last_transition_ms: AtomicU64::new(0),
        }
    }

    pub fn role(&self) -> ClusterRole {
        decode(self.role.load(Ordering::Acquire))
    }

    /// Moves to `to`, failing if the previous transition happened less than
    /// five seconds ago. A no-op transition (same role) always succeeds.
    pub fn transition_to(&self, to: ClusterRole) -> Result<()> {
        let now = utils::curr_time_millis();
        if self.role() == to {
            return Ok(());
        }
        let last = self.last_transition_ms.load(Ordering::Acquire);
        if now.saturating_sub(last) < MIN_INTERVAL_MS {
            return Err(Error::msg(
                "cluster state transition debounced, retry after the minimum interval",
            ));
        }
        self.role.store(encode(to), Ordering::Release);
        self.last_transition_ms.store(now, Ordering::Release);
        Ok(())
    }
}

impl Default for ClusterStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref STATE: ClusterStateMachine = ClusterStateMachine::new();
}

pub fn current_role() -> ClusterRole {
    STATE.role()
}

pub fn transition_to(to: ClusterRole) -> Result<()> {
    STATE.transition_to(to)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_off() {
        let sm = ClusterStateMachine::new();
        assert_eq!(sm.role(), ClusterRole::Off);
    }

    #[test]
    fn first_transition_always_succeeds() {
        let sm = ClusterStateMachine::new();
        sm.transition_to(ClusterRole::Client).unwrap();
        assert_eq!(sm.role(), ClusterRole::Client);
    }

    #[test]
    fn rapid_second_transition_is_debounced() {
        let sm = ClusterStateMachine::new();
        sm.transition_to(ClusterRole::Client).unwrap();
        assert!(sm.transition_to(ClusterRole::Server).is_err());
        assert_eq!(sm.role(), ClusterRole::Client);
    }

    #[test]
    fn same_role_transition_is_always_a_no_op_success() {
        let sm = ClusterStateMachine::new();
        sm.transition_to(ClusterRole::Client).unwrap();
        sm.transition_to(ClusterRole::Client).unwrap();
        assert_eq!(sm.role(), ClusterRole::Client);
    }
}
