//! Contract for delegating admission to a remote token server instead of deciding locally.
//!
//! This module specifies the shape a transport-specific client/server pair must honor; it
//! carries no framing, codec, or reconnection logic of its own. A caller plugs in a
//! [`TokenService`] (via [`set_token_service`]) and annotates a rule with a [`ClusterConfig`];
//! [`check`] then turns that service's verdict into the same [`TokenResult`] the local slots
//! produce, falling back to the local path when the rule allows it.

mod client;
mod state;
mod token;

pub use client::*;
pub use state::*;
pub use token::*;
