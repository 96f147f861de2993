//! Synchronisation primitives bridging host pushes and verifier pulls.
//!
//! Nothing here spawns threads or knows about sessions: the handoffs only
//! move values between one producer and one consumer, and the endpoint
//! helpers only format and parse names.

mod endpoint;
mod handoff;
mod rendezvous;

pub use endpoint::{Endpoint, parse_endpoint};
pub(crate) use handoff::{Handoff, HandoffError};
pub(crate) use rendezvous::{Closure, Refusal, Rendezvous};
