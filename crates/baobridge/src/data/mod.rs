//! Immutable data types shared by sessions and the registry.
//!
//! Identifiers, phases, outcomes and options are plain values; they are
//! produced by the effectful layer and handed to the host as-is.

pub mod options;
pub mod outcome;
pub mod session_id;

pub use options::{ExcessPolicy, PhaseCallback, SessionOptions};
pub use outcome::{Demand, Failure, Outcome, SessionPhase};
pub use session_id::SessionId;
