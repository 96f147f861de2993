use std::fmt;

use baobridge_verify::{VerificationError, VerifyReport};

/// Phases of a verification session.
///
/// Sessions progress through these phases in order:
/// Created → AwaitingRootAndProof → Verifying → Done
///
/// `Killed` is reachable from every phase except `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Registered, with its worker thread not yet running.
    #[default]
    Created,

    /// Waiting for both the root digest and the proof.
    ///
    /// The two arrive through independent handoffs and may be supplied in
    /// either order.
    AwaitingRootAndProof,

    /// The verifier is pulling data through the session's reader.
    Verifying,

    /// An outcome has been published.
    Done,

    /// Terminated by an explicit kill.
    Killed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool { matches!(self, SessionPhase::Done | SessionPhase::Killed) }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Created => write!(f, "Created"),
            SessionPhase::AwaitingRootAndProof => write!(f, "AwaitingRootAndProof"),
            SessionPhase::Verifying => write!(f, "Verifying"),
            SessionPhase::Done => write!(f, "Done"),
            SessionPhase::Killed => write!(f, "Killed"),
        }
    }
}

/// Why a session did not verify its stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The verifier rejected the stream or the proof.
    #[error("verification failed: {0}")]
    Verification(String),

    /// The session was killed before verification finished.
    #[error("session cancelled")]
    Cancelled,

    /// The verifier panicked on the worker thread.
    #[error("verifier panicked: {0}")]
    Panicked(String),
}

/// Published result of a session, written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub bytes_verified: u64,
    pub error: Option<Failure>,
}

impl Outcome {
    pub fn is_success(&self) -> bool { self.error.is_none() }

    pub(crate) fn cancelled(bytes_verified: u64) -> Self {
        Self {
            bytes_verified,
            error: Some(Failure::Cancelled),
        }
    }
}

impl From<VerifyReport> for Outcome {
    fn from(report: VerifyReport) -> Self {
        let error = report.error.map(|err| match err {
            VerificationError::Cancelled => Failure::Cancelled,
            other => Failure::Verification(other.to_string()),
        });
        Self {
            bytes_verified: report.bytes_verified,
            error,
        }
    }
}

/// What the host learns when it asks how much data a session wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// The verifier is blocked until a chunk of at most this many bytes arrives.
    Bytes(usize),
    /// Verification has ended; no further data will be pulled.
    Finished,
}
