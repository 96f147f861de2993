//! Error types for baobridge.

use std::io;

use baobridge_verify::VerificationError;
use thiserror::Error;

use crate::data::SessionId;

/// Misuse of the push protocol by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("root digest supplied more than once")]
    RootAlreadySupplied,

    #[error("proof supplied more than once")]
    ProofAlreadySupplied,

    #[error("write without a pending request")]
    UnrequestedWrite,

    #[error("write of {delivered} bytes exceeds the {requested} requested")]
    Overflow { requested: usize, delivered: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    #[error("session {0} is closed")]
    Closed(SessionId),

    #[error("protocol violation on session {session}: {violation}")]
    Protocol {
        session: SessionId,
        violation: ProtocolViolation,
    },

    #[error("invalid root digest: {0}")]
    InvalidRoot(#[source] VerificationError),

    #[error("invalid endpoint name: {0}")]
    InvalidEndpoint(String),

    #[error("failed to spawn verification thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("data source error: {0}")]
    Source(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
