use std::io;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("hash mismatch: stream does not match root {root}")]
    Mismatch { root: String },

    #[error("stream ended before the proof was satisfied")]
    Truncated,

    #[error("verification cancelled")]
    Cancelled,

    #[error("invalid root digest length: expected 32 bytes, got {0}")]
    InvalidRootLength(usize),

    #[error("invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid cid: {0}")]
    InvalidCid(&'static str),

    #[error(transparent)]
    Io(io::Error),
}

impl VerificationError {
    /// Classify an error surfaced by the decoder or by the pull source.
    ///
    /// The root is unknown at this level, so mismatches carry an empty
    /// root until [`VerificationError::with_root`] fills it in.
    pub fn from_io(err: io::Error) -> Self {
        let cancelled = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<VerificationError>())
            .is_some_and(|inner| matches!(inner, VerificationError::Cancelled));
        if cancelled {
            return VerificationError::Cancelled;
        }

        match err.kind() {
            io::ErrorKind::InvalidData => VerificationError::Mismatch { root: String::new() },
            io::ErrorKind::UnexpectedEof => VerificationError::Truncated,
            _ => VerificationError::Io(err),
        }
    }

    pub(crate) fn with_root(self, root: &crate::RootDigest) -> Self {
        match self {
            VerificationError::Mismatch { .. } => VerificationError::Mismatch { root: root.to_string() },
            other => other,
        }
    }

    /// The error a pull source returns once its session is cancelled.
    pub fn cancelled_io() -> io::Error { io::Error::other(VerificationError::Cancelled) }
}

impl From<io::Error> for VerificationError {
    fn from(err: io::Error) -> Self { Self::from_io(err) }
}

pub type Result<T> = std::result::Result<T, VerificationError>;
