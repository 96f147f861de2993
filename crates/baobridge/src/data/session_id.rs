use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for one verification session.
///
/// Identifiers come from a process-wide counter and are never handed out
/// twice, so a retired session's namespace can never be confused with a
/// live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self { Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)) }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self { Self(raw) }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for SessionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
}
