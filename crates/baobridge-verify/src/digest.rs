use std::fmt;
use std::str::FromStr;

use crate::{Result, VerificationError};

/// Length of a BLAKE3 root digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// The committed root a full data stream must hash to.
///
/// Under BAO the root of the hash tree equals the plain BLAKE3 hash of the
/// content, so [`RootDigest::compute`] and the root produced by an outboard
/// encoder agree.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootDigest([u8; DIGEST_LEN]);

impl RootDigest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] { &self.0 }

    /// BLAKE3 digest of an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self { Self(*blake3::hash(data).as_bytes()) }
}

impl TryFrom<&[u8]> for RootDigest {
    type Error = VerificationError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| VerificationError::InvalidRootLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl From<[u8; DIGEST_LEN]> for RootDigest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self { Self(bytes) }
}

impl FromStr for RootDigest {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for RootDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&hex::encode(self.0)) }
}

impl fmt::Debug for RootDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "RootDigest({self})") }
}
