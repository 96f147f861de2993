//! Content identifiers pairing a root digest with the content size.
//!
//! Binary layout: two magic bytes, the 32-byte root, then the size as an
//! 8-byte little-endian integer. The text form is multibase base58btc,
//! i.e. a `z` followed by the base58 encoding of the binary layout.

use std::fmt;
use std::str::FromStr;

use crate::digest::DIGEST_LEN;
use crate::{Result, RootDigest, VerificationError};

pub const MAGIC_BYTES: [u8; 2] = [0x26, 0x1f];

const MULTIBASE_BASE58BTC: char = 'z';
pub const CID_LEN: usize = MAGIC_BYTES.len() + DIGEST_LEN + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid {
    pub hash: RootDigest,
    pub size: u64,
}

impl Cid {
    pub fn new(hash: RootDigest, size: u64) -> Self { Self { hash, size } }

    /// Identifier for an in-memory buffer.
    pub fn of(data: &[u8]) -> Self { Self::new(RootDigest::compute(data), data.len() as u64) }

    pub fn to_bytes(&self) -> [u8; CID_LEN] {
        let mut out = [0u8; CID_LEN];
        out[..2].copy_from_slice(&MAGIC_BYTES);
        out[2..2 + DIGEST_LEN].copy_from_slice(self.hash.as_bytes());
        out[2 + DIGEST_LEN..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CID_LEN {
            return Err(VerificationError::InvalidCid("unexpected length"));
        }
        if bytes[..2] != MAGIC_BYTES {
            return Err(VerificationError::InvalidCid("bad magic bytes"));
        }

        let hash = RootDigest::try_from(&bytes[2..2 + DIGEST_LEN])?;
        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[2 + DIGEST_LEN..]);
        Ok(Self::new(hash, u64::from_le_bytes(size)))
    }
}

impl FromStr for Cid {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        let encoded = s
            .strip_prefix(MULTIBASE_BASE58BTC)
            .ok_or(VerificationError::InvalidCid("missing base58btc prefix"))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| VerificationError::InvalidCid("invalid base58"))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MULTIBASE_BASE58BTC}{}", bs58::encode(self.to_bytes()).into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_form_roundtrip() {
        let cid = Cid::of(b"hello world");
        let text = cid.to_string();
        assert!(text.starts_with('z'));
        assert_eq!(text.parse::<Cid>().unwrap(), cid);
    }

    #[test]
    fn test_binary_layout() {
        let cid = Cid::new(RootDigest::from_bytes([7; 32]), 0x0102);
        let bytes = cid.to_bytes();
        assert_eq!(&bytes[..2], &MAGIC_BYTES);
        assert_eq!(&bytes[2..34], &[7; 32]);
        assert_eq!(&bytes[34..], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!("abc".parse::<Cid>(), Err(VerificationError::InvalidCid(_))));
        assert!(matches!("z0OIl".parse::<Cid>(), Err(VerificationError::InvalidCid("invalid base58"))));

        let mut bytes = Cid::of(b"x").to_bytes();
        bytes[0] = 0;
        let text = format!("z{}", bs58::encode(bytes).into_string());
        assert!(matches!(text.parse::<Cid>(), Err(VerificationError::InvalidCid("bad magic bytes"))));

        let short = format!("z{}", bs58::encode([0x26, 0x1f, 1, 2]).into_string());
        assert!(matches!(short.parse::<Cid>(), Err(VerificationError::InvalidCid("unexpected length"))));
    }
}
