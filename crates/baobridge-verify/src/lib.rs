//! Verification primitives for streamed content.
//!
//! Provides the committed [`RootDigest`], the [`Cid`] text form that carries
//! it, and the [`StreamVerifier`] seam with a BLAKE3/BAO outboard
//! implementation. A verifier pulls from any `Read` source, so it can run
//! against bytes that arrive long after verification has started.
//!
//! # Example
//!
//! ```
//! use baobridge_verify::{BaoVerifier, RootDigest, StreamVerifier};
//!
//! let data = b"hello world";
//! let (proof, hash) = bao::encode::outboard(data);
//! let root = RootDigest::from_bytes(*hash.as_bytes());
//!
//! let report = BaoVerifier.verify(&mut std::io::sink(), &mut &data[..], &proof, &root);
//! assert!(report.is_success());
//! assert_eq!(report.bytes_verified, 11);
//! ```

pub use self::cid::{CID_LEN, Cid, MAGIC_BYTES};
pub use self::digest::{DIGEST_LEN, RootDigest};
pub use self::error::{Result, VerificationError};
pub use self::sink::CountingSink;
pub use self::verifier::{BaoVerifier, StreamVerifier, VerifyReport};

mod cid;
mod digest;
mod error;
mod sink;
mod verifier;
