//! Verify externally pushed byte streams against a committed root.
//!
//! A host delivers the root digest, the proof and the data in whatever
//! pieces it receives them. The verifier consumes the data through a
//! blocking pull interface that asks for exact byte counts. Each
//! [`Session`] bridges the two with a bounded rendezvous: one outstanding
//! request, one undelivered chunk, so memory stays bounded and the host
//! always knows how much to send next.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Identifiers, phases, outcomes and options
//! - [`core`] - Handoff and rendezvous primitives, endpoint naming
//! - [`effects`] - Worker threads, sessions, the registry and the host driver
//!
//! # Example
//!
//! ```
//! use baobridge::{Registry, verify_stream};
//! use baobridge_verify::RootDigest;
//! use bytes::Bytes;
//! use futures_util::stream;
//!
//! let data = b"0123456789".to_vec();
//! let (proof, hash) = bao::encode::outboard(&data);
//! let root = RootDigest::from_bytes(*hash.as_bytes());
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let outcome = runtime.block_on(async {
//!     let registry = Registry::default();
//!     let chunks = stream::iter(vec![
//!         Ok(Bytes::copy_from_slice(&data[..3])),
//!         Ok(Bytes::copy_from_slice(&data[3..])),
//!     ]);
//!     verify_stream(&registry, &root, proof, chunks).await
//! });
//!
//! let outcome = outcome.unwrap();
//! assert!(outcome.is_success());
//! assert_eq!(outcome.bytes_verified, 10);
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{Endpoint, parse_endpoint};
pub use self::data::{Demand, ExcessPolicy, Failure, Outcome, SessionId, SessionOptions, SessionPhase};
pub use self::effects::{ChunkReader, PullReader, Registry, Session, feed, verify_stream};
pub use self::error::{Error, ProtocolViolation, Result};
