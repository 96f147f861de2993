use std::io::{self, Read};
use std::sync::Arc;

use baobridge_verify::VerificationError;
use bytes::{Buf, Bytes};

use crate::core::Rendezvous;

/// Blocking `Read` over chunks pushed by the host.
///
/// Every read with an empty buffer of excess bytes issues one request for
/// `buf.len()` bytes and blocks until the host answers. A zero-length
/// answer reads as end of stream. Bytes beyond what the caller asked for
/// are kept and served by the following reads without a new request.
pub struct PullReader {
    rendezvous: Arc<Rendezvous>,
    excess: Bytes,
    consumed: u64,
}

impl PullReader {
    pub(crate) fn new(rendezvous: Arc<Rendezvous>) -> Self {
        Self {
            rendezvous,
            excess: Bytes::new(),
            consumed: 0,
        }
    }

    /// Bytes handed to the caller so far.
    pub fn consumed(&self) -> u64 { self.consumed }
}

impl Read for PullReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.excess.is_empty() {
            self.excess = self
                .rendezvous
                .request(buf.len())
                .map_err(|_| VerificationError::cancelled_io())?;
        }

        let n = buf.len().min(self.excess.len());
        buf[..n].copy_from_slice(&self.excess[..n]);
        self.excess.advance(n);
        self.consumed += n as u64;
        Ok(n)
    }
}
