//! Host-side driver that answers a session's requests from a byte stream.
//!
//! Upstream chunks rarely line up with what the verifier asks for, so
//! [`ChunkReader`] regroups them into exactly the requested sizes.

use std::io;

use baobridge_verify::RootDigest;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::data::{Demand, Outcome, SessionId};
use crate::effects::registry::Registry;
use crate::effects::session::Session;
use crate::error::{Error, Result};

/// Reads variable-sized chunks out of a stream of arbitrary chunks.
pub struct ChunkReader<S> {
    inner: S,
    buffer: BytesMut,
    exhausted: bool,
}

impl<S> ChunkReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            exhausted: false,
        }
    }

    /// Next `n` bytes, fewer only once the upstream has ended.
    ///
    /// Returns an empty chunk when nothing is left.
    pub async fn read(&mut self, n: usize) -> io::Result<Bytes> {
        while self.buffer.len() < n && !self.exhausted {
            match self.inner.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => self.exhausted = true,
            }
        }
        let take = n.min(self.buffer.len());
        Ok(self.buffer.split_to(take).freeze())
    }

    pub fn is_exhausted(&self) -> bool { self.exhausted && self.buffer.is_empty() }
}

/// Answer every request of `session` from `data` until verification ends.
///
/// The session is killed if `data` fails, since the verifier could
/// otherwise wait forever for the rest of the stream.
pub async fn feed<S>(session: &Session, data: S) -> Result<Outcome>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let mut reader = ChunkReader::new(data);
    loop {
        match session.next_request().await? {
            Demand::Bytes(n) => {
                let chunk = match reader.read(n).await {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        session.kill();
                        return Err(Error::Source(err));
                    }
                };
                session.submit_data(chunk)?;
            }
            Demand::Finished => break,
        }
    }
    Ok(session.wait_outcome().await)
}

struct ReleaseOnDrop<'a> {
    registry: &'a Registry,
    id: SessionId,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) { self.registry.release(self.id); }
}

/// Verify `data` against `root` and `proof` in a fresh session.
///
/// The session is retired when this returns. Dropping the future early
/// kills it.
pub async fn verify_stream<S>(
    registry: &Registry,
    root: &RootDigest,
    proof: impl Into<Bytes>,
    data: S,
) -> Result<Outcome>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let id = registry.create()?;
    let _release = ReleaseOnDrop { registry, id };
    let session = registry.session(id)?;

    session.submit_root(root.as_bytes())?;
    session.submit_proof(proof)?;
    feed(&session, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&[u8]]) -> stream::Iter<std::vec::IntoIter<io::Result<Bytes>>> {
        stream::iter(parts.iter().map(|part| Ok(Bytes::copy_from_slice(part))).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_merges_and_splits_chunks() {
        let mut reader = ChunkReader::new(chunks(&[b"ab", b"cde", b"f"]));

        assert_eq!(&reader.read(4).await.unwrap()[..], b"abcd");
        assert_eq!(&reader.read(1).await.unwrap()[..], b"e");
        assert_eq!(&reader.read(10).await.unwrap()[..], b"f");
        assert!(reader.is_exhausted());
        assert!(reader.read(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_propagates_upstream_error() {
        let parts = vec![Ok(Bytes::from_static(b"ab")), Err(io::Error::other("reset"))];
        let mut reader = ChunkReader::new(stream::iter(parts));

        assert_eq!(&reader.read(1).await.unwrap()[..], b"a");
        assert!(reader.read(5).await.is_err());
    }
}
