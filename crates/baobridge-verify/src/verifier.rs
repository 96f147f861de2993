use std::io::{self, Cursor, Read, Write};

use crate::{CountingSink, RootDigest, VerificationError};

/// Result of one verification run.
#[derive(Debug)]
pub struct VerifyReport {
    /// Plaintext bytes accepted by the verifier and written to the sink.
    pub bytes_verified: u64,
    /// Why the run stopped early, if it did.
    pub error: Option<VerificationError>,
}

impl VerifyReport {
    pub fn is_success(&self) -> bool { self.error.is_none() }
}

/// Incremental verification of a data stream against a committed root.
///
/// Implementations pull from `source` until the stream or the proof is
/// exhausted and write every accepted byte to `sink`. A zero-length read
/// from `source` means the stream has ended.
pub trait StreamVerifier: Send + Sync {
    fn verify(
        &self,
        sink: &mut dyn Write,
        source: &mut dyn Read,
        proof: &[u8],
        root: &RootDigest,
    ) -> VerifyReport;
}

/// BLAKE3 verified streaming with an outboard BAO proof.
///
/// The proof is the outboard encoding of the content: the length header
/// followed by the parent nodes of the hash tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaoVerifier;

impl BaoVerifier {
    pub fn new() -> Self { Self }
}

impl StreamVerifier for BaoVerifier {
    fn verify(
        &self,
        sink: &mut dyn Write,
        source: &mut dyn Read,
        proof: &[u8],
        root: &RootDigest,
    ) -> VerifyReport {
        let hash = bao::Hash::from(*root.as_bytes());
        let mut decoder = bao::decode::Decoder::new_outboard(source, Cursor::new(proof), &hash);
        let mut sink = CountingSink::new(sink);
        let result = io::copy(&mut decoder, &mut sink);

        VerifyReport {
            bytes_verified: sink.written(),
            error: result
                .err()
                .map(|err| VerificationError::from_io(err).with_root(root)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(len: usize) -> (Vec<u8>, Vec<u8>, RootDigest) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let (proof, hash) = bao::encode::outboard(&data);
        (data, proof, RootDigest::from_bytes(*hash.as_bytes()))
    }

    #[test]
    fn test_bao_root_matches_blake3() {
        let (data, _, root) = fixture(5000);
        assert_eq!(root, RootDigest::compute(&data));
    }

    #[test]
    fn test_verifies_valid_stream() {
        let (data, proof, root) = fixture(10_000);
        let mut plain = Vec::new();
        let report = BaoVerifier.verify(&mut plain, &mut data.as_slice(), &proof, &root);

        assert!(report.is_success(), "{:?}", report.error);
        assert_eq!(report.bytes_verified, 10_000);
        assert_eq!(plain, data);
    }

    #[test]
    fn test_detects_tampering() {
        let (mut data, proof, root) = fixture(10);
        data[5] ^= 0x10;
        let report = BaoVerifier.verify(&mut io::sink(), &mut data.as_slice(), &proof, &root);

        match report.error {
            Some(VerificationError::Mismatch { root: reported }) => assert_eq!(reported, root.to_string()),
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(report.bytes_verified, 0);
    }

    #[test]
    fn test_detects_truncation() {
        let (data, proof, root) = fixture(3000);
        let report = BaoVerifier.verify(&mut io::sink(), &mut &data[..2000], &proof, &root);
        assert!(matches!(report.error, Some(VerificationError::Truncated)));
    }

    #[test]
    fn test_cancelled_source_is_classified() {
        struct Cancelled;
        impl Read for Cancelled {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> { Err(VerificationError::cancelled_io()) }
        }

        let (_, proof, root) = fixture(100);
        let report = BaoVerifier.verify(&mut io::sink(), &mut Cancelled, &proof, &root);
        assert!(matches!(report.error, Some(VerificationError::Cancelled)));
    }
}
