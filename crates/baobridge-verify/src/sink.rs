use std::io::{self, Write};

/// Writer that counts the bytes passing through to an inner sink.
///
/// Lets a verifier report how much plaintext it accepted even when the
/// copy loop ends in an error.
pub struct CountingSink<W> {
    inner: W,
    written: u64,
}

impl<W> CountingSink<W> {
    pub fn new(inner: W) -> Self { Self { inner, written: 0 } }

    pub fn written(&self) -> u64 { self.written }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_through_copy() {
        let mut sink = CountingSink::new(Vec::new());
        io::copy(&mut &b"test data for counting"[..], &mut sink).unwrap();
        assert_eq!(sink.written(), 22);
        assert_eq!(sink.into_inner(), b"test data for counting");
    }
}
