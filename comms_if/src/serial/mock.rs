//! In-memory serial port for tests and bench runs.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
};

/// A port which reads from a queue of bytes and records everything written to it.
///
/// Reads from an empty queue fail with `TimedOut`, which is how a real port with a read timeout
/// behaves when nothing has arrived.
#[derive(Debug, Default)]
pub struct MockPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be returned by subsequent reads.
    pub fn queue_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Everything written so far, as text.
    pub fn tx_string(&self) -> String {
        String::from_utf8_lossy(&self.tx).to_string()
    }

    /// Clear the record of written bytes.
    pub fn clear_tx(&mut self) {
        self.tx.clear();
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }

        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }

        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
