//! Growable accumulation buffer for incremental encode output.
//!
//! The PNG encoder emits the stream in many small chunks. Collecting them
//! byte-by-byte would reallocate O(n²); this sink over-allocates
//! geometrically instead, starting from a 32 KiB floor.

use std::io::{self, Write};

const INITIAL_CAPACITY: usize = 32 * 1024;

/// An append-only byte buffer with geometric capacity growth.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    buf: Vec<u8>,
}

impl ChunkBuffer {
    /// Create an empty buffer. No allocation happens until the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether any bytes have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the buffer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Grow capacity so `extra` more bytes fit, doubling from the floor.
    fn ensure(&mut self, extra: usize) {
        let needed = self.buf.len() + extra;
        if needed <= self.buf.capacity() {
            return;
        }
        let mut target = self.buf.capacity().max(INITIAL_CAPACITY);
        while target < needed {
            target *= 2;
        }
        self.buf.reserve_exact(target - self.buf.len());
    }
}

impl Write for ChunkBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.ensure(data.len());
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
