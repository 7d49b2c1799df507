//! Reusable copy buffers for uploads.
//!
//! Buffers are handed out as [`PooledBuffer`] guards and go back to the pool
//! when the guard drops, on success and error paths alike.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

/// Size of each pooled buffer.
pub const BUFFER_SIZE: usize = 32 * 1024;

/// Default cap on idle buffers kept for reuse.
const DEFAULT_MAX_RETAINED: usize = 64;

/// Pool of fixed-size byte buffers. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    buffer_size: usize,
    max_retained: usize,
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_SIZE, DEFAULT_MAX_RETAINED)
    }

    /// Pool of `buffer_size` buffers keeping at most `max_retained` idle.
    pub fn with_capacity(buffer_size: usize, max_retained: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                buffer_size,
                max_retained,
                idle: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Take a zeroed buffer of the pool's size.
    pub fn get(&self) -> PooledBuffer {
        let buf = self
            .inner
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0; self.inner.buffer_size]);
        PooledBuffer {
            buf,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<Inner>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        if buf.len() != self.pool.buffer_size {
            return;
        }
        buf.fill(0);

        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_retained {
            idle.push(buf);
        }
    }
}
