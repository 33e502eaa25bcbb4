//! Buffer pool for payload segments.
//!
//! Provides a pool of fixed-capacity byte buffers that are rented for
//! segment-chain assembly and reclaimed when the owning segment is dropped.
//!
//! # Design
//!
//! The pool keeps a locked free list and hands out [`PooledBuf`] values that
//! carry an `Arc` back to their pool:
//! - `rent()` pops a free buffer or allocates a fresh one
//! - dropping a `PooledBuf` pushes the buffer back onto the free list
//! - an optional outstanding-segment limit turns runaway payloads into a
//!   hard error instead of unbounded allocation
//!
//! `rent()` is safe to call concurrently from multiple threads; frames and
//! messages processed in parallel share one pool without further locking.
//!
//! # Usage
//!
//! ```
//! use permessage_deflate::buffer::BufferPool;
//!
//! let pool = BufferPool::new();
//! let buf = pool.rent().unwrap();
//! assert_eq!(buf.capacity(), pool.segment_capacity());
//! drop(buf); // returns to the free list
//! assert_eq!(pool.available(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{DeflateError, Result};

/// Default capacity of a pooled segment buffer.
///
/// Large enough that typical messages compress into a handful of segments.
pub const DEFAULT_SEGMENT_CAPACITY: usize = 8 * 1024;

/// Free buffers retained per pool; surplus returns are dropped.
const MAX_FREE_BUFFERS: usize = 32;

/// A pool of reusable fixed-capacity segment buffers.
pub struct BufferPool {
    /// Capacity of every buffer rented from this pool.
    capacity: usize,
    /// Optional cap on concurrently rented buffers.
    limit: Option<usize>,
    /// Free list plus rental accounting.
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    free: Vec<Vec<u8>>,
    outstanding: usize,
}

impl BufferPool {
    /// Create a pool with the default segment capacity.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_SEGMENT_CAPACITY)
    }

    /// Create a pool renting buffers of `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        assert!(capacity > 0, "segment capacity must be non-zero");
        Arc::new(Self {
            capacity,
            limit: None,
            inner: Mutex::new(PoolInner {
                free: Vec::new(),
                outstanding: 0,
            }),
        })
    }

    /// Create a pool that refuses to rent more than `limit` buffers at once.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_limit(capacity: usize, limit: usize) -> Arc<Self> {
        assert!(capacity > 0, "segment capacity must be non-zero");
        Arc::new(Self {
            capacity,
            limit: Some(limit),
            inner: Mutex::new(PoolInner {
                free: Vec::new(),
                outstanding: 0,
            }),
        })
    }

    /// Rent a buffer of exactly [`segment_capacity`](Self::segment_capacity)
    /// bytes.
    ///
    /// Reuses a free buffer when one is available, otherwise allocates.
    /// Content of a reused buffer is unspecified; the valid-length marker on
    /// the owning segment gates all reads.
    ///
    /// # Errors
    ///
    /// Returns [`DeflateError::PoolExhausted`] when an outstanding-segment
    /// limit is configured and reached.
    pub fn rent(self: &Arc<Self>) -> Result<PooledBuf> {
        let data = {
            let mut inner = self.inner.lock().expect("buffer pool poisoned");
            if let Some(limit) = self.limit {
                if inner.outstanding >= limit {
                    return Err(DeflateError::PoolExhausted {
                        outstanding: inner.outstanding,
                        limit,
                    });
                }
            }
            inner.outstanding += 1;
            inner.free.pop()
        };
        let data = data.unwrap_or_else(|| vec![0u8; self.capacity]);
        Ok(PooledBuf {
            data,
            pool: Arc::clone(self),
        })
    }

    /// Capacity of buffers rented from this pool.
    #[inline]
    pub fn segment_capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently on the free list.
    pub fn available(&self) -> usize {
        self.inner.lock().expect("buffer pool poisoned").free.len()
    }

    /// Number of buffers currently rented out.
    pub fn outstanding(&self) -> usize {
        self.inner.lock().expect("buffer pool poisoned").outstanding
    }

    /// Return a buffer to the free list.
    fn reclaim(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().expect("buffer pool poisoned");
        inner.outstanding = inner.outstanding.saturating_sub(1);
        if inner.free.len() < MAX_FREE_BUFFERS {
            inner.free.push(data);
        }
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity)
            .field("limit", &self.limit)
            .field("available", &self.available())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// A buffer rented from a [`BufferPool`].
///
/// Returns itself to the pool's free list when dropped.
pub struct PooledBuf {
    data: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuf {
    /// Full buffer contents, valid and stale bytes alike.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view over the full buffer.
    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Buffer capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.reclaim(data);
    }
}

impl fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuf")
            .field("capacity", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_allocates_full_capacity() {
        let pool = BufferPool::with_capacity(64);
        let buf = pool.rent().unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_drop_returns_buffer_to_free_list() {
        let pool = BufferPool::with_capacity(64);
        let buf = pool.rent().unwrap();
        drop(buf);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);

        // The next rent reuses the returned buffer.
        let _buf = pool.rent().unwrap();
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_limit_exhaustion() {
        let pool = BufferPool::with_limit(64, 2);
        let a = pool.rent().unwrap();
        let _b = pool.rent().unwrap();

        let err = pool.rent().unwrap_err();
        assert!(matches!(
            err,
            DeflateError::PoolExhausted {
                outstanding: 2,
                limit: 2
            }
        ));

        // Releasing a buffer makes rent succeed again.
        drop(a);
        assert!(pool.rent().is_ok());
    }

    #[test]
    fn test_default_capacity() {
        let pool = BufferPool::new();
        assert_eq!(pool.segment_capacity(), DEFAULT_SEGMENT_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "segment capacity must be non-zero")]
    fn test_zero_capacity_rejected() {
        let _ = BufferPool::with_capacity(0);
    }

    #[test]
    fn test_concurrent_rent() {
        use std::thread;

        let pool = BufferPool::with_capacity(32);
        let mut handles = Vec::new();

        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let buf = pool.rent().unwrap();
                    assert_eq!(buf.capacity(), 32);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.outstanding(), 0);
        assert!(pool.available() <= 8);
    }

    #[test]
    fn test_free_list_is_bounded() {
        let pool = BufferPool::with_capacity(16);
        let bufs: Vec<_> = (0..MAX_FREE_BUFFERS + 10)
            .map(|_| pool.rent().unwrap())
            .collect();
        drop(bufs);
        assert_eq!(pool.available(), MAX_FREE_BUFFERS);
    }
}
