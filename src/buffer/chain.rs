//! Segment chains - multi-segment payload byte sequences.
//!
//! A payload is held as an ordered chain of fixed-capacity pooled buffers
//! instead of one contiguous allocation. Compressed and decompressed sizes
//! are unpredictable, so the chain grows one pooled segment at a time and is
//! read back as an ordered sequence of slices; nothing is ever copied
//! between segments.
//!
//! Invariants:
//! - segment order matches production order
//! - total length is the sum of segment lengths
//! - no linked segment is empty (the empty chain has zero segments)
//!
//! # Example
//!
//! ```
//! use permessage_deflate::buffer::{BufferPool, SegmentChain};
//!
//! let pool = BufferPool::with_capacity(4);
//! let chain = SegmentChain::from_slice(&pool, b"hello world").unwrap();
//!
//! assert_eq!(chain.len(), 11);
//! assert_eq!(chain.segment_count(), 3); // 4 + 4 + 3 bytes
//! assert_eq!(&chain.to_vec(), b"hello world");
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::buffer::pool::{BufferPool, PooledBuf};
use crate::error::{DeflateError, Result};

/// A single payload segment: a pooled buffer plus a valid-length marker.
///
/// Only the first `len` bytes of the buffer are meaningful; the remainder is
/// spare capacity (possibly stale from a previous rental).
#[derive(Debug)]
pub struct Segment {
    buf: PooledBuf,
    len: usize,
}

impl Segment {
    fn new(buf: PooledBuf) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes have been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Valid prefix of the buffer.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf.as_slice()[..self.len]
    }

    /// Unwritten spare capacity in bytes.
    #[inline]
    fn spare_len(&self) -> usize {
        self.buf.capacity() - self.len
    }

    /// Mutable view over the unwritten tail of the buffer.
    #[inline]
    fn spare_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut self.buf.as_mut_slice()[len..]
    }

    /// Mark `n` more bytes as written.
    fn advance(&mut self, n: usize) {
        debug_assert!(self.len + n <= self.buf.capacity());
        self.len += n;
    }

    /// Shorten the valid prefix to `len` bytes.
    fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }
}

/// An ordered byte sequence spanning one or more pooled segments.
///
/// The chain is the unit of payload ownership: dropping it returns every
/// segment's buffer to the pool.
#[derive(Debug, Default)]
pub struct SegmentChain {
    segments: Vec<Segment>,
    len: usize,
}

impl SegmentChain {
    /// The empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a contiguous byte slice into a chain of pooled segments.
    ///
    /// This is the ingestion path for payloads arriving as one buffer;
    /// transform output never takes it.
    ///
    /// # Errors
    ///
    /// Returns [`DeflateError::PoolExhausted`] if the pool cannot supply
    /// enough segments.
    pub fn from_slice(pool: &Arc<BufferPool>, data: &[u8]) -> Result<Self> {
        let mut builder = ChainBuilder::new(Arc::clone(pool));
        let mut rest = data;
        while !rest.is_empty() {
            let space = builder.space()?;
            let take = rest.len().min(space.len());
            space[..take].copy_from_slice(&rest[..take]);
            builder.advance(take);
            rest = &rest[take..];
        }
        Ok(builder.finish())
    }

    /// Total byte length across all segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the chain holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of linked segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Iterate the segment slices in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(Segment::as_slice)
    }

    /// Copy the chain into one contiguous `Bytes`.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.len);
        for slice in self.iter() {
            out.extend_from_slice(slice);
        }
        out.freeze()
    }

    /// Copy the chain into a `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for slice in self.iter() {
            out.extend_from_slice(slice);
        }
        out
    }

    /// Decode the chain as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`DeflateError::Utf8`] if the bytes are not valid UTF-8.
    pub fn to_text(&self) -> Result<String> {
        String::from_utf8(self.to_vec()).map_err(|e| DeflateError::Utf8(e.utf8_error()))
    }

    /// True if the chain ends with `suffix`.
    ///
    /// The comparison walks segments from the tail, so a suffix split across
    /// segment boundaries is matched without copying.
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        if suffix.len() > self.len {
            return false;
        }
        let mut needle = suffix.len();
        for segment in self.segments.iter().rev() {
            if needle == 0 {
                break;
            }
            let slice = segment.as_slice();
            let take = needle.min(slice.len());
            if slice[slice.len() - take..] != suffix[needle - take..needle] {
                return false;
            }
            needle -= take;
        }
        needle == 0
    }

    /// Shorten the chain to `len` bytes.
    ///
    /// Tail segments emptied by the cut are unlinked and their buffers
    /// return to the pool, keeping the no-empty-segments invariant.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let mut excess = self.len - len;
        while excess > 0 {
            let tail = match self.segments.last_mut() {
                Some(tail) => tail,
                None => break,
            };
            if tail.len() > excess {
                let keep = tail.len() - excess;
                tail.truncate(keep);
                excess = 0;
            } else {
                excess -= tail.len();
                self.segments.pop();
            }
        }
        self.len = len;
    }

    /// Link a produced segment at the tail.
    fn push(&mut self, segment: Segment) {
        debug_assert!(!segment.is_empty(), "empty segment must not be linked");
        self.len += segment.len();
        self.segments.push(segment);
    }
}

/// Assembles streaming codec output into a [`SegmentChain`].
///
/// The builder stages one open segment and offers its spare capacity to the
/// producer via [`space`](Self::space) / [`advance`](Self::advance). A
/// segment is linked into the chain only once it holds bytes: a production
/// cycle that writes nothing leaves the chain untouched, and a still-empty
/// staged buffer goes back to the pool on [`finish`](Self::finish). The
/// staged segment is filled to capacity before the next buffer is rented.
pub struct ChainBuilder {
    pool: Arc<BufferPool>,
    chain: SegmentChain,
    current: Option<Segment>,
}

impl ChainBuilder {
    /// Create a builder renting segments from `pool`.
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self {
            pool,
            chain: SegmentChain::new(),
            current: None,
        }
    }

    /// Writable spare space, renting a fresh segment when the staged one is
    /// full (or absent). The returned slice is never empty.
    ///
    /// # Errors
    ///
    /// Returns [`DeflateError::PoolExhausted`] if a fresh segment is needed
    /// and the pool refuses the rental.
    pub fn space(&mut self) -> Result<&mut [u8]> {
        let need_fresh = match self.current.as_ref() {
            Some(segment) => segment.spare_len() == 0,
            None => true,
        };
        if need_fresh {
            if let Some(full) = self.current.take() {
                self.chain.push(full);
            }
            self.current = Some(Segment::new(self.pool.rent()?));
        }
        match self.current.as_mut() {
            Some(segment) => Ok(segment.spare_mut()),
            None => unreachable!("staged segment was just rented"),
        }
    }

    /// Commit `n` bytes just written into the slice returned by
    /// [`space`](Self::space). Committing zero bytes is a no-op.
    pub fn advance(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        debug_assert!(self.current.is_some(), "advance() before space()");
        if let Some(segment) = self.current.as_mut() {
            segment.advance(n);
        }
    }

    /// Seal the staged segment and return the finished chain.
    pub fn finish(mut self) -> SegmentChain {
        if let Some(segment) = self.current.take() {
            if !segment.is_empty() {
                self.chain.push(segment);
            }
            // A still-empty staged segment is dropped here, returning its
            // buffer to the pool without ever being linked.
        }
        self.chain
    }
}

impl fmt::Debug for ChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("chain", &self.chain)
            .field("staged", &self.current.as_ref().map(Segment::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain() {
        let chain = SegmentChain::new();
        assert_eq!(chain.len(), 0);
        assert!(chain.is_empty());
        assert_eq!(chain.segment_count(), 0);
        assert!(chain.to_vec().is_empty());
    }

    #[test]
    fn test_from_slice_single_segment() {
        let pool = BufferPool::with_capacity(16);
        let chain = SegmentChain::from_slice(&pool, b"hello").unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.segment_count(), 1);
        assert_eq!(&chain.to_vec(), b"hello");
    }

    #[test]
    fn test_from_slice_spans_segments() {
        let pool = BufferPool::with_capacity(4);
        let chain = SegmentChain::from_slice(&pool, b"hello world").unwrap();
        assert_eq!(chain.len(), 11);
        assert_eq!(chain.segment_count(), 3);

        let slices: Vec<&[u8]> = chain.iter().collect();
        assert_eq!(slices, vec![&b"hell"[..], &b"o wo"[..], &b"rld"[..]]);
    }

    #[test]
    fn test_from_slice_empty() {
        let pool = BufferPool::with_capacity(4);
        let chain = SegmentChain::from_slice(&pool, b"").unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.segment_count(), 0);
        // Nothing stays rented for an empty input.
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_ends_with_within_one_segment() {
        let pool = BufferPool::with_capacity(16);
        let chain = SegmentChain::from_slice(&pool, b"payload\x00\x00\xff\xff").unwrap();
        assert!(chain.ends_with(&[0x00, 0x00, 0xff, 0xff]));
        assert!(!chain.ends_with(&[0xff, 0xff, 0x00, 0x00]));
    }

    #[test]
    fn test_ends_with_across_segment_boundary() {
        // 2-byte segments: the 4-byte suffix spans two segments.
        let pool = BufferPool::with_capacity(2);
        let chain = SegmentChain::from_slice(&pool, &[0xAA, 0xBB, 0x00, 0x00, 0xff, 0xff]).unwrap();
        assert_eq!(chain.segment_count(), 3);
        assert!(chain.ends_with(&[0x00, 0x00, 0xff, 0xff]));
        assert!(chain.ends_with(&[0xBB, 0x00, 0x00, 0xff, 0xff]));
        assert!(!chain.ends_with(&[0x01, 0x00, 0xff, 0xff]));
    }

    #[test]
    fn test_ends_with_longer_than_chain() {
        let pool = BufferPool::with_capacity(4);
        let chain = SegmentChain::from_slice(&pool, b"ab").unwrap();
        assert!(!chain.ends_with(b"abc"));
        assert!(chain.ends_with(b"ab"));
        assert!(chain.ends_with(b""));
    }

    #[test]
    fn test_truncate_within_tail_segment() {
        let pool = BufferPool::with_capacity(8);
        let mut chain = SegmentChain::from_slice(&pool, b"abcdef").unwrap();
        chain.truncate(4);
        assert_eq!(chain.len(), 4);
        assert_eq!(&chain.to_vec(), b"abcd");
        assert_eq!(chain.segment_count(), 1);
    }

    #[test]
    fn test_truncate_drops_emptied_segments() {
        let pool = BufferPool::with_capacity(2);
        let mut chain = SegmentChain::from_slice(&pool, b"abcdef").unwrap();
        assert_eq!(chain.segment_count(), 3);

        chain.truncate(3);
        assert_eq!(chain.len(), 3);
        assert_eq!(&chain.to_vec(), b"abc");
        // Segments "ef" and half of "cd" are gone; "ef"'s buffer is back in
        // the pool.
        assert_eq!(chain.segment_count(), 2);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_truncate_to_zero() {
        let pool = BufferPool::with_capacity(2);
        let mut chain = SegmentChain::from_slice(&pool, b"abcd").unwrap();
        chain.truncate(0);
        assert!(chain.is_empty());
        assert_eq!(chain.segment_count(), 0);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_truncate_beyond_len_is_noop() {
        let pool = BufferPool::with_capacity(8);
        let mut chain = SegmentChain::from_slice(&pool, b"abc").unwrap();
        chain.truncate(10);
        assert_eq!(chain.len(), 3);
        assert_eq!(&chain.to_vec(), b"abc");
    }

    #[test]
    fn test_drop_returns_buffers_to_pool() {
        let pool = BufferPool::with_capacity(2);
        let chain = SegmentChain::from_slice(&pool, b"abcdef").unwrap();
        assert_eq!(pool.outstanding(), 3);
        drop(chain);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_to_text() {
        let pool = BufferPool::with_capacity(4);
        let chain = SegmentChain::from_slice(&pool, "grüße".as_bytes()).unwrap();
        assert_eq!(chain.to_text().unwrap(), "grüße");
    }

    #[test]
    fn test_to_text_invalid_utf8() {
        let pool = BufferPool::with_capacity(4);
        let chain = SegmentChain::from_slice(&pool, &[0xff, 0xfe]).unwrap();
        assert!(matches!(
            chain.to_text().unwrap_err(),
            DeflateError::Utf8(_)
        ));
    }

    #[test]
    fn test_to_bytes_matches_to_vec() {
        let pool = BufferPool::with_capacity(3);
        let chain = SegmentChain::from_slice(&pool, b"0123456789").unwrap();
        assert_eq!(chain.to_bytes().as_ref(), chain.to_vec().as_slice());
    }

    #[test]
    fn test_builder_fills_staged_segment_before_renting() {
        let pool = BufferPool::with_capacity(4);
        let mut builder = ChainBuilder::new(Arc::clone(&pool));

        // Two 2-byte writes land in the same 4-byte segment.
        let space = builder.space().unwrap();
        space[..2].copy_from_slice(b"ab");
        builder.advance(2);

        let space = builder.space().unwrap();
        assert_eq!(space.len(), 2);
        space.copy_from_slice(b"cd");
        builder.advance(2);

        let chain = builder.finish();
        assert_eq!(chain.segment_count(), 1);
        assert_eq!(&chain.to_vec(), b"abcd");
    }

    #[test]
    fn test_builder_zero_byte_cycle_links_nothing() {
        let pool = BufferPool::with_capacity(4);
        let mut builder = ChainBuilder::new(Arc::clone(&pool));

        let _space = builder.space().unwrap();
        builder.advance(0);

        let chain = builder.finish();
        assert!(chain.is_empty());
        assert_eq!(chain.segment_count(), 0);
        // The staged buffer went back to the pool.
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_builder_segment_order_matches_production_order() {
        let pool = BufferPool::with_capacity(2);
        let mut builder = ChainBuilder::new(Arc::clone(&pool));

        for chunk in [&b"ab"[..], b"cd", b"ef"] {
            let space = builder.space().unwrap();
            space[..chunk.len()].copy_from_slice(chunk);
            builder.advance(chunk.len());
        }

        let chain = builder.finish();
        assert_eq!(&chain.to_vec(), b"abcdef");
        let slices: Vec<&[u8]> = chain.iter().collect();
        assert_eq!(slices, vec![&b"ab"[..], b"cd", b"ef"]);
    }
}
