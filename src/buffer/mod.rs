//! Buffer module - pooled segments and segment chains.
//!
//! This module implements the memory model of the transform:
//! - [`BufferPool`] - rents fixed-capacity buffers, reclaims them on drop
//! - [`Segment`] / [`SegmentChain`] - ordered multi-segment byte sequences
//! - [`ChainBuilder`] - assembles streaming codec output into a chain

mod chain;
mod pool;

pub use chain::{ChainBuilder, Segment, SegmentChain};
pub use pool::{BufferPool, PooledBuf, DEFAULT_SEGMENT_CAPACITY};
