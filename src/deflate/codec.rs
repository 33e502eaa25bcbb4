//! Streaming deflate codec - push/pull byte transforms over `flate2`.
//!
//! Both directions run raw (headerless) deflate, the format RFC 7692
//! mandates inside frames. The encoder ends every message with a sync flush,
//! which is what puts the `00 00 FF FF` empty-block marker at the end of the
//! compressed stream; the decoder expects that marker to have been restored
//! before the final drain.
//!
//! Progress is accounted via `total_in`/`total_out` deltas, so callers can
//! hand the codec arbitrary input chunks and output slices without the codec
//! buffering either side.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::{DeflateError, Result};

/// A streaming byte transform with a push/pull interface.
///
/// Usage per message: call [`process`](Self::process) for each input chunk
/// until the whole payload is consumed, then call [`flush`](Self::flush)
/// repeatedly; a flush producing zero bytes signals exhaustion.
///
/// The two variants, [`Deflator`] and [`Inflator`], share this interface so
/// the transform drivers do not depend on a concrete algorithm.
pub trait ByteTransform {
    /// Feed `input`, writing any transformed bytes into `out`.
    ///
    /// Returns `(consumed, produced)`. Either count may be zero; the codec
    /// is free to swallow input into internal state before emitting output.
    fn process(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)>;

    /// Drain output buffered by the codec after all input has been fed.
    ///
    /// `Ok(0)` signals exhaustion: the message is fully transformed.
    fn flush(&mut self, out: &mut [u8]) -> Result<usize>;
}

/// Compress-mode transform: raw deflate, sync-flushed at message end.
///
/// The sliding-window dictionary persists across messages (context
/// takeover); call [`reset`](Self::reset) between messages to emulate
/// `no_context_takeover` behavior.
pub struct Deflator {
    compress: Compress,
}

impl Deflator {
    /// Create a deflator with the given compression level.
    pub fn new(level: Compression) -> Self {
        Self {
            compress: Compress::new(level, false),
        }
    }

    /// Drop the dictionary, making the next message independent.
    pub fn reset(&mut self) {
        self.compress.reset();
    }
}

impl ByteTransform for Deflator {
    fn process(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)> {
        let before_in = self.compress.total_in();
        let before_out = self.compress.total_out();

        let status = self.compress.compress(input, out, FlushCompress::None)?;

        let consumed = (self.compress.total_in() - before_in) as usize;
        let produced = (self.compress.total_out() - before_out) as usize;

        match status {
            Status::Ok | Status::BufError => Ok((consumed, produced)),
            // A raw stream without a finish request cannot end here.
            Status::StreamEnd => Err(DeflateError::CorruptStream),
        }
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize> {
        let before_out = self.compress.total_out();

        // Repeating the sync flush is the documented way to finish an
        // interrupted flush; once nothing is pending the codec reports no
        // progress and we are done.
        let status = self.compress.compress(&[], out, FlushCompress::Sync)?;

        let produced = (self.compress.total_out() - before_out) as usize;

        match status {
            Status::Ok | Status::BufError => Ok(produced),
            Status::StreamEnd => Err(DeflateError::CorruptStream),
        }
    }
}

/// Decompress-mode transform: raw deflate.
///
/// Like [`Deflator`], the dictionary persists across messages unless
/// [`reset`](Self::reset) is called.
pub struct Inflator {
    decompress: Decompress,
}

impl Inflator {
    /// Create an inflator.
    pub fn new() -> Self {
        Self {
            decompress: Decompress::new(false),
        }
    }

    /// Drop the dictionary, making the next message independent.
    pub fn reset(&mut self) {
        self.decompress.reset(false);
    }
}

impl Default for Inflator {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteTransform for Inflator {
    fn process(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)> {
        let before_in = self.decompress.total_in();
        let before_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(input, out, FlushDecompress::None)?;

        let consumed = (self.decompress.total_in() - before_in) as usize;
        let produced = (self.decompress.total_out() - before_out) as usize;

        match status {
            Status::Ok | Status::BufError | Status::StreamEnd => Ok((consumed, produced)),
        }
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize> {
        let before_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(&[], out, FlushDecompress::Sync)?;

        let produced = (self.decompress.total_out() - before_out) as usize;

        match status {
            Status::Ok | Status::BufError | Status::StreamEnd => Ok(produced),
        }
    }
}
