//! The per-message compression transform: encode outbound, decode inbound.
//!
//! [`DeflateExtension`] holds the per-connection codec state and applies the
//! two symmetric wire transforms of RFC 7692:
//!
//! - `encode` compresses an outbound message payload, strips the trailing
//!   `00 00 FF FF` flush marker and raises RSV1
//! - `decode` restores the marker on an RSV1 frame and decompresses it
//!
//! Both directions stream through the codec chunk by chunk and collect
//! output into pooled segment chains; no contiguous intermediate buffer is
//! built on either side.

use std::sync::Arc;

use flate2::Compression;

use crate::buffer::{BufferPool, ChainBuilder, SegmentChain};
use crate::deflate::codec::{ByteTransform, Deflator, Inflator};
use crate::error::{DeflateError, Result};
use crate::protocol::{Frame, Message, MessageData};

/// Extension token negotiated in `Sec-WebSocket-Extensions` (RFC 7692).
pub const EXTENSION_NAME: &str = "permessage-deflate";

/// Deflate empty-block flush marker.
///
/// A compliant sender strips these trailing four bytes from every compressed
/// payload; a compliant receiver restores them before decompressing. The
/// same constant serves both directions.
pub const TRAILER: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Input chunk size for feeding text content through the codec.
///
/// Binary payloads are fed segment by segment instead, which bounds chunks
/// at the pool's segment capacity.
const TEXT_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for the deflate transform.
#[derive(Debug, Clone, Copy)]
pub struct DeflateConfig {
    /// Compression level for the deflate encoder.
    pub level: Compression,
    /// Reset the compressor dictionary after every message
    /// (`client_no_context_takeover` behavior).
    pub compress_reset: bool,
    /// Reset the decompressor dictionary after every message
    /// (`server_no_context_takeover` behavior).
    pub decompress_reset: bool,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            level: Compression::default(),
            compress_reset: false,
            decompress_reset: false,
        }
    }
}

/// Per-connection permessage-deflate transform state.
///
/// One instance serves one connection: the codec dictionaries persist across
/// messages unless the reset knobs in [`DeflateConfig`] say otherwise, so
/// encode order must match transmission order (the transport already
/// guarantees this by calling from its single send/receive paths).
pub struct DeflateExtension {
    config: DeflateConfig,
    pool: Arc<BufferPool>,
    deflator: Deflator,
    inflator: Inflator,
}

impl DeflateExtension {
    /// Create an extension with default configuration.
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self::with_config(pool, DeflateConfig::default())
    }

    /// Create an extension with explicit configuration.
    pub fn with_config(pool: Arc<BufferPool>, config: DeflateConfig) -> Self {
        Self {
            config,
            pool,
            deflator: Deflator::new(config.level),
            inflator: Inflator::new(),
        }
    }

    /// Compress an outbound message in place and raise RSV1.
    ///
    /// Text content is encoded to UTF-8 and fed to the codec in fixed-size
    /// chunks; binary payloads are fed segment by segment, after a trailing
    /// flush marker on the *uncompressed* bytes is defensively removed so a
    /// message cannot be double-transformed. The compressed result always
    /// carries the sync-flush marker, which is stripped before the payload
    /// is stored back.
    ///
    /// # Errors
    ///
    /// On error the original payload has already been consumed and must be
    /// considered unusable; the message should not be sent.
    pub fn encode(&mut self, message: &mut Message) -> Result<()> {
        let before = message.payload_len();

        let mut compressed = match message.take_data() {
            MessageData::Text(text) => self.compress_text(&text)?,
            MessageData::Binary(mut payload) => {
                strip_trailer(&mut payload);
                self.compress_chain(&payload)?
            }
        };
        strip_trailer(&mut compressed);

        if self.config.compress_reset {
            self.deflator.reset();
        }

        tracing::trace!(
            before,
            after = compressed.len(),
            segments = compressed.segment_count(),
            "compressed outbound message"
        );

        message.set_data(MessageData::Binary(compressed));
        message.set_rsv1(true);
        Ok(())
    }

    /// Decompress an inbound frame in place when RSV1 is set.
    ///
    /// Frames without RSV1 pass through untouched. For compressed frames the
    /// stripped flush marker is restored after the payload, the whole stream
    /// runs through the decompressor, and the payload is replaced with the
    /// decompressed chain. RSV1 is left as received.
    ///
    /// # Errors
    ///
    /// Returns [`DeflateError::Decompress`] for a malformed compressed
    /// stream; the caller must reject the frame. The original payload has
    /// already been consumed at that point.
    pub fn decode(&mut self, frame: &mut Frame) -> Result<()> {
        if !frame.rsv1() {
            return Ok(());
        }

        let payload = frame.take_payload();
        let before = payload.len();

        let mut builder = ChainBuilder::new(Arc::clone(&self.pool));
        for segment in payload.iter() {
            pump(&mut self.inflator, segment, &mut builder)?;
        }
        // Restore what the compliant sender stripped; this also guarantees
        // at least one codec cycle for an empty payload.
        pump(&mut self.inflator, &TRAILER, &mut builder)?;
        drain(&mut self.inflator, &mut builder)?;

        if self.config.decompress_reset {
            self.inflator.reset();
        }

        let restored = builder.finish();
        tracing::trace!(
            before,
            after = restored.len(),
            segments = restored.segment_count(),
            "decompressed inbound frame"
        );

        frame.set_payload(restored);
        Ok(())
    }

    /// Compress text content, encoding to UTF-8 chunk by chunk.
    fn compress_text(&mut self, text: &str) -> Result<SegmentChain> {
        let mut builder = ChainBuilder::new(Arc::clone(&self.pool));
        for chunk in text.as_bytes().chunks(TEXT_CHUNK_SIZE) {
            pump(&mut self.deflator, chunk, &mut builder)?;
        }
        drain(&mut self.deflator, &mut builder)?;
        Ok(builder.finish())
    }

    /// Compress a binary payload segment by segment.
    fn compress_chain(&mut self, payload: &SegmentChain) -> Result<SegmentChain> {
        let mut builder = ChainBuilder::new(Arc::clone(&self.pool));
        for segment in payload.iter() {
            pump(&mut self.deflator, segment, &mut builder)?;
        }
        drain(&mut self.deflator, &mut builder)?;
        Ok(builder.finish())
    }
}

/// Remove the trailing flush marker from `chain` when present.
///
/// The comparison spans segment boundaries; the chain is left untouched when
/// it is shorter than the marker or ends with different bytes. Returns
/// whether a marker was removed.
///
/// # Example
///
/// ```
/// use permessage_deflate::buffer::{BufferPool, SegmentChain};
/// use permessage_deflate::deflate::strip_trailer;
///
/// let pool = BufferPool::with_capacity(16);
/// let mut chain = SegmentChain::from_slice(&pool, b"data\x00\x00\xff\xff").unwrap();
///
/// assert!(strip_trailer(&mut chain));
/// assert_eq!(&chain.to_vec(), b"data");
/// assert!(!strip_trailer(&mut chain));
/// ```
pub fn strip_trailer(chain: &mut SegmentChain) -> bool {
    if chain.ends_with(&TRAILER) {
        chain.truncate(chain.len() - TRAILER.len());
        true
    } else {
        false
    }
}

/// Feed one input chunk through `transform`, committing output into
/// `builder` as it is produced.
fn pump<T: ByteTransform>(
    transform: &mut T,
    mut input: &[u8],
    builder: &mut ChainBuilder,
) -> Result<()> {
    while !input.is_empty() {
        let space = builder.space()?;
        let (consumed, produced) = transform.process(input, space)?;
        builder.advance(produced);
        input = &input[consumed..];
        if consumed == 0 && produced == 0 {
            // With a non-empty output slice the codec must make progress;
            // bail out instead of spinning.
            return Err(DeflateError::CorruptStream);
        }
    }
    Ok(())
}

/// Drain trailing output from `transform` into `builder` until the codec
/// signals exhaustion with a zero-byte cycle.
fn drain<T: ByteTransform>(transform: &mut T, builder: &mut ChainBuilder) -> Result<()> {
    loop {
        let space = builder.space()?;
        let produced = transform.flush(space)?;
        if produced == 0 {
            return Ok(());
        }
        builder.advance(produced);
    }
}
