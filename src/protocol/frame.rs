//! Frame and message types shared with the transport.
//!
//! The transport's parser/writer owns header assembly; this module models
//! only what the compression transform needs: the header flag nibble and the
//! payload as a segment chain. [`Frame`] is the inbound shape (flags already
//! parsed), [`Message`] the outbound one (content still text or binary).
//!
//! # Example
//!
//! ```
//! use permessage_deflate::protocol::{flags, Frame, Message};
//! use permessage_deflate::buffer::SegmentChain;
//!
//! let frame = Frame::new(flags::FIN | flags::RSV1, SegmentChain::new());
//! assert!(frame.rsv1());
//!
//! let message = Message::text("hello");
//! assert!(!message.rsv1());
//! ```

use crate::buffer::SegmentChain;

/// Flag bits of the WebSocket frame header's first nibble.
pub mod flags {
    /// Final fragment of a message.
    pub const FIN: u8 = 0b1000_0000;
    /// Extension bit: payload is deflate-compressed.
    pub const RSV1: u8 = 0b0100_0000;
    /// Reserved, zero unless an extension claims it.
    pub const RSV2: u8 = 0b0010_0000;
    /// Reserved, zero unless an extension claims it.
    pub const RSV3: u8 = 0b0001_0000;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// A received data frame, after the transport parsed the header.
///
/// The transform reads RSV1 and may replace the payload; everything else in
/// the frame belongs to the transport.
#[derive(Debug, Default)]
pub struct Frame {
    /// Header flag byte (see [`flags`]).
    flags: u8,
    /// Payload as an ordered segment chain.
    payload: SegmentChain,
}

impl Frame {
    /// Create a frame from its flag byte and payload.
    pub fn new(flags: u8, payload: SegmentChain) -> Self {
        Self { flags, payload }
    }

    /// Header flag byte.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Check if the peer marked the payload as compressed.
    #[inline]
    pub fn rsv1(&self) -> bool {
        flags::has_flag(self.flags, flags::RSV1)
    }

    /// Set or clear the RSV1 bit.
    #[inline]
    pub fn set_rsv1(&mut self, on: bool) {
        if on {
            self.flags |= flags::RSV1;
        } else {
            self.flags &= !flags::RSV1;
        }
    }

    /// Borrow the payload chain.
    #[inline]
    pub fn payload(&self) -> &SegmentChain {
        &self.payload
    }

    /// Take the payload out, leaving an empty chain behind.
    pub fn take_payload(&mut self) -> SegmentChain {
        std::mem::take(&mut self.payload)
    }

    /// Replace the payload chain.
    pub fn set_payload(&mut self, payload: SegmentChain) {
        self.payload = payload;
    }

    /// Consume the frame, yielding its payload.
    pub fn into_payload(self) -> SegmentChain {
        self.payload
    }
}

/// Body of an outbound message: text or binary, mutually exclusive.
#[derive(Debug)]
pub enum MessageData {
    /// Textual content, encoded to UTF-8 during compression.
    Text(String),
    /// Binary payload.
    Binary(SegmentChain),
}

/// An outbound data message, before frame assembly by the transport.
#[derive(Debug)]
pub struct Message {
    /// Header flag byte (see [`flags`]).
    flags: u8,
    /// Message body.
    data: MessageData,
}

impl Message {
    /// Create an unfragmented text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            flags: flags::FIN,
            data: MessageData::Text(text.into()),
        }
    }

    /// Create an unfragmented binary message.
    pub fn binary(payload: SegmentChain) -> Self {
        Self {
            flags: flags::FIN,
            data: MessageData::Binary(payload),
        }
    }

    /// Header flag byte.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Check if the payload has been marked compressed.
    #[inline]
    pub fn rsv1(&self) -> bool {
        flags::has_flag(self.flags, flags::RSV1)
    }

    /// Set or clear the RSV1 bit.
    #[inline]
    pub fn set_rsv1(&mut self, on: bool) {
        if on {
            self.flags |= flags::RSV1;
        } else {
            self.flags &= !flags::RSV1;
        }
    }

    /// Borrow the message body.
    #[inline]
    pub fn data(&self) -> &MessageData {
        &self.data
    }

    /// Binary payload chain, if the message carries one.
    pub fn payload(&self) -> Option<&SegmentChain> {
        match &self.data {
            MessageData::Binary(chain) => Some(chain),
            MessageData::Text(_) => None,
        }
    }

    /// Payload length in bytes (UTF-8 length for text content).
    pub fn payload_len(&self) -> usize {
        match &self.data {
            MessageData::Text(text) => text.len(),
            MessageData::Binary(chain) => chain.len(),
        }
    }

    /// Consume the message, yielding its body.
    pub fn into_data(self) -> MessageData {
        self.data
    }

    /// Take the body out, leaving an empty binary chain behind.
    pub(crate) fn take_data(&mut self) -> MessageData {
        std::mem::replace(&mut self.data, MessageData::Binary(SegmentChain::new()))
    }

    /// Store a new body.
    pub(crate) fn set_data(&mut self, data: MessageData) {
        self.data = data;
    }
}
