//! Deflate module - the RFC 7692 per-message compression transform.
//!
//! This module provides the wire-level transform of permessage-deflate:
//!
//! - [`DeflateExtension`] - `encode` outbound messages, `decode` inbound
//!   frames, both in place
//! - [`Deflator`] / [`Inflator`] - the two variants of the streaming
//!   [`ByteTransform`] capability over raw deflate
//! - [`strip_trailer`] - removes the `00 00 FF FF` flush marker a sender
//!   must not transmit
//!
//! # Design
//!
//! The transforms never build a contiguous intermediate buffer: input is
//! fed to the codec chunk by chunk (text in fixed-size chunks, binary
//! payloads segment by segment) and output lands directly in pooled
//! segments via the chain builder.

mod codec;
mod extension;

pub use codec::{ByteTransform, Deflator, Inflator};
pub use extension::{strip_trailer, DeflateConfig, DeflateExtension, EXTENSION_NAME, TRAILER};
