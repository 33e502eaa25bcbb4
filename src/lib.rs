//! # permessage-deflate
//!
//! Wire-level transform for the WebSocket per-message compression extension
//! (RFC 7692, `permessage-deflate`): compresses outbound message payloads,
//! decompresses inbound ones, and manages the deflate trailing-block
//! convention the protocol requires endpoints to strip on send and restore
//! on receive.
//!
//! ## Architecture
//!
//! - **Transform** ([`DeflateExtension`]): sets/reads the RSV1 frame bit,
//!   splices the `00 00 FF FF` flush marker out of and back into the
//!   compressed stream, streams payloads through raw deflate
//! - **Memory model** ([`buffer`]): payloads are chains of fixed-capacity
//!   buffers rented from a shared pool and reclaimed on drop - no single
//!   large allocation, no copying between segments
//! - **Boundary types** ([`protocol`]): the frame/message surface shared
//!   with the transport's parser and writer
//!
//! Handshake negotiation, frame parsing and backpressure are the
//! surrounding transport's responsibility; this crate only transforms
//! payloads and flags in place.
//!
//! ## Example
//!
//! ```
//! use permessage_deflate::{BufferPool, DeflateExtension, Frame, Message, SegmentChain};
//!
//! let pool = BufferPool::new();
//! let mut ext = DeflateExtension::new(pool.clone());
//!
//! // Outbound: compress and mark.
//! let mut message = Message::text("hello compression");
//! ext.encode(&mut message).unwrap();
//! assert!(message.rsv1());
//!
//! // Inbound: restore and decompress.
//! let payload = message.payload().unwrap().to_vec();
//! let mut frame = Frame::new(message.flags(), SegmentChain::from_slice(&pool, &payload).unwrap());
//! ext.decode(&mut frame).unwrap();
//! assert_eq!(frame.payload().to_text().unwrap(), "hello compression");
//! ```

pub mod buffer;
pub mod deflate;
pub mod error;
pub mod protocol;

pub use buffer::{BufferPool, ChainBuilder, SegmentChain};
pub use deflate::{DeflateConfig, DeflateExtension, EXTENSION_NAME, TRAILER};
pub use error::{DeflateError, Result};
pub use protocol::{Frame, Message, MessageData};
