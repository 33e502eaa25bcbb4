//! Protocol module - frame and message types shared with the transport.
//!
//! Only the surface the compression transform touches lives here: the
//! header flag nibble and the payload sequence. Header parsing and frame
//! assembly belong to the transport.

mod frame;

pub use frame::{flags, Frame, Message, MessageData};
