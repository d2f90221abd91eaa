//! Data Transfer Objects for the chat protocol.
//!
//! - `websocket`: the JSON frame exchanged over the room connection
//! - `conversion`: frame ↔ domain conversions and validation

pub mod conversion;
pub mod websocket;

pub use conversion::{DecodeError, FrameError, decode_inbound};
pub use websocket::{EventKind, WireFrame};
