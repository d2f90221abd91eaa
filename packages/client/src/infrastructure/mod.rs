//! Infrastructure layer: wire codec, queue storage and the WebSocket connector.

pub mod dto;
pub mod queue;
pub mod transport;
