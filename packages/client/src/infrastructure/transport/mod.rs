//! Connector implementations.
//!
//! - `websocket`: `tokio-tungstenite` client

pub mod websocket;

pub use websocket::WebSocketConnector;
