//! Transport seam: how the session layer obtains a live connection.
//!
//! A [`Link`] is a pair of channels bridged to the real socket by the
//! connector. Frames are JSON text. The inbound side yields `None` once the
//! connection is terminated for any reason (peer close or transport error).

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::TransportError;
use super::value_object::{Credential, RoomId};

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base server URL, e.g. `ws://127.0.0.1:8080`
    pub server_url: String,
    pub room: RoomId,
    pub credential: Option<Credential>,
}

impl Endpoint {
    /// The room-scoped WebSocket URL: `{server_url}/rooms/{room}/ws`
    pub fn url(&self) -> String {
        format!(
            "{}/rooms/{}/ws",
            self.server_url.trim_end_matches('/'),
            self.room.as_str()
        )
    }
}

/// One live connection, as seen by the session driver
#[derive(Debug)]
pub struct Link {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl Link {
    pub fn new(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Hand a frame to the writer side
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::LinkClosed)
    }

    /// Next inbound frame, or `None` once the connection has terminated
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Close the link without reporting the close to anyone.
    ///
    /// Dropping the outbound sender makes the writer close the socket.
    pub fn close(mut self) {
        self.inbound.close();
    }
}

/// Opens connections for endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake and return a live link
    async fn connect(&self, endpoint: &Endpoint) -> Result<Link, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_is_room_scoped() {
        // テスト項目: 接続先 URL はルームごとに決まる
        // given (前提条件):
        let endpoint = Endpoint {
            server_url: "ws://127.0.0.1:8080/".to_string(),
            room: RoomId::new("general").unwrap(),
            credential: None,
        };

        // when (操作):
        let url = endpoint.url();

        // then (期待する結果):
        assert_eq!(url, "ws://127.0.0.1:8080/rooms/general/ws");
    }

    #[tokio::test]
    async fn test_link_send_fails_after_peer_dropped() {
        // テスト項目: 書き込み側が終了した Link への送信は LinkClosed になる
        // given (前提条件):
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel();
        let link = Link::new(out_tx, in_rx);

        // when (操作):
        drop(out_rx);
        let result = link.send("{}".to_string());

        // then (期待する結果):
        assert!(matches!(result, Err(TransportError::LinkClosed)));
    }

    #[tokio::test]
    async fn test_link_recv_ends_when_connection_terminates() {
        // テスト項目: 受信側が閉じると recv は None を返す
        // given (前提条件):
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let mut link = Link::new(out_tx, in_rx);
        in_tx.send("frame".to_string()).unwrap();

        // when (操作):
        drop(in_tx);

        // then (期待する結果):
        assert_eq!(link.recv().await.as_deref(), Some("frame"));
        assert_eq!(link.recv().await, None);
    }
}
