//! WebSocket connector.
//!
//! ## 責務
//!
//! - ルーム単位の URL への接続（認証情報は `Cookie` ヘッダで渡す）
//! - ソケットを read / write に分割し、それぞれをタスクで `Link` のチャネルにつなぐ
//!
//! 読み込み側のタスクは切断（Close フレーム、エラー、ストリーム終端）で終了し、
//! `Link` の受信チャネルが閉じることでセッション側に切断が伝わります。
//! 書き込み側のタスクは `Link` が破棄されると Close フレームを送って終了します。

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{HeaderValue, header::COOKIE},
        protocol::Message,
    },
};

use crate::domain::{Connector, Endpoint, Link, TransportError};

/// Connector backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Link, TransportError> {
        let url = endpoint.url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
        if let Some(credential) = &endpoint.credential {
            let value = HeaderValue::from_str(credential.expose())
                .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!(
            "WebSocket handshake with {} completed ({})",
            url,
            response.status()
        );

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        // Writer: frames from the session to the socket
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    tracing::warn!("WebSocket write error: {}", e);
                    return;
                }
            }
            // Link dropped: close our side
            let _ = write.send(Message::Close(None)).await;
            let _ = write.close().await;
        });

        // Reader: frames from the socket to the session
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text.as_str().to_owned()).is_err() {
                            // Session detached this link
                            break;
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::debug!("Ignoring {} bytes of binary data", data.len());
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Link::new(outbound_tx, inbound_rx))
    }
}
