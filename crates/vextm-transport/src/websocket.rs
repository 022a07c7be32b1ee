//! WebSocket transport implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest, http::header::AUTHORIZATION, protocol::Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// WebSocket transport connector
pub struct WebSocketTransport;

/// WebSocket sender half
pub struct WebSocketSender {
    tx: mpsc::Sender<WsMessage>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for WebSocketSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(WsMessage::Binary(data.to_vec()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        let _ = self.tx.send(WsMessage::Close(None)).await;
        *self.connected.lock() = false;
        Ok(())
    }
}

/// WebSocket receiver half
pub struct WebSocketReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

impl WebSocketTransport {
    /// Open a WebSocket to `url` with a bearer token attached as the
    /// authorization credential.
    pub async fn connect(
        url: &Url,
        bearer_token: &str,
    ) -> Result<(WebSocketSender, WebSocketReceiver)> {
        info!("connecting to {}", url);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        request.headers_mut().insert(
            AUTHORIZATION,
            format!("Bearer {bearer_token}")
                .parse()
                .map_err(|_| TransportError::InvalidUrl("malformed bearer token".into()))?,
        );

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        debug!("websocket connected, response: {:?}", response.status());

        let (write, read) = ws_stream.split();

        let (send_tx, mut send_rx) = mpsc::channel::<WsMessage>(100);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(100);

        let connected = Arc::new(Mutex::new(true));
        let connected_write = connected.clone();
        let connected_read = connected.clone();

        // Writer task
        tokio::spawn(async move {
            let mut write = write;
            while let Some(msg) = send_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    error!("websocket write error: {}", e);
                    break;
                }
            }
            *connected_write.lock() = false;
        });

        // Reader task
        tokio::spawn(async move {
            let mut read = read;

            let _ = event_tx.send(TransportEvent::Connected).await;

            while let Some(result) = read.next().await {
                match result {
                    Ok(msg) => match msg {
                        WsMessage::Binary(data) => {
                            let _ = event_tx.send(TransportEvent::Data(Bytes::from(data))).await;
                        }
                        WsMessage::Text(text) => {
                            // TM only speaks binary; pass through just in case
                            warn!("received text frame, forwarding as bytes");
                            let _ = event_tx.send(TransportEvent::Data(Bytes::from(text))).await;
                        }
                        WsMessage::Ping(_) | WsMessage::Pong(_) => {
                            // Pong is handled by tungstenite
                        }
                        WsMessage::Close(frame) => {
                            let reason = frame.map(|f| f.reason.to_string());
                            info!("websocket closed: {:?}", reason);
                            let _ = event_tx
                                .send(TransportEvent::Disconnected { reason })
                                .await;
                            break;
                        }
                        WsMessage::Frame(_) => {}
                    },
                    Err(e) => {
                        error!("websocket read error: {}", e);
                        let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                        let _ = event_tx
                            .send(TransportEvent::Disconnected {
                                reason: Some(e.to_string()),
                            })
                            .await;
                        break;
                    }
                }
            }

            *connected_read.lock() = false;
        });

        let sender = WebSocketSender {
            tx: send_tx,
            connected,
        };

        let receiver = WebSocketReceiver { rx: event_rx };

        Ok((sender, receiver))
    }
}
