//! Live transport over WebSocket.
//!
//! `open` performs the handshake and then splits the socket: a writer task
//! drains queued frames, a reader task turns incoming frames into
//! [`LiveEvent`]s. The reader always finishes with exactly one
//! [`LiveEvent::Closed`].

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::{ChannelSink, LiveEvent, LiveEventSender, LiveSink, LiveTransport, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LiveTransport for WebSocketTransport {
    async fn open(
        &self,
        endpoint: &str,
        generation: u64,
        events: LiveEventSender,
    ) -> Result<Box<dyn LiveSink>, TransportError> {
        let (socket, _) = connect_async(endpoint)
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        let (mut write, mut read) = socket.split();
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if let Err(err) = write.send(Message::text(frame)).await {
                    debug!(generation, error = %err, "live write failed");
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            while let Some(next) = read.next().await {
                match next {
                    Ok(Message::Text(text)) => {
                        let event = LiveEvent::Message(text.as_str().to_string());
                        let _ = events.send((event, generation));
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = events.send((LiveEvent::Error(err.to_string()), generation));
                        break;
                    }
                }
            }
            let _ = events.send((LiveEvent::Closed, generation));
        });

        Ok(Box::new(ChannelSink::new(frame_tx)))
    }
}
