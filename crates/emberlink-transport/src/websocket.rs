//! Client-side WebSocket link using `tokio-tungstenite`.

use std::io;

use futures_util::stream::{SplitSink, SplitStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{CloseReason, Dialer, Link, LinkEvent, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Dialer`] that opens WebSocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketDialer;

impl Dialer for WebSocketDialer {
    type Link = WebSocketLink;

    async fn dial(&self, url: &str) -> Result<WebSocketLink, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                let kind = match &e {
                    tungstenite::Error::Url(_) => io::ErrorKind::InvalidInput,
                    _ => io::ErrorKind::ConnectionRefused,
                };
                TransportError::ConnectFailed(io::Error::new(kind, e))
            })?;

        tracing::debug!(url, "WebSocket link established");

        use futures_util::StreamExt;
        let (writer, reader) = ws.split();
        Ok(WebSocketLink {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

/// A single established WebSocket connection.
///
/// The stream is split so a reader blocked in `recv` never holds up a
/// concurrent `send`. The writer mutex serializes frame writes.
pub struct WebSocketLink {
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl Link for WebSocketLink {
    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        self.writer
            .lock()
            .await
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&self) -> Result<LinkEvent, TransportError> {
        use futures_util::StreamExt;
        loop {
            let msg = self.reader.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(LinkEvent::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(LinkEvent::Binary(data.into()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(f) => CloseReason::new(
                            u16::from(f.code),
                            f.reason.as_str(),
                        ),
                        None => CloseReason::normal(),
                    };
                    return Ok(LinkEvent::Closed(reason));
                }
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        io::Error::new(io::ErrorKind::ConnectionReset, e),
                    ));
                }
                None => {
                    return Ok(LinkEvent::Closed(CloseReason::abnormal(
                        "connection dropped",
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        match self.writer.lock().await.close().await {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(TransportError::CloseFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }
}
