//! Integration tests for the WebSocket link.
//!
//! Each test spins up a real loopback WebSocket server with
//! `tokio-tungstenite` and drives the client side through the
//! [`Dialer`]/[`Link`] traits, verifying that frames and close
//! signals actually flow over the network.

#![cfg(feature = "websocket")]

use emberlink_transport::{
    CloseReason, Dialer, Link, LinkEvent, TransportError, WebSocketDialer,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Binds a loopback listener and returns its `ws://` URL plus the
/// listener for the test's server side to accept on.
async fn bind_server() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind loopback listener");
    let addr = listener.local_addr().expect("listener has a local addr");
    (format!("ws://{addr}"), listener)
}

/// Accepts one TCP connection and upgrades it to a WebSocket.
async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("should upgrade to WebSocket")
}

#[tokio::test]
async fn test_dial_and_text_round_trip() {
    let (url, listener) = bind_server().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;

        // Client sends first; echo a reply.
        let msg = ws.next().await.unwrap().unwrap();
        assert_eq!(msg, Message::Text("ping-frame".into()));
        ws.send(Message::Text("pong-frame".into())).await.unwrap();
    });

    let link = WebSocketDialer.dial(&url).await.expect("dial should succeed");
    link.send("ping-frame").await.expect("send should succeed");

    let event = link.recv().await.expect("recv should succeed");
    assert_eq!(event, LinkEvent::Text("pong-frame".into()));

    server.await.unwrap();
}

#[tokio::test]
async fn test_recv_distinguishes_binary_from_text() {
    let (url, listener) = bind_server().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Binary(b"raw bytes".to_vec().into()))
            .await
            .unwrap();
        ws.send(Message::Text("a text frame".into())).await.unwrap();
    });

    let link = WebSocketDialer.dial(&url).await.expect("dial should succeed");

    let first = link.recv().await.unwrap();
    assert_eq!(first, LinkEvent::Binary(b"raw bytes".to_vec()));

    let second = link.recv().await.unwrap();
    assert_eq!(second, LinkEvent::Text("a text frame".into()));

    server.await.unwrap();
}

#[tokio::test]
async fn test_recv_maps_remote_close_frame() {
    let (url, listener) = bind_server().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "moving on".into(),
        })))
        .await
        .unwrap();
    });

    let link = WebSocketDialer.dial(&url).await.expect("dial should succeed");

    let event = link.recv().await.expect("recv should succeed");
    assert_eq!(
        event,
        LinkEvent::Closed(CloseReason::new(1001, "moving on"))
    );

    server.await.unwrap();
}

#[tokio::test]
async fn test_close_performs_close_handshake() {
    let (url, listener) = bind_server().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        // The client's close() should surface here as a close frame.
        let msg = ws.next().await.unwrap().unwrap();
        assert!(matches!(msg, Message::Close(_)), "expected close, got {msg:?}");
    });

    let link = WebSocketDialer.dial(&url).await.expect("dial should succeed");
    link.close().await.expect("close should succeed");

    server.await.unwrap();
}

#[tokio::test]
async fn test_dial_unreachable_endpoint_fails() {
    // Bind to get a free port, then drop the listener so nothing is
    // listening there.
    let (url, listener) = bind_server().await;
    drop(listener);

    let result = WebSocketDialer.dial(&url).await;
    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
}

#[tokio::test]
async fn test_dial_malformed_url_fails() {
    let result = WebSocketDialer.dial("not a url at all").await;
    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
}
