//! Transport abstraction layer for Emberlink.
//!
//! Provides the [`Dialer`] and [`Link`] traits that abstract over the
//! underlying full-duplex connection, so the socket layer can run
//! against a real WebSocket or an in-memory test double.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket link via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketDialer, WebSocketLink};

use std::fmt;
use std::future::Future;

/// Why a link closed: a close code plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket-style close code.
    pub code: u16,
    /// Free-form explanation; may be empty.
    pub reason: String,
}

impl CloseReason {
    /// Close code for a normal, deliberate closure.
    pub const NORMAL: u16 = 1000;
    /// Close code for a link that ended without a close handshake.
    pub const ABNORMAL: u16 = 1006;

    /// Creates a reason from a raw code and text.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self { code, reason: reason.into() }
    }

    /// A normal closure with no further explanation.
    pub fn normal() -> Self {
        Self::new(Self::NORMAL, "")
    }

    /// An abnormal closure (no close handshake took place).
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(Self::ABNORMAL, reason)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code {}", self.code)
        } else {
            write!(f, "code {}: {}", self.code, self.reason)
        }
    }
}

/// One raw inbound event from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A complete inbound text frame.
    Text(String),
    /// A complete inbound binary frame. The packet layer ignores
    /// these; only text frames carry packets.
    Binary(Vec<u8>),
    /// The link closed: remote close frame, close-handshake reply, or
    /// abnormal end of stream.
    Closed(CloseReason),
}

/// Establishes one outbound connection to a remote endpoint.
///
/// The future bounds are spelled out (rather than `async fn`) so that
/// callers can drive a dial from a spawned task.
pub trait Dialer: Send + Sync + 'static {
    /// The link type produced by this dialer.
    type Link: Link;

    /// Connects to the given URL and performs the handshake.
    fn dial(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Link, TransportError>> + Send;
}

/// A single established full-duplex connection.
///
/// `send` and `recv` take `&self`: implementations serialize writes
/// internally so two frames' bytes never interleave, and reads are
/// expected to come from a single reader task.
pub trait Link: Send + Sync + 'static {
    /// Sends one complete text frame to the remote peer.
    fn send(
        &self,
        frame: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next raw event from the remote peer.
    ///
    /// After [`LinkEvent::Closed`] has been returned, the link is
    /// spent and `recv` must not be called again.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<LinkEvent, TransportError>> + Send;

    /// Initiates the close handshake.
    fn close(
        &self,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
