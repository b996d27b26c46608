//! # Emberlink
//!
//! Client-side transport layer for bidirectional, message-oriented
//! protocols over a persistent WebSocket connection.
//!
//! Emberlink manages the connection lifecycle, batches outgoing
//! packets into ordered wire frames, decodes incoming frames back
//! into typed packets, and fans them out to registered listeners,
//! isolating transport failures from application logic. Packet
//! schemas belong to the application: define one internally tagged
//! serde enum and hand it to [`PacketSocket`] as its type parameter.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emberlink::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(tag = "cmd")]
//! enum MyPacket {
//!     Hello { slot: String },
//!     Say { text: String },
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EmberlinkError> {
//!     let socket: PacketSocket<MyPacket> =
//!         PacketSocket::new("ws://localhost:38281");
//!
//!     socket.on_packet(|packet| println!("received: {packet:?}"));
//!     socket.on_closed(|reason| println!("closed: {reason}"));
//!
//!     socket.connect().await?;
//!     socket
//!         .send(&[MyPacket::Hello { slot: "Player1".into() }])
//!         .await?;
//!     socket.disconnect().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod socket;

pub use config::SocketConfig;
pub use error::EmberlinkError;
pub use events::ListenerId;
pub use socket::{PacketSocket, SocketPhase};

// Re-export the layer types consumers touch directly.
pub use emberlink_protocol::{
    FrameCodec, JsonFrameCodec, Packet, ProtocolError,
};
pub use emberlink_transport::{
    CloseReason, Dialer, Link, LinkEvent, TransportError,
};

/// The one-stop import for typical consumers.
pub mod prelude {
    pub use crate::{
        CloseReason, EmberlinkError, ListenerId, Packet, PacketSocket,
        SocketConfig, SocketPhase,
    };
}
