//! Minimal Emberlink client: connects to a server, sends a greeting
//! batch, and logs everything the server pushes back.
//!
//! Run against any endpoint speaking JSON packet frames:
//!
//! ```text
//! cargo run -p echo-client -- ws://127.0.0.1:38281
//! ```

use emberlink::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd")]
enum EchoPacket {
    Hello { slot: String },
    Say { text: String },
}

#[tokio::main]
async fn main() -> Result<(), EmberlinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:38281".to_string());

    let socket: PacketSocket<EchoPacket> = PacketSocket::new(url);

    socket.on_opened(|| tracing::info!("link is up"));
    socket.on_packet(|packet: &EchoPacket| {
        tracing::info!(?packet, "received");
    });
    socket.on_error(|error, context| {
        tracing::warn!(%error, context, "socket error");
    });
    socket.on_closed(|reason: &CloseReason| {
        tracing::info!(%reason, "link closed");
    });

    socket.connect().await?;
    socket
        .send(&[
            EchoPacket::Hello { slot: "demo".into() },
            EchoPacket::Say { text: "hello from emberlink".into() },
        ])
        .await?;

    // Let the server talk for a bit before hanging up.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    socket.disconnect().await?;
    Ok(())
}
