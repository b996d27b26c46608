/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the connection failed: malformed URL, unreachable
    /// endpoint, or a failed handshake. Fatal for this attempt only;
    /// the caller may dial again.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// A send was attempted while the socket is not alive.
    #[error("socket is not connected")]
    NotConnected,

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving from the link failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Closing the link failed.
    #[error("close failed: {0}")]
    CloseFailed(#[source] std::io::Error),
}
