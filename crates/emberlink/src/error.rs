//! Unified error type for the Emberlink client.

use emberlink_protocol::ProtocolError;
use emberlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `emberlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From`
/// impls, so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum EmberlinkError {
    /// A transport-level error (connect, send, receive, close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, empty frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connect was attempted while the socket already has a live or
    /// in-progress link. Disconnect first, then connect again.
    #[error("connect attempted while the socket is active")]
    AlreadyConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::NotConnected;
        let top: EmberlinkError = err.into();
        assert!(matches!(top, EmberlinkError::Transport(_)));
        assert!(top.to_string().contains("not connected"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::EmptyFrame;
        let top: EmberlinkError = err.into();
        assert!(matches!(top, EmberlinkError::Protocol(_)));
    }

    #[test]
    fn test_already_connected_message() {
        let err = EmberlinkError::AlreadyConnected;
        assert!(err.to_string().contains("active"));
    }
}
