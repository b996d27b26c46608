//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
///
/// Decode-side variants carry the offending payload fragment so that a
/// listener on the error channel can see *what* was rejected without
/// the socket ever dispatching a partial frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound batch failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The inbound payload is not a well-formed packet array.
    #[cfg(feature = "json")]
    #[error("frame is not a packet array: {source}")]
    MalformedFrame {
        #[source]
        source: serde_json::Error,
        /// The rejected payload, truncated for logging.
        fragment: String,
    },

    /// One entry in the frame could not be resolved to a known packet
    /// variant. The whole frame is rejected, with no partial results.
    #[cfg(feature = "json")]
    #[error("frame entry {index} did not match any known packet: {source}")]
    UnknownPacket {
        #[source]
        source: serde_json::Error,
        /// Position of the entry within the frame.
        index: usize,
        /// The offending entry, truncated for logging.
        fragment: String,
    },

    /// A frame must carry at least one packet.
    #[error("a frame must contain at least one packet")]
    EmptyFrame,
}
