//! Codec trait and implementations for converting packet batches
//! to and from wire frames.
//!
//! A frame is the atomic unit of transmission: one textual payload
//! carrying an ordered batch of packets. The codec is a strategy
//! seam; the socket layer only needs something that implements
//! [`FrameCodec`]. [`JsonFrameCodec`] is the default; a binary codec
//! could be added later without touching any other code.

use serde::Deserialize;

use crate::{Packet, ProtocolError};

/// Converts an ordered packet batch to a single wire frame and back.
///
/// Both directions are pure and stateless. Encoding is deterministic:
/// two calls with the same batch produce byte-identical frames, so
/// tests can assert exact wire output. Decoding either yields every
/// packet of the frame, in encode order, or fails as a whole; a
/// partially decoded frame is never returned.
pub trait FrameCodec: Send + Sync + 'static {
    /// Serializes a non-empty batch into one frame.
    ///
    /// # Errors
    /// [`ProtocolError::EmptyFrame`] for an empty batch, or
    /// [`ProtocolError::Encode`] if serialization fails.
    fn encode_frame<P: Packet>(
        &self,
        batch: &[P],
    ) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into its packet batch.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedFrame`] if the payload is not a
    /// packet array, or [`ProtocolError::UnknownPacket`] if any single
    /// entry cannot be resolved to a known variant. Either way the
    /// whole frame is rejected.
    fn decode_frame<P: Packet>(
        &self,
        frame: &str,
    ) -> Result<Vec<P>, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonFrameCodec
// ---------------------------------------------------------------------------

/// Longest payload fragment carried inside a decode error.
#[cfg(feature = "json")]
const FRAGMENT_MAX: usize = 256;

/// A [`FrameCodec`] that encodes a batch as a JSON array of
/// discriminated packet objects (via `serde_json`).
///
/// Each array element is one packet; the application's serde tag field
/// is the discriminator that selects the concrete variant during
/// decode. This is behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrameCodec;

#[cfg(feature = "json")]
impl FrameCodec for JsonFrameCodec {
    fn encode_frame<P: Packet>(
        &self,
        batch: &[P],
    ) -> Result<String, ProtocolError> {
        if batch.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        serde_json::to_string(batch).map_err(ProtocolError::Encode)
    }

    fn decode_frame<P: Packet>(
        &self,
        frame: &str,
    ) -> Result<Vec<P>, ProtocolError> {
        // Parse the array shape first so that a frame-level failure is
        // distinguishable from a single unresolvable entry.
        let entries: Vec<serde_json::Value> = serde_json::from_str(frame)
            .map_err(|e| ProtocolError::MalformedFrame {
                source: e,
                fragment: clip(frame),
            })?;

        let mut packets = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            // Deserializing from `&Value` leaves the entry available
            // for the error fragment.
            let packet = P::deserialize(entry).map_err(|e| {
                ProtocolError::UnknownPacket {
                    source: e,
                    index,
                    fragment: clip(&entry.to_string()),
                }
            })?;
            packets.push(packet);
        }
        Ok(packets)
    }
}

/// Truncates a payload to [`FRAGMENT_MAX`] bytes on a char boundary.
#[cfg(feature = "json")]
fn clip(payload: &str) -> String {
    let mut end = FRAGMENT_MAX.min(payload.len());
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    if end == payload.len() {
        payload.to_owned()
    } else {
        format!("{}...", &payload[..end])
    }
}

// =========================================================================
// Tests
// =========================================================================
