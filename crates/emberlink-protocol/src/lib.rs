//! Wire protocol for Emberlink.
//!
//! This crate defines how application packets travel on the wire:
//!
//! - **Packet** ([`Packet`]) — the bound a type must satisfy to be sent
//!   or received. Concrete packet schemas live in the application, not
//!   here; the protocol layer never names an individual packet shape.
//! - **Codec** ([`FrameCodec`] trait, [`JsonFrameCodec`]) — how an
//!   ordered batch of packets becomes a single wire frame and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! client socket (lifecycle and dispatch). It is pure and stateless;
//! it knows nothing about connections or listeners.
//!
//! ```text
//! Transport (text frame) → Protocol (Vec<P>) → Socket (dispatch)
//! ```

mod codec;
mod error;
mod packet;

pub use codec::FrameCodec;
#[cfg(feature = "json")]
pub use codec::JsonFrameCodec;
pub use error::ProtocolError;
pub use packet::Packet;
