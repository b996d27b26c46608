//! The [`Packet`] bound: what a type must provide to travel in a frame.

use serde::{de::DeserializeOwned, Serialize};

/// An application-level unit of data that can be carried in a frame.
///
/// The protocol layer owns no packet schemas. Applications define one
/// internally tagged serde enum and the tag field acts as the
/// discriminator that selects the concrete variant during decode:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(tag = "cmd")]
/// enum MyPacket {
///     Connect { slot: String },
///     Say { text: String },
/// }
/// ```
///
/// `DeserializeOwned` (rather than plain `Deserialize`) lets decoded
/// packets outlive the inbound frame buffer. `Send + Sync + 'static`
/// allow packets to be decoded on the reader task and handed to
/// listeners registered from any thread.
pub trait Packet: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Packet for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}
