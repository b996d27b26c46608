//! The client socket: lifecycle state machine, send pipeline, and
//! inbound packet dispatch.
//!
//! [`PacketSocket`] ties the layers together. Outbound, it batches
//! packets through the frame codec and writes exactly one frame per
//! call. Inbound, a reader task decodes each text frame and fans the
//! packets out, in order, to the registered listeners. Transport
//! failures on the receive path never surface as errors on an
//! unrelated call stack; they go to the error listeners.
//!
//! ```text
//! caller → send pipeline → codec → link → network
//! network → link → reader task → codec → listeners → consumer
//! ```

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use emberlink_protocol::{FrameCodec, JsonFrameCodec, Packet};
use emberlink_transport::{
    CloseReason, Dialer, Link, LinkEvent, TransportError, WebSocketDialer,
};
use tokio::sync::Mutex as AsyncMutex;

use crate::events::Listeners;
use crate::{EmberlinkError, ListenerId, SocketConfig};

/// Lifecycle phase of the underlying link.
///
/// ```text
/// Idle → Connecting → Open → Closing → Closed
/// ```
///
/// Any phase can jump straight to Closed on an unrecoverable transport
/// failure. Closed is terminal for one link instance; a later connect
/// starts a fresh epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPhase {
    /// No link yet; the socket was just created.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The link is established and usable.
    Open,
    /// A close handshake is in progress.
    Closing,
    /// The link is gone. Connect again to start a new epoch.
    Closed,
}

/// Phase plus the epoch it belongs to. Epochs number the successive
/// link instances of one socket, so a reader task left over from a
/// previous link can never transition the current one.
struct Lifecycle {
    phase: SocketPhase,
    epoch: u64,
}

/// State shared between the socket handle, its clones, and the reader
/// task of the current epoch.
struct Shared<P: Packet, D: Dialer, C: FrameCodec> {
    url: String,
    config: SocketConfig,
    dialer: D,
    codec: C,
    lifecycle: Mutex<Lifecycle>,
    link: AsyncMutex<Option<Arc<D::Link>>>,
    listeners: Listeners<P>,
}

impl<P: Packet, D: Dialer, C: FrameCodec> Shared<P, D, C> {
    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while `epoch` is the current epoch and its link is up.
    fn epoch_is_live(&self, epoch: u64) -> bool {
        let lc = self.lock_lifecycle();
        lc.epoch == epoch
            && matches!(lc.phase, SocketPhase::Open | SocketPhase::Closing)
    }

    /// Rolls a failed connect attempt back to Idle.
    fn abort_connect(&self, epoch: u64) {
        let mut lc = self.lock_lifecycle();
        if lc.epoch == epoch && lc.phase == SocketPhase::Connecting {
            lc.phase = SocketPhase::Idle;
        }
    }

    /// Moves `epoch` to Closed and fires the closed notification.
    ///
    /// Exactly one caller wins per epoch: local disconnect, remote
    /// close, and transport failure all funnel through here, so the
    /// closed notification fires once no matter who initiated the
    /// closure.
    fn finish_epoch(&self, epoch: u64, reason: CloseReason) {
        let completed = {
            let mut lc = self.lock_lifecycle();
            if lc.epoch == epoch
                && matches!(
                    lc.phase,
                    SocketPhase::Open | SocketPhase::Closing
                )
            {
                lc.phase = SocketPhase::Closed;
                true
            } else {
                false
            }
        };
        if completed {
            tracing::info!(%reason, "socket closed");
            self.listeners.emit_closed(&reason);
        }
    }
}

/// A client socket for a message-oriented protocol over one
/// full-duplex link.
///
/// The socket owns the link exclusively; consumers interact only with
/// this handle. Cloning is cheap and every clone drives the same
/// underlying connection. The packet type `P` is supplied by the
/// application (see [`Packet`]); the socket itself never inspects
/// packet contents, only framing, ordering, and delivery.
pub struct PacketSocket<
    P: Packet,
    D: Dialer = WebSocketDialer,
    C: FrameCodec = JsonFrameCodec,
> {
    shared: Arc<Shared<P, D, C>>,
}

impl<P: Packet, D: Dialer, C: FrameCodec> Clone for PacketSocket<P, D, C> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<P: Packet> PacketSocket<P> {
    /// Creates a socket targeting `url`, with the WebSocket dialer and
    /// JSON codec. No connection is made until [`connect`](Self::connect).
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_parts(
            url,
            WebSocketDialer,
            JsonFrameCodec,
            SocketConfig::default(),
        )
    }

    /// Same as [`new`](Self::new) with an explicit configuration.
    pub fn with_config(url: impl Into<String>, config: SocketConfig) -> Self {
        Self::with_parts(url, WebSocketDialer, JsonFrameCodec, config)
    }
}

impl<P: Packet, D: Dialer, C: FrameCodec> PacketSocket<P, D, C> {
    /// Creates a socket from explicit parts. Useful for swapping in a
    /// different codec or an in-memory dialer in tests.
    pub fn with_parts(
        url: impl Into<String>,
        dialer: D,
        codec: C,
        config: SocketConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                config,
                dialer,
                codec,
                lifecycle: Mutex::new(Lifecycle {
                    phase: SocketPhase::Idle,
                    epoch: 0,
                }),
                link: AsyncMutex::new(None),
                listeners: Listeners::new(),
            }),
        }
    }

    /// The URL this socket targets.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SocketPhase {
        self.shared.lock_lifecycle().phase
    }

    /// True while the socket believes the link is up (Open or
    /// Closing). Reflects last-known local state only; no probe is
    /// sent, so this can be stale relative to real network conditions.
    pub fn is_alive(&self) -> bool {
        matches!(self.phase(), SocketPhase::Open | SocketPhase::Closing)
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Establishes the link, awaiting the handshake.
    ///
    /// On success the socket is Open, the reader task for the new
    /// epoch is running, and the opened notification has fired.
    ///
    /// # Errors
    /// [`TransportError::ConnectFailed`] if the URL is malformed, the
    /// endpoint unreachable, the handshake fails, or the configured
    /// connect timeout elapses; [`EmberlinkError::AlreadyConnected`]
    /// if a link is already live or being established. A failed
    /// attempt rolls back to Idle and may be retried.
    pub async fn connect(&self) -> Result<(), EmberlinkError> {
        let epoch = {
            let mut lc = self.shared.lock_lifecycle();
            match lc.phase {
                SocketPhase::Idle | SocketPhase::Closed => {
                    lc.phase = SocketPhase::Connecting;
                    lc.epoch += 1;
                    lc.epoch
                }
                _ => return Err(EmberlinkError::AlreadyConnected),
            }
        };

        let dialed = tokio::time::timeout(
            self.shared.config.connect_timeout,
            self.shared.dialer.dial(&self.shared.url),
        )
        .await;

        let link = match dialed {
            Ok(Ok(link)) => Arc::new(link),
            Ok(Err(e)) => {
                self.shared.abort_connect(epoch);
                return Err(e.into());
            }
            Err(_elapsed) => {
                self.shared.abort_connect(epoch);
                return Err(TransportError::ConnectFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect timed out",
                ))
                .into());
            }
        };

        *self.shared.link.lock().await = Some(Arc::clone(&link));
        self.shared.lock_lifecycle().phase = SocketPhase::Open;

        tracing::info!(url = %self.shared.url, "socket opened");
        self.shared.listeners.emit_opened();

        tokio::spawn(Self::read_loop(
            Arc::clone(&self.shared),
            link,
            epoch,
        ));
        Ok(())
    }

    /// Initiates a connect without waiting for it.
    ///
    /// Success is signaled via the opened notification; failure is
    /// surfaced only on the error channel. Listen on both to observe
    /// the outcome.
    pub fn connect_async(&self) {
        let socket = self.clone();
        tokio::spawn(async move {
            if let Err(e) = socket.connect().await {
                tracing::debug!(error = %e, "async connect failed");
                socket
                    .shared
                    .listeners
                    .emit_error(&e, "async connect failed");
            }
        });
    }

    /// Closes the link. A no-op when the socket is not alive.
    ///
    /// On return the socket is Closed and the closed notification has
    /// fired (exactly once for this epoch, regardless of whether the
    /// local close or a racing remote close completed first).
    pub async fn disconnect(&self) -> Result<(), EmberlinkError> {
        let epoch = {
            let mut lc = self.shared.lock_lifecycle();
            match lc.phase {
                SocketPhase::Open | SocketPhase::Closing => {
                    lc.phase = SocketPhase::Closing;
                    lc.epoch
                }
                _ => return Ok(()),
            }
        };

        let close_result = match self.current_link().await {
            Some(link) => link.close().await,
            None => Ok(()),
        };

        self.shared.finish_epoch(epoch, CloseReason::normal());
        close_result.map_err(EmberlinkError::from)
    }

    /// Initiates a disconnect without waiting for it. Completion is
    /// signaled via the closed notification.
    pub fn disconnect_async(&self) {
        let socket = self.clone();
        tokio::spawn(async move {
            if let Err(e) = socket.disconnect().await {
                tracing::debug!(error = %e, "async disconnect failed");
                socket
                    .shared
                    .listeners
                    .emit_error(&e, "async disconnect failed");
            }
        });
    }

    // -- Send pipeline -----------------------------------------------------

    /// Sends a non-empty batch of packets as one frame.
    ///
    /// The batch order is preserved end-to-end: the peer decodes these
    /// packets contiguously and in this order. Two separate send calls
    /// carry no ordering contract relative to each other beyond what
    /// the transport provides.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`] if the socket is not alive
    /// (nothing is written, and the send is never queued);
    /// [`ProtocolError::EmptyFrame`](emberlink_protocol::ProtocolError::EmptyFrame)
    /// for an empty batch; [`TransportError::SendFailed`] if the write
    /// fails.
    pub async fn send(&self, batch: &[P]) -> Result<(), EmberlinkError> {
        if !self.is_alive() {
            return Err(TransportError::NotConnected.into());
        }
        let frame = self.shared.codec.encode_frame(batch)?;
        let link = self
            .current_link()
            .await
            .ok_or(TransportError::NotConnected)?;
        link.send(&frame).await?;
        tracing::trace!(
            packets = batch.len(),
            bytes = frame.len(),
            "frame sent"
        );
        Ok(())
    }

    /// Sends a single packet as a one-element frame.
    pub async fn send_one(&self, packet: &P) -> Result<(), EmberlinkError> {
        self.send(std::slice::from_ref(packet)).await
    }

    /// Sends a batch without waiting for the write to finish.
    ///
    /// Liveness and encoding are checked before any async work starts,
    /// so a dead socket or an invalid batch fails synchronously with
    /// nothing written. Otherwise `on_complete` is invoked exactly
    /// once: `true` when the frame was handed to the transport,
    /// `false` on a transport-level failure (which is also reported on
    /// the error channel). Completion does not mean the peer received
    /// or processed the frame.
    pub fn send_async(
        &self,
        batch: &[P],
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), EmberlinkError> {
        if !self.is_alive() {
            return Err(TransportError::NotConnected.into());
        }
        let frame = self.shared.codec.encode_frame(batch)?;

        let socket = self.clone();
        tokio::spawn(async move {
            let delivered = match socket.current_link().await {
                Some(link) => match link.send(&frame).await {
                    Ok(()) => true,
                    Err(e) => {
                        let error = EmberlinkError::from(e);
                        socket
                            .shared
                            .listeners
                            .emit_error(&error, "async send failed");
                        false
                    }
                },
                None => {
                    let error =
                        EmberlinkError::from(TransportError::NotConnected);
                    socket
                        .shared
                        .listeners
                        .emit_error(&error, "async send failed");
                    false
                }
            };
            on_complete(delivered);
        });
        Ok(())
    }

    // -- Listener registration ---------------------------------------------

    /// Registers a listener for the opened notification.
    pub fn on_opened(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.listeners.add_opened(listener)
    }

    /// Registers a listener for the closed notification.
    pub fn on_closed(
        &self,
        listener: impl Fn(&CloseReason) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.listeners.add_closed(listener)
    }

    /// Registers a listener for received packets.
    ///
    /// Packets are dispatched individually and in frame order, from
    /// the reader task. With no listeners registered, decoded packets
    /// are discarded, not buffered.
    pub fn on_packet(
        &self,
        listener: impl Fn(&P) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.listeners.add_packet(listener)
    }

    /// Registers a listener for transport and decode errors that
    /// cannot be raised on a caller's stack (receive path, async
    /// completions).
    pub fn on_error(
        &self,
        listener: impl Fn(&EmberlinkError, &str) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.listeners.add_error(listener)
    }

    /// Unsubscribes a listener. Returns `false` if the ID is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    // -- Receive pipeline --------------------------------------------------

    async fn current_link(&self) -> Option<Arc<D::Link>> {
        self.shared.link.lock().await.clone()
    }

    /// Runs for the lifetime of one epoch's link: decodes each inbound
    /// text frame and dispatches its packets in order, synchronously,
    /// before the next event is processed.
    async fn read_loop(
        shared: Arc<Shared<P, D, C>>,
        link: Arc<D::Link>,
        epoch: u64,
    ) {
        loop {
            match link.recv().await {
                Ok(LinkEvent::Text(frame)) => {
                    if !shared.epoch_is_live(epoch) {
                        break;
                    }
                    match shared.codec.decode_frame::<P>(&frame) {
                        Ok(batch) => {
                            tracing::trace!(
                                packets = batch.len(),
                                "inbound frame dispatched"
                            );
                            for packet in &batch {
                                shared.listeners.emit_packet(packet);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(
                                error = %e,
                                "inbound frame rejected"
                            );
                            let error = EmberlinkError::from(e);
                            shared.listeners.emit_error(
                                &error,
                                "failed to decode inbound frame",
                            );
                        }
                    }
                }
                Ok(LinkEvent::Binary(_)) => {
                    // Only text frames carry packets.
                    tracing::trace!("ignoring binary frame");
                }
                Ok(LinkEvent::Closed(reason)) => {
                    shared.finish_epoch(epoch, reason);
                    break;
                }
                Err(e) => {
                    let error = EmberlinkError::from(e);
                    shared.listeners.emit_error(
                        &error,
                        "transport failure while receiving",
                    );
                    shared.finish_epoch(
                        epoch,
                        CloseReason::abnormal("transport failure"),
                    );
                    break;
                }
            }
        }
    }
}
