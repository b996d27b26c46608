//! Listener registry: per-category observer fan-out for socket events.
//!
//! Four event categories exist: opened, closed, packet received, and
//! error. Listeners are invoked in registration order within a
//! category. Dispatch snapshots the listener list under the lock and
//! invokes outside it, so a listener may register or remove listeners
//! without deadlocking; listeners added during a dispatch do not see
//! the notification already in flight.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use emberlink_transport::CloseReason;

use crate::EmberlinkError;

/// Counter for generating unique listener IDs.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one listener registration.
///
/// Returned by the `on_*` registration methods; pass it to
/// [`PacketSocket::remove_listener`](crate::PacketSocket::remove_listener)
/// to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// One registered listener: its ID plus the shared callback.
struct Registration<F: ?Sized> {
    id: ListenerId,
    callback: Arc<F>,
}

impl<F: ?Sized> Clone for Registration<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// The four per-category listener lists.
pub(crate) struct Listeners<P> {
    opened: Mutex<Vec<Registration<dyn Fn() + Send + Sync>>>,
    closed: Mutex<Vec<Registration<dyn Fn(&CloseReason) + Send + Sync>>>,
    packet: Mutex<Vec<Registration<dyn Fn(&P) + Send + Sync>>>,
    error: Mutex<Vec<Registration<dyn Fn(&EmberlinkError, &str) + Send + Sync>>>,
}

/// Clones the list under the lock so callbacks run without holding it.
fn snapshot<F: ?Sized>(
    slot: &Mutex<Vec<Registration<F>>>,
) -> Vec<Registration<F>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn insert<F: ?Sized>(
    slot: &Mutex<Vec<Registration<F>>>,
    callback: Arc<F>,
) -> ListenerId {
    let id = ListenerId::next();
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Registration { id, callback });
    id
}

fn evict<F: ?Sized>(
    slot: &Mutex<Vec<Registration<F>>>,
    id: ListenerId,
) -> bool {
    let mut list = slot.lock().unwrap_or_else(PoisonError::into_inner);
    let before = list.len();
    list.retain(|r| r.id != id);
    list.len() != before
}

impl<P> Listeners<P> {
    pub(crate) fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            packet: Mutex::new(Vec::new()),
            error: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_opened(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerId {
        insert(&self.opened, Arc::new(listener))
    }

    pub(crate) fn add_closed(
        &self,
        listener: impl Fn(&CloseReason) + Send + Sync + 'static,
    ) -> ListenerId {
        insert(&self.closed, Arc::new(listener))
    }

    pub(crate) fn add_packet(
        &self,
        listener: impl Fn(&P) + Send + Sync + 'static,
    ) -> ListenerId {
        insert(&self.packet, Arc::new(listener))
    }

    pub(crate) fn add_error(
        &self,
        listener: impl Fn(&EmberlinkError, &str) + Send + Sync + 'static,
    ) -> ListenerId {
        insert(&self.error, Arc::new(listener))
    }

    /// Removes one registration from whichever category holds it.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        evict(&self.opened, id)
            || evict(&self.closed, id)
            || evict(&self.packet, id)
            || evict(&self.error, id)
    }

    pub(crate) fn emit_opened(&self) {
        for r in snapshot(&self.opened) {
            (r.callback)();
        }
    }

    pub(crate) fn emit_closed(&self, reason: &CloseReason) {
        for r in snapshot(&self.closed) {
            (r.callback)(reason);
        }
    }

    pub(crate) fn emit_packet(&self, packet: &P) {
        for r in snapshot(&self.packet) {
            (r.callback)(packet);
        }
    }

    pub(crate) fn emit_error(&self, error: &EmberlinkError, context: &str) {
        for r in snapshot(&self.error) {
            (r.callback)(error, context);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use emberlink_transport::TransportError;

    use super::*;

    #[test]
    fn test_listener_id_display() {
        let id = ListenerId(7);
        assert_eq!(id.to_string(), "listener-7");
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let listeners: Listeners<String> = Listeners::new();
        let a = listeners.add_opened(|| {});
        let b = listeners.add_opened(|| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_emit_invokes_in_registration_order() {
        let listeners: Listeners<String> = Listeners::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            listeners.add_opened(move || {
                order.lock().unwrap().push(tag);
            });
        }

        listeners.emit_opened();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_packet_passes_payload() {
        let listeners: Listeners<String> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_listener = Arc::clone(&seen);
        listeners.add_packet(move |p: &String| {
            seen_by_listener.lock().unwrap().push(p.clone());
        });

        listeners.emit_packet(&"hello".to_string());
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_emit_error_passes_context() {
        let listeners: Listeners<String> = Listeners::new();
        let contexts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&contexts);
        listeners.add_error(move |_e, ctx| {
            sink.lock().unwrap().push(ctx.to_string());
        });

        let err = EmberlinkError::from(TransportError::NotConnected);
        listeners.emit_error(&err, "send failed");
        assert_eq!(*contexts.lock().unwrap(), vec!["send failed".to_string()]);
    }

    #[test]
    fn test_remove_stops_delivery() {
        let listeners: Listeners<String> = Listeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let id = listeners.add_opened(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit_opened();
        assert!(listeners.remove(id));
        listeners.emit_opened();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_unknown_id_returns_false() {
        let listeners: Listeners<String> = Listeners::new();
        assert!(!listeners.remove(ListenerId(u64::MAX)));
    }

    #[test]
    fn test_registering_during_dispatch_does_not_deadlock() {
        // A listener that adds another listener while a dispatch is in
        // flight. The snapshot strategy releases the lock before
        // invoking callbacks, so this must neither deadlock nor invoke
        // the newly added listener for the in-flight notification.
        let listeners: Arc<Listeners<String>> = Arc::new(Listeners::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let registry = Arc::clone(&listeners);
        let late = Arc::clone(&late_calls);
        listeners.add_opened(move || {
            let late = Arc::clone(&late);
            registry.add_opened(move || {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        listeners.emit_opened();
        assert_eq!(
            late_calls.load(Ordering::SeqCst),
            0,
            "listener added mid-dispatch must not see the in-flight event"
        );

        listeners.emit_opened();
        assert!(late_calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_categories_are_independent() {
        let listeners: Listeners<String> = Listeners::new();
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&opened);
        listeners.add_opened(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&closed);
        listeners.add_closed(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit_opened();
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}
