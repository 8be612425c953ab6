//! Typed publish/subscribe registry.
//!
//! Decouples frame arrival on the channels from the consumers of the events.
//! Handlers are plain synchronous callbacks; a handler is identified by its
//! `Arc`, so the same handle must be passed to [`EventBus::off`].

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

use super::events::{Event, EventKind};

/// Event handler handle.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Clone)]
struct Registration {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<EventKind, Vec<Registration>>>,
}

/// Event bus shared by the channels and their consumers.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self
            .registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<EventKind, usize> =
            handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    /// Creates an empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a closure into a handler handle.
    pub fn handler<F>(f: F) -> Handler
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    /// Registers `handler` for `kind`. Handlers run in registration order.
    ///
    /// Registering the same handle twice makes it run twice per emission.
    pub fn on(&self, kind: EventKind, handler: &Handler) {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self
            .registry
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        handlers.entry(kind).or_default().push(Registration {
            id,
            handler: Arc::clone(handler),
        });
    }

    /// Removes every registration of `handler` for `kind`.
    ///
    /// Returns the number of registrations removed.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> usize {
        let mut handlers = self
            .registry
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = handlers.get_mut(&kind) else {
            return 0;
        };

        let before = registrations.len();
        registrations.retain(|r| !Arc::ptr_eq(&r.handler, handler));
        let removed = before - registrations.len();

        if registrations.is_empty() {
            handlers.remove(&kind);
        }

        removed
    }

    /// Delivers `event` to every handler registered for its kind.
    ///
    /// A panicking handler is logged and does not stop the others. Handlers
    /// may subscribe, unsubscribe or emit from inside a callback; a handler
    /// removed during dispatch is not invoked afterwards.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        let snapshot: Vec<Registration> = {
            let handlers = self
                .registry
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match handlers.get(&kind) {
                Some(registrations) => registrations.clone(),
                None => return,
            }
        };

        for registration in snapshot {
            if !self.is_registered(kind, registration.id) {
                continue;
            }

            let handler = &registration.handler;
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(event = %kind, "event handler panicked");
            }
        }
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.registry
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn is_registered(&self, kind: EventKind, id: u64) -> bool {
        self.registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .is_some_and(|registrations| registrations.iter().any(|r| r.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::events::Notification;
    use std::sync::Mutex;

    fn note(message: &str) -> Event {
        Event::Notification(Notification::info(message))
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Handler {
        let log = Arc::clone(log);
        EventBus::handler(move |_| {
            if let Ok(mut log) = log.lock() {
                log.push(tag.to_string());
            }
        })
    }

    fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().expect("lock").clone()
    }

    #[test]
    fn test_emit_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.on(EventKind::Notification, &recorder(&log, "first"));
        bus.on(EventKind::Notification, &recorder(&log, "second"));
        bus.on(EventKind::Notification, &recorder(&log, "third"));

        bus.emit(&note("hello"));
        assert_eq!(entries(&log), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let bus = EventBus::new();
        bus.emit(&note("nobody listens"));
        assert_eq!(bus.handler_count(EventKind::Notification), 0);
    }

    #[test]
    fn test_emit_only_reaches_matching_kind() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.on(EventKind::WalletData, &recorder(&log, "wallet"));

        bus.emit(&note("hello"));
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_off_removes_only_that_handler() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");

        bus.on(EventKind::Notification, &a);
        bus.on(EventKind::Notification, &b);
        assert_eq!(bus.off(EventKind::Notification, &a), 1);

        bus.emit(&note("hello"));
        assert_eq!(entries(&log), vec!["b"]);
    }

    #[test]
    fn test_off_is_identity_based_and_duplicate_safe() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let lookalike = recorder(&log, "a");

        bus.on(EventKind::Notification, &a);
        bus.on(EventKind::Notification, &a);
        bus.on(EventKind::Notification, &lookalike);

        assert_eq!(bus.off(EventKind::Notification, &a), 2);
        assert_eq!(bus.off(EventKind::Notification, &a), 0);
        assert_eq!(bus.handler_count(EventKind::Notification), 1);

        bus.emit(&note("hello"));
        assert_eq!(entries(&log), vec!["a"]);
    }

    #[test]
    fn test_off_unknown_kind() {
        let bus = EventBus::new();
        let handler = EventBus::handler(|_| {});
        assert_eq!(bus.off(EventKind::Error, &handler), 0);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.on(EventKind::Notification, &recorder(&log, "before"));
        #[allow(clippy::panic)]
        let bad = EventBus::handler(|_| panic!("handler failure"));
        bus.on(EventKind::Notification, &bad);
        bus.on(EventKind::Notification, &recorder(&log, "after"));

        bus.emit(&note("hello"));
        bus.emit(&note("again"));
        assert_eq!(entries(&log), vec!["before", "after", "before", "after"]);
    }

    #[test]
    fn test_handler_removed_during_dispatch_is_skipped() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = recorder(&log, "victim");

        let remover = {
            let bus = bus.clone();
            let victim = Arc::clone(&victim);
            let log = Arc::clone(&log);
            EventBus::handler(move |_| {
                bus.off(EventKind::Notification, &victim);
                if let Ok(mut log) = log.lock() {
                    log.push("remover".to_string());
                }
            })
        };

        bus.on(EventKind::Notification, &remover);
        bus.on(EventKind::Notification, &victim);

        bus.emit(&note("hello"));
        assert_eq!(entries(&log), vec!["remover"]);
    }

    #[test]
    fn test_handler_can_unsubscribe_itself() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));
        let slot: Arc<Mutex<Option<Handler>>> = Arc::new(Mutex::new(None));

        let once = {
            let bus = bus.clone();
            let count = Arc::clone(&count);
            let slot = Arc::clone(&slot);
            EventBus::handler(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
                let me = slot.lock().ok().and_then(|s| s.clone());
                if let Some(me) = me {
                    bus.off(EventKind::Notification, &me);
                }
            })
        };
        *slot.lock().expect("lock") = Some(Arc::clone(&once));
        bus.on(EventKind::Notification, &once);

        bus.emit(&note("one"));
        bus.emit(&note("two"));
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_reentrant_emit() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let relay = {
            let bus = bus.clone();
            EventBus::handler(move |event| {
                if let Event::Error(err) = event {
                    bus.emit(&note(&err.message));
                }
            })
        };
        bus.on(EventKind::Error, &relay);
        bus.on(EventKind::Notification, &recorder(&log, "notified"));

        bus.emit(&Event::Error(crate::ws::events::ErrorEvent::new(
            crate::ws::events::ErrorKind::Application,
            "boom",
            None,
        )));
        assert_eq!(entries(&log), vec!["notified"]);
    }

    #[test]
    fn test_clear() {
        let bus = EventBus::new();
        bus.on(EventKind::WalletData, &EventBus::handler(|_| {}));
        bus.on(EventKind::Error, &EventBus::handler(|_| {}));
        bus.clear();
        assert_eq!(bus.handler_count(EventKind::WalletData), 0);
        assert_eq!(bus.handler_count(EventKind::Error), 0);
    }
}
