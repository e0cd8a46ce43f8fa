//! Event Bus
//!
//! Typed publish/subscribe dispatcher between the connection manager and its
//! consumers.
//!
//! - Handlers run synchronously, in subscription order
//! - A panicking handler is isolated; siblings and the emitter carry on
//! - Handlers registered during an emission only see later emissions
//! - `Subscription` removes its handler on `unsubscribe()` or drop

use crate::events::Topic;
use parking_lot::RwLock;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type HandlerFn<E> = dyn Fn(&E) + Send + Sync;

struct HandlerEntry<E> {
    id: u64,
    active: AtomicBool,
    handler: Box<HandlerFn<E>>,
}

struct BusInner<E> {
    handlers: RwLock<Vec<Arc<HandlerEntry<E>>>>,
    next_id: AtomicU64,
    handler_failures: AtomicU64,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<E: 'static> Detach for BusInner<E> {
    fn detach(&self, id: u64) {
        let mut handlers = self.handlers.write();
        if let Some(idx) = handlers.iter().position(|h| h.id == id) {
            let entry = handlers.remove(idx);
            entry.active.store(false, Ordering::Release);
        }
    }
}

/// Synchronous typed event bus
///
/// Cloning yields another handle to the same subscriber list.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E: 'static> EventBus<E> {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                handler_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to every event
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().push(Arc::new(HandlerEntry {
            id,
            active: AtomicBool::new(true),
            handler: Box::new(handler),
        }));

        let weak: Weak<BusInner<E>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            bus: weak,
            active: AtomicBool::new(true),
        }
    }

    /// Subscribe to one topic; the handler receives the topic payload
    pub fn on<T, F>(&self, handler: F) -> Subscription
    where
        T: Topic<E>,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_any(move |event| {
            if let Some(payload) = T::select(event) {
                handler(payload);
            }
        })
    }

    /// Deliver an event to the current subscribers
    pub fn emit(&self, event: impl Into<E>) {
        let event = event.into();
        let snapshot: Vec<Arc<HandlerEntry<E>>> = self.inner.handlers.read().clone();

        for entry in snapshot {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.handler)(&event)));
            if let Err(panic) = outcome {
                self.inner.handler_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    subscription = entry.id,
                    reason = panic_message(&*panic),
                    "event handler panicked; continuing with remaining handlers"
                );
            }
        }
    }

    /// Remove every subscription
    pub fn clear(&self) {
        let drained: Vec<_> = self.inner.handlers.write().drain(..).collect();
        for entry in &drained {
            entry.active.store(false, Ordering::Release);
        }
        tracing::debug!(removed = drained.len(), "event bus cleared");
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.read().len()
    }

    /// Handler panics caught so far
    #[must_use]
    pub fn handler_failures(&self) -> u64 {
        self.inner.handler_failures.load(Ordering::Relaxed)
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.handlers.read().len())
            .finish()
    }
}

/// Handle to one registered handler
///
/// Dropping it unsubscribes; call [`Subscription::detach`] to keep the handler
/// for the lifetime of the bus.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    bus: Weak<dyn Detach>,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the handler; later calls are no-ops
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(bus) = self.bus.upgrade() {
                bus.detach(self.id);
            }
        }
    }

    /// Still registered
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.bus.strong_count() > 0
    }

    /// Leave the handler registered after this handle is gone
    pub fn detach(self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollabEvent, SearchEvent};
    use parking_lot::Mutex;

    fn results(total: usize) -> CollabEvent {
        CollabEvent::Search(SearchEvent::ResultsUpdated {
            query: "q".into(),
            total,
        })
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = {
            let seen = Arc::clone(&seen);
            bus.on_any(move |e| seen.lock().push(("first", *e)))
        };
        let s2 = {
            let seen = Arc::clone(&seen);
            bus.on_any(move |e| seen.lock().push(("second", *e)))
        };

        bus.emit(1u32);
        bus.emit(2u32);
        assert_eq!(
            *seen.lock(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
        drop((s1, s2));
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let bus: EventBus<u32> = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));

        let _bad = bus.on_any(|_| panic!("boom"));
        let _good = {
            let hits = Arc::clone(&hits);
            bus.on_any(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        bus.emit(7u32);
        bus.emit(8u32);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.handler_failures(), 2);
    }

    #[test]
    fn handler_added_during_emit_waits_for_next_event() {
        let bus: EventBus<u32> = EventBus::new();
        let late_hits = Arc::new(AtomicU64::new(0));
        let late_subs = Arc::new(Mutex::new(Vec::new()));

        let _registrar = {
            let bus = bus.clone();
            let late_hits = Arc::clone(&late_hits);
            let late_subs = Arc::clone(&late_subs);
            bus.clone().on_any(move |_| {
                let late_hits = Arc::clone(&late_hits);
                let sub = bus.on_any(move |_| {
                    late_hits.fetch_add(1, Ordering::SeqCst);
                });
                late_subs.lock().push(sub);
            })
        };

        bus.emit(1u32);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        bus.emit(2u32);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus: EventBus<u32> = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        let sub = {
            let hits = Arc::clone(&hits);
            bus.on_any(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _other = bus.on_any(|_| {});

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(1u32);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_unsubscribes_and_detach_keeps() {
        let bus: EventBus<u32> = EventBus::new();
        {
            let _scoped = bus.on_any(|_| {});
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);

        bus.on_any(|_| {}).detach();
        assert_eq!(bus.subscriber_count(), 1);

        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn typed_topic_filters_other_families() {
        let bus: EventBus<CollabEvent> = EventBus::new();
        let totals = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let totals = Arc::clone(&totals);
            bus.on::<SearchEvent, _>(move |SearchEvent::ResultsUpdated { total, .. }| {
                totals.lock().push(*total);
            })
        };

        bus.emit(results(3));
        bus.emit(CollabEvent::Notification(
            crate::events::NotificationEvent::Cleared,
        ));
        bus.emit(SearchEvent::ResultsUpdated {
            query: "x".into(),
            total: 0,
        });
        assert_eq!(*totals.lock(), vec![3, 0]);
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus: EventBus<u32> = EventBus::new();
        let sub = bus.on_any(|_| {});
        drop(bus);
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
