//! Shared observable values and event channels.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | Callback panics | Propagates to the caller of `set`/`emit` |
//! | Callback sets the same observable | Allowed; the nested change notifies first |
//! | Subscription dropped mid-notification | The callback still finishes the current cycle |
//! | Source dropped while a `Subscription` is alive | The guard becomes inert |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Registry: shared subscriber list
// ---------------------------------------------------------------------------

type Callback<T> = dyn Fn(&T);

/// Ordered list of weak callbacks.
struct Registry<T> {
    callbacks: RefCell<Vec<Weak<Callback<T>>>>,
}

impl<T: 'static> Registry<T> {
    fn new() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }

    fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.callbacks.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _callback: Box::new(strong),
        }
    }

    /// Live callbacks in registration order, pruning dead ones.
    fn live(&self) -> Vec<Rc<Callback<T>>> {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks.retain(|weak| weak.strong_count() > 0);
        callbacks.iter().filter_map(Weak::upgrade).collect()
    }

    fn notify(&self, value: &T) {
        for callback in self.live() {
            callback(value);
        }
    }

    fn count(&self) -> usize {
        self.callbacks
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Subscription: RAII guard
// ---------------------------------------------------------------------------

/// Keeps a callback registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Observable<T>
// ---------------------------------------------------------------------------

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: Registry<T>,
}

/// A shared, version-tracked value with change notification.
///
/// Clones share the same value. Callbacks receive a snapshot of the new
/// value taken after the mutation, so they may freely call back into the
/// observable.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value`, at version 0.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: Registry::new(),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Equal values are ignored.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.changed();
    }

    /// Mutate in place. Subscribers are notified only if the value changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            let before = current.clone();
            f(&mut current);
            *current != before
        };
        if changed {
            self.changed();
        }
    }

    /// Number of changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Register `callback` for every future change.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.count()
    }

    fn changed(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        let snapshot = self.get();
        self.inner.subscribers.notify(&snapshot);
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventChannel<T>
// ---------------------------------------------------------------------------

/// Broadcast point for events. Nothing is retained between emissions.
pub struct EventChannel<T> {
    subscribers: Rc<Registry<T>>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: 'static> EventChannel<T> {
    /// A channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(Registry::new()),
        }
    }

    /// Deliver `event` to every live listener, in registration order.
    pub fn emit(&self, event: &T) {
        self.subscribers.notify(event);
    }

    /// Register `callback` for every future event.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Number of live listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }
}

impl<T: 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("callbacks", &self.subscribers.callbacks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_and_bumps_version() {
        let obs = Observable::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.borrow_mut().push(*v));

        obs.set(2);
        obs.set(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new(5);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| c.set(c.get() + 1));

        obs.set(5);
        obs.update(|v| *v += 0);
        assert_eq!(calls.get(), 0);
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn dropped_subscription_stops_callbacks() {
        let obs = Observable::new(0);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let sub = obs.subscribe(move |_| c.set(c.get() + 1));
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(calls.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(String::new()));
        let (a, b) = (Rc::clone(&log), Rc::clone(&log));
        let _s1 = obs.subscribe(move |_| a.borrow_mut().push('a'));
        let _s2 = obs.subscribe(move |_| b.borrow_mut().push('b'));
        obs.set(1);
        assert_eq!(*log.borrow(), "ab");
    }

    #[test]
    fn callback_may_read_and_write_source() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let _sub = obs.subscribe(move |v| {
            if *v < 3 {
                inner.set(inner.get() + 1);
            }
        });
        obs.set(1);
        assert_eq!(obs.get(), 3);
    }

    #[test]
    fn channel_delivers_each_event() {
        let channel: EventChannel<&'static str> = EventChannel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = channel.subscribe(move |e| sink.borrow_mut().push(*e));
        channel.emit(&"a");
        channel.emit(&"a");
        drop(sub);
        channel.emit(&"b");
        assert_eq!(*seen.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn subscriber_added_during_emit_waits_for_next() {
        let channel: EventChannel<u8> = EventChannel::new();
        let late_calls = Rc::new(Cell::new(0));
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::default();
        let (ch, calls, keep) = (channel.clone(), Rc::clone(&late_calls), Rc::clone(&held));
        let _first = channel.subscribe(move |_| {
            let calls = Rc::clone(&calls);
            keep.borrow_mut()
                .push(ch.subscribe(move |_| calls.set(calls.get() + 1)));
        });
        channel.emit(&0);
        assert_eq!(late_calls.get(), 0);
        channel.emit(&1);
        assert_eq!(late_calls.get(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn notifies_exactly_on_change(values in proptest::collection::vec(0u8..4, 0..40)) {
                let obs = Observable::new(0u8);
                let seen = Rc::new(RefCell::new(Vec::new()));
                let sink = Rc::clone(&seen);
                let _sub = obs.subscribe(move |v| sink.borrow_mut().push(*v));

                let mut expected = Vec::new();
                let mut current = 0u8;
                for value in values {
                    if value != current {
                        expected.push(value);
                        current = value;
                    }
                    obs.set(value);
                }
                prop_assert_eq!(obs.version(), expected.len() as u64);
                prop_assert_eq!(&*seen.borrow(), &expected);
            }
        }
    }
}
