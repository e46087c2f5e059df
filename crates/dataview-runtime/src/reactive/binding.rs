#![forbid(unsafe_code)]

//! Derived read-only values and subscription lifetimes.
//!
//! A [`Binding<T>`] wraps an observable source plus a transform, evaluated on
//! every `get()`. A [`BindingScope`] owns the subscriptions a component makes
//! against observables and event channels, so that dropping the component
//! disconnects it.
//!
//! # Invariants
//!
//! 1. `Binding::get()` always returns the current value; nothing is cached.
//! 2. Bindings are `Clone` and share their source.
//! 3. After a `BindingScope` is dropped or cleared, none of its callbacks
//!    fire again.
//!
//! # Failure Modes
//!
//! - Transform panic: propagates to the caller of `get()`.
//! - Source dropped while binding alive: binding still works (Rc keeps the
//!   value alive).

use std::rc::Rc;

use super::observable::{EventChannel, Observable, Subscription};

// ---------------------------------------------------------------------------
// Binding<T>
// ---------------------------------------------------------------------------

/// A read-only view of an [`Observable`] through a transform.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .finish()
    }
}

impl<T: 'static> Binding<T> {
    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }
}

/// Binding that returns `map` applied to the observable's value.
pub fn bind_mapped<S: Clone + PartialEq + 'static, T: 'static>(
    source: &Observable<S>,
    map: impl Fn(&S) -> T + 'static,
) -> Binding<T> {
    let src = source.clone();
    Binding {
        eval: Rc::new(move || src.with(|v| map(v))),
    }
}

// ---------------------------------------------------------------------------
// BindingScope
// ---------------------------------------------------------------------------

/// Owns the subscriptions of one component.
///
/// Dropping the scope releases every subscription it holds, in registration
/// order.
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Subscribe to value changes within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(source.subscribe(callback));
        self
    }

    /// Listen to an event channel within this scope.
    pub fn listen<T: 'static>(
        &mut self,
        channel: &EventChannel<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(channel.subscribe(callback));
        self
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every subscription now; the scope stays usable.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn mapped_binding_tracks_source() {
        let count = Observable::new(3usize);
        let label = bind_mapped(&count, |c| format!("{c} rows"));
        assert_eq!(label.get(), "3 rows");
        count.set(7);
        assert_eq!(label.get(), "7 rows");
    }

    #[test]
    fn scope_releases_on_clear() {
        let obs = Observable::new(0);
        let channel: EventChannel<u8> = EventChannel::new();
        let calls = Rc::new(Cell::new(0));
        let (a, b) = (Rc::clone(&calls), Rc::clone(&calls));

        let mut scope = BindingScope::new();
        scope
            .subscribe(&obs, move |_| a.set(a.get() + 1))
            .listen(&channel, move |_| b.set(b.get() + 1));
        assert!(!scope.is_empty());

        obs.set(1);
        channel.emit(&0);
        assert_eq!(calls.get(), 2);

        scope.clear();
        assert!(scope.is_empty());
        obs.set(2);
        channel.emit(&0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn scope_drop_disconnects() {
        let obs = Observable::new(0);
        {
            let mut scope = BindingScope::new();
            scope.subscribe(&obs, |_| {});
            assert_eq!(obs.subscriber_count(), 1);
        }
        assert_eq!(obs.subscriber_count(), 0);
    }
}
