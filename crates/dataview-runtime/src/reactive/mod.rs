#![forbid(unsafe_code)]

//! Reactive values for dataview pipelines.
//!
//! - [`Observable`]: a shared, version-tracked value that notifies
//!   subscribers when it changes.
//! - [`EventChannel`]: a shared broadcast point for values that are events
//!   rather than state (update batches, selection changes).
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BindingScope`]: holds the subscriptions of one owner (a view, a
//!   combined source) and releases them together.
//!
//! # Architecture
//!
//! Both `Observable<T>` and `EventChannel<T>` use `Rc` for single-threaded
//! shared ownership and store subscribers as `Weak` callbacks, cleaned up
//! lazily during notification. No `RefCell` borrow is held while a callback
//! runs, so callbacks may read or write the value they observe.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. A subscriber added during a notification is first called on the next
//!    one.

pub mod binding;
pub mod observable;

pub use binding::{Binding, BindingScope, bind_mapped};
pub use observable::{EventChannel, Observable, Subscription};
