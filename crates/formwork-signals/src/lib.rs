//! # formwork-signals
//!
//! Signal dispatcher for formwork. Fields announce `change`, `error` and
//! `focus` events through [`Signal`]s, and any number of independent
//! receivers can listen without the field knowing about them.
//!
//! ## Usage
//!
//! ```
//! use formwork_signals::Signal;
//! use std::sync::Arc;
//!
//! struct Changed(String);
//!
//! let signal: Signal<Changed> = Signal::new();
//!
//! signal.connect("logger", Arc::new(|event: &Changed| {
//!     println!("value is now {}", event.0);
//! }));
//!
//! assert_eq!(signal.send(&Changed("abc".into())), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// The type signature for a signal receiver callback.
///
/// Receivers must be `Send + Sync` so that signals can be dispatched from any
/// task.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Each signal carries a payload type `T`. Receivers are called in the order
/// they were connected.
pub struct Signal<T: 'static> {
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
    next_anonymous: AtomicU64,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("receivers", &self.receiver_ids())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
            next_anonymous: AtomicU64::new(0),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// The `receiver_id` is used to identify the receiver for later disconnection.
    /// If a receiver with the same ID is already connected, it is replaced in place.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.write().expect("signal lock poisoned");

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Connects a receiver under a generated ID and returns that ID.
    pub fn subscribe(&self, callback: SignalReceiver<T>) -> String {
        let n = self.next_anonymous.fetch_add(1, Ordering::Relaxed);
        let id = format!("__anonymous_{n}");
        self.connect(id.clone(), callback);
        id
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.write().expect("signal lock poisoned");
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Disconnects every receiver.
    pub fn disconnect_all(&self) {
        self.receivers.write().expect("signal lock poisoned").clear();
    }

    /// Sends the signal to all connected receivers and returns how many ran.
    ///
    /// The receiver list is snapshotted first, so a receiver may connect or
    /// disconnect receivers on this same signal without deadlocking. Changes
    /// take effect on the next send.
    pub fn send(&self, payload: &T) -> usize {
        let snapshot: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &snapshot {
            callback(payload);
        }
        snapshot.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.read().expect("signal lock poisoned").len()
    }

    /// Returns the connected receiver IDs in connection order.
    pub fn receiver_ids(&self) -> Vec<String> {
        self.receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}
