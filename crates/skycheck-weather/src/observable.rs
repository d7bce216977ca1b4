//! Framework-independent observable value.
//!
//! Holds the current value and notifies subscribers of every `set`.
//! Notifications are queued in `set` order and delivered by one thread at a
//! time, outside every internal lock, so callbacks may call `set`,
//! `subscribe` or code that does either. A `set` that arrives while another
//! thread is delivering is handed to that thread and delivered in order.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    value: T,
    pending: VecDeque<T>,
    delivering: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

/// A shared value with change notification. Cloning shares the same value.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Clears the delivering flag if a callback panics mid-delivery.
struct DeliveryGuard<'a, T> {
    shared: &'a Shared<T>,
    armed: bool,
}

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.slot.lock().delivering = false;
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    value: initial,
                    pending: VecDeque::new(),
                    delivering: false,
                }),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Snapshot of the current value.
    pub fn current(&self) -> T {
        self.shared.slot.lock().value.clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        self.stage(value);
        self.flush();
    }

    /// Replace the value and queue its notification without delivering it.
    ///
    /// Lets a caller commit a value under its own lock and deliver with
    /// [`flush`](Self::flush) after releasing it.
    pub(crate) fn stage(&self, value: T) {
        let mut slot = self.shared.slot.lock();
        slot.value = value.clone();
        slot.pending.push_back(value);
    }

    /// Deliver queued notifications in order.
    ///
    /// Returns immediately when another call is already delivering; that call
    /// picks up everything queued before it finishes.
    pub(crate) fn flush(&self) {
        {
            let mut slot = self.shared.slot.lock();
            if slot.delivering || slot.pending.is_empty() {
                return;
            }
            slot.delivering = true;
        }
        let mut guard = DeliveryGuard {
            shared: &self.shared,
            armed: true,
        };

        loop {
            let next = {
                let mut slot = self.shared.slot.lock();
                match slot.pending.pop_front() {
                    Some(value) => value,
                    None => {
                        // Cleared under the same lock that saw the queue empty.
                        slot.delivering = false;
                        guard.armed = false;
                        return;
                    }
                }
            };

            let callbacks: Vec<Callback<T>> = self
                .shared
                .subscribers
                .lock()
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect();

            for cb in callbacks {
                cb(&next);
            }
        }
    }

    /// Register a callback for future changes. The current value is not replayed.
    ///
    /// The callback stays registered until the returned `Subscription` is
    /// dropped or `unsubscribe` is called.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .subscribers
            .lock()
            .push((id, Arc::new(callback)));

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.subscribers.lock().retain(|(sub_id, _)| *sub_id != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().len()
    }
}

/// Handle to a registered callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn current_returns_latest_value() {
        let obs = Observable::new(1);
        assert_eq!(obs.current(), 1);
        obs.set(2);
        assert_eq!(obs.current(), 2);
    }

    #[test]
    fn subscribers_see_every_set_but_not_the_initial_value() {
        let obs = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.lock().push(*v));

        obs.set(1);
        obs.set(2);

        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let obs = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = obs.subscribe(move |v| sink.lock().push(*v));

        obs.set(1);
        sub.unsubscribe();
        obs.set(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let obs = Observable::new("a".to_string());
        {
            let _sub = obs.subscribe(|_| {});
            assert_eq!(obs.subscriber_count(), 1);
        }
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let obs = Observable::new(0);
        let other = obs.clone();
        other.set(7);
        assert_eq!(obs.current(), 7);
    }

    #[test]
    fn subscription_outliving_observable_is_harmless() {
        let obs = Observable::new(0);
        let sub = obs.subscribe(|_| {});
        drop(obs);
        sub.unsubscribe();
    }

    #[test]
    fn set_from_inside_a_callback_is_delivered_after_the_current_one() {
        let obs = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let again = obs.clone();
        let _sub = obs.subscribe(move |v| {
            sink.lock().push(*v);
            if *v == 1 {
                again.set(2);
            }
        });

        obs.set(1);

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert_eq!(obs.current(), 2);
    }

    #[test]
    fn subscribe_from_inside_a_callback_does_not_block() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let late = Arc::new(Mutex::new(Vec::new()));
        let late_sink = Arc::clone(&late);
        let held = Arc::new(Mutex::new(Vec::new()));
        let held_sink = Arc::clone(&held);
        let _sub = obs.subscribe(move |v| {
            if *v == 1 {
                let sink = Arc::clone(&late_sink);
                held_sink.lock().push(inner.subscribe(move |v| sink.lock().push(*v)));
            }
        });

        obs.set(1);
        obs.set(2);

        assert_eq!(*late.lock(), vec![2]);
        assert_eq!(held.lock().len(), 1);
    }

    #[test]
    fn staged_values_wait_for_flush() {
        let obs = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.lock().push(*v));

        obs.stage(1);
        obs.stage(2);
        assert_eq!(obs.current(), 2);
        assert!(seen.lock().is_empty());

        obs.flush();
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn concurrent_sets_reach_subscribers_in_commit_order() {
        let obs = Observable::new((0usize, 0usize));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.lock().push(*v));

        let writers: Vec<_> = (1..=4)
            .map(|writer| {
                let obs = obs.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        obs.set((writer, i));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let seen = seen.lock();
        assert_eq!(seen.len(), 1000);
        assert_eq!(seen.last().copied(), Some(obs.current()));
        for writer in 1..=4 {
            let mine: Vec<usize> = seen
                .iter()
                .filter(|(w, _)| *w == writer)
                .map(|(_, i)| *i)
                .collect();
            assert_eq!(mine, (0..250).collect::<Vec<_>>());
        }
    }
}
