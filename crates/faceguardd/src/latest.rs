//! Single-slot frame handoff.
//!
//! A bounded queue of capacity one where the newest value always wins:
//! `publish` replaces whatever is waiting under a single lock and never
//! blocks; `recv_timeout` parks on a condvar so the consumer can check
//! its stop flag at a steady cadence even when the feed is idle.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

struct Shared<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

/// Create a connected sender/receiver pair.
pub fn latest_slot<T>() -> (SlotSender<T>, SlotReceiver<T>) {
    let shared = Arc::new(Shared {
        value: Mutex::new(None),
        ready: Condvar::new(),
    });
    (
        SlotSender {
            shared: Arc::clone(&shared),
        },
        SlotReceiver { shared },
    )
}

pub struct SlotSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotSender<T> {
    /// Store `value`, evicting any unconsumed predecessor.
    ///
    /// Returns the evicted value so callers can log the drop.
    pub fn publish(&self, value: T) -> Option<T> {
        let mut slot = self
            .shared
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let evicted = slot.replace(value);
        self.shared.ready.notify_one();
        evicted
    }
}

pub struct SlotReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotReceiver<T> {
    /// Take the waiting value, blocking up to `timeout` for one to arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self
            .shared
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if let Some(value) = slot.take() {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, result) = self
                .shared
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot = guard;
            if result.timed_out() {
                return slot.take();
            }
        }
    }

    /// Take the waiting value without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.shared
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_value_wins() {
        // With the reader asleep, K publishes leave exactly publish K.
        let (tx, rx) = latest_slot();
        for k in 1..=50 {
            tx.publish(k);
        }
        assert_eq!(rx.try_recv(), Some(50));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_publish_reports_eviction() {
        let (tx, rx) = latest_slot();
        assert_eq!(tx.publish(1), None);
        assert_eq!(tx.publish(2), Some(1));
        assert_eq!(rx.try_recv(), Some(2));
    }

    #[test]
    fn test_recv_timeout_expires_when_empty() {
        let (_tx, rx) = latest_slot::<u32>();
        let start = Instant::now();
        assert_eq!(rx.recv_timeout(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_recv_returns_immediately_when_ready() {
        let (tx, rx) = latest_slot();
        tx.publish(7);
        let start = Instant::now();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Some(7));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_recv_wakes_on_publish() {
        let (tx, rx) = latest_slot();
        let reader = std::thread::spawn(move || rx.recv_timeout(Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(20));
        tx.publish(42);
        assert_eq!(reader.join().unwrap(), Some(42));
    }
}
