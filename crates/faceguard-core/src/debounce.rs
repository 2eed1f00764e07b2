//! Two-tier debounce gating for recognition side effects.
//!
//! The global gate spans every camera session and admits at most one
//! full intruder event (snapshot + log + alert) per rolling window.
//! The known-log gate is private to one session and debounces log
//! entries per recognized identity.
//!
//! Both gates take `now` as an argument rather than reading the clock,
//! so callers control time and tests drive synthetic instants.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cross-camera gate for full intruder events.
///
/// One instance per pipeline, shared by reference with every session.
/// The stamp is mutated under a single mutex held only for the
/// compare-and-update.
pub struct UnknownEventGate {
    window: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl UnknownEventGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: Mutex::new(None),
        }
    }

    /// Returns true when a full intruder event may fire at `now`, and
    /// records `now` as the new stamp. Returns false while the window
    /// since the last admitted event is still open.
    pub fn try_fire(&self, now: Instant) -> bool {
        let mut last = self
            .last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let open = match *last {
            None => true,
            Some(fired) => now.saturating_duration_since(fired) >= self.window,
        };
        if open {
            *last = Some(now);
        }
        open
    }
}

/// Per-session gate for known-identity log entries.
///
/// Keyed by the identity's full label. Sessions do not share this
/// state: the same person is logged independently, once per camera,
/// within the window.
pub struct KnownLogGate {
    window: Duration,
    last_logged: HashMap<String, Instant>,
}

impl KnownLogGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_logged: HashMap::new(),
        }
    }

    /// Returns true when `label` may be logged at `now`, recording the
    /// stamp; false while its window is still open.
    pub fn should_log(&mut self, label: &str, now: Instant) -> bool {
        let open = match self.last_logged.get(label) {
            None => true,
            Some(logged) => now.saturating_duration_since(*logged) >= self.window,
        };
        if open {
            self.last_logged.insert(label.to_string(), now);
        }
        open
    }
}
