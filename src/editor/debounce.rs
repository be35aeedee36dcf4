use std::time::{Duration, Instant};

/// A cancellable one-shot timer carrying a payload.
///
/// Arming while already armed replaces the payload and pushes the deadline
/// out, so a burst of events fires once, for the last event. Time is passed
/// in by the caller; nothing here reads a clock.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Arm (or re-arm) the timer. Returns the payload it replaced, if any.
    pub fn arm(&mut self, now: Instant, value: T) -> Option<T> {
        self.pending
            .replace((now + self.window, value))
            .map(|(_, old)| old)
    }

    /// Disarm without firing
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Fire if the deadline has passed. Fires at most once per arming.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.cancel(),
            _ => None,
        }
    }

    /// Fire immediately regardless of the deadline
    pub fn flush(&mut self) -> Option<T> {
        self.cancel()
    }
}
