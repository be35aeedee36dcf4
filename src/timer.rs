use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// Work run by a scheduler when its delay elapses
pub type Callback = Box<dyn FnOnce(&mut dyn AlertSink)>;

/// Something that can run a callback later
pub trait Scheduler {
    fn now(&self) -> Instant;
    fn schedule(&mut self, delay: Duration, callback: Callback);
}

/// A permission-gated place to raise user-visible alerts
pub trait AlertSink {
    fn permitted(&self) -> bool;
    fn request_permission(&mut self);
    fn alert(&mut self, title: &str, body: &str);
}

pub const ALERT_TITLE: &str = "Time's up!";

/// A focus-session countdown. It only raises an alert when it runs out and
/// has no access to the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimer {
    started: Instant,
    length: Duration,
}

impl SessionTimer {
    pub fn start(minutes: u64, scheduler: &mut dyn Scheduler, alerts: &mut dyn AlertSink) -> Self {
        if !alerts.permitted() {
            alerts.request_permission();
        }
        let length = Duration::from_secs(minutes.saturating_mul(60));
        let body = format!("Extend your session for another {} minutes?", minutes);
        scheduler.schedule(
            length,
            Box::new(move |sink: &mut dyn AlertSink| {
                if sink.permitted() {
                    sink.alert(ALERT_TITLE, &body);
                } else {
                    debug!("session ended, alerts not permitted");
                }
            }),
        );
        info!(minutes, "session timer started");
        SessionTimer {
            started: scheduler.now(),
            length,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.length
            .saturating_sub(now.saturating_duration_since(self.started))
    }

    pub fn is_over(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

/// Format a countdown as `MM:SS`
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// A scheduler driven by an event loop: callbacks run from `poll` once
/// their deadline has passed.
pub struct PolledScheduler {
    now: Instant,
    jobs: Vec<(Instant, Callback)>,
}

impl PolledScheduler {
    pub fn new(now: Instant) -> Self {
        PolledScheduler {
            now,
            jobs: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Earliest deadline among pending callbacks
    pub fn next_deadline(&self) -> Option<Instant> {
        self.jobs.iter().map(|(at, _)| *at).min()
    }

    /// Advance the clock to `now` and run every callback that is due
    pub fn poll(&mut self, now: Instant, sink: &mut dyn AlertSink) -> usize {
        self.now = now;
        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.jobs).into_iter().partition(|(at, _)| *at <= now);
        self.jobs = waiting;
        let count = due.len();
        for (_, callback) in due {
            callback(sink);
        }
        count
    }
}

impl Scheduler for PolledScheduler {
    fn now(&self) -> Instant {
        self.now
    }

    /// A delay past the end of the clock never comes due, so it is dropped
    fn schedule(&mut self, delay: Duration, callback: Callback) {
        match self.now.checked_add(delay) {
            Some(at) => self.jobs.push((at, callback)),
            None => warn!(?delay, "delay out of range, callback dropped"),
        }
    }
}
