use std::time::{Duration, Instant};

/// Fixed-interval tick schedule.
///
/// The clock holds no callback; the host polls it with the current time and
/// runs one generation whenever `poll` reports a due tick. Cancelling clears
/// the deadline, so nothing can fire after `cancel` returns.
#[derive(Clone, Debug)]
pub struct TickClock {
    interval: Duration,
    deadline: Option<Instant>,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Next instant a tick is due, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Schedule the first tick one interval after `now`.
    ///
    /// Arming an already armed clock keeps the existing cadence.
    pub fn arm(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.interval);
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true when a tick is due at `now`.
    ///
    /// Fires at most once per call. After a stall longer than one interval
    /// the schedule restarts from `now` instead of replaying missed ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let mut next = deadline + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.deadline = Some(next);
        true
    }
}
