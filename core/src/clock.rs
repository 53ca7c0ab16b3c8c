//! Simulation clock: tick counting, the fixed-step throttle and the
//! 1 Hz day countdown.
//!
//! All timestamps are driver time: a monotonically increasing `Duration`
//! since the driver started. Nothing here reads the platform clock, so
//! tests can drive time explicitly.

use crate::types::Tick;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Counts effective ticks across the whole session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimClock {
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }
}

/// Gates game-logic updates to at most one per `interval`, no matter how
/// often the driver calls in. Missed intervals are not caught up.
#[derive(Debug, Clone)]
pub struct TickThrottle {
    interval: Duration,
    last:     Option<Duration>,
}

impl TickThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True when an effective tick is due at `now`. The first call after
    /// construction or `reset()` only primes the reference time.
    pub fn due(&mut self, now: Duration) -> bool {
        match self.last {
            None => {
                self.last = Some(now);
                false
            }
            Some(last) if now.saturating_sub(last) > self.interval => {
                self.last = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Result of polling the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerPoll {
    /// Whole seconds that elapsed since the previous poll.
    pub fired:   u32,
    /// Set exactly once, on the poll that reaches zero.
    pub expired: bool,
}

/// The day countdown. Disarmed timers never fire.
#[derive(Debug, Clone, Default)]
pub struct DayTimer {
    remaining: u32,
    next_fire: Option<Duration>,
}

impl DayTimer {
    pub fn arm(&mut self, now: Duration, seconds: u32) {
        self.remaining = seconds;
        self.next_fire = Some(now.saturating_add(ONE_SECOND));
    }

    pub fn cancel(&mut self) {
        self.next_fire = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn poll(&mut self, now: Duration) -> TimerPoll {
        let mut result = TimerPoll::default();
        while let Some(at) = self.next_fire {
            if now < at {
                break;
            }
            result.fired += 1;
            if self.remaining <= 1 {
                self.remaining = 0;
                self.next_fire = None;
                result.expired = true;
            } else {
                self.remaining -= 1;
                self.next_fire = Some(at.saturating_add(ONE_SECOND));
            }
        }
        result
    }

    /// Manual short-circuit: drop the countdown to zero.
    /// Returns false when the timer was not running.
    pub fn force_expire(&mut self) -> bool {
        if self.next_fire.take().is_none() {
            return false;
        }
        self.remaining = 0;
        true
    }
}
