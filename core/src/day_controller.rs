//! Day/session controller state.
//!
//! PHASES (no skipping):
//!   Lobby ──start_day──▶ Active ──countdown hits 0──▶ Ended ──advance_day──▶ Lobby
//!
//! Starting a day first waits (in Lobby, `loading`) for the daily event;
//! ending a day waits (in Ended, `loading`) for the review. Both waits are
//! bounded by the narrative timeout and fall back to fixed content.
//!
//! The engine owns the orchestration; this module holds the phase, the
//! day's modifier and statistics, and the two timers.

use crate::{
    clock::{DayTimer, TickThrottle},
    narrative::PendingNarrative,
    types::Money,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    Lobby,
    Active,
    Ended,
}

/// The daily modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventEffect {
    Normal,
    /// Customers arrive twice as often.
    Rush,
    /// Customers arrive half as often.
    Slow,
    /// Customers tip.
    Rich,
}

impl EventEffect {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Some(Self::Normal),
            "RUSH" => Some(Self::Rush),
            "SLOW" => Some(Self::Slow),
            "RICH" => Some(Self::Rich),
            _ => None,
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Normal => "event_normal",
            Self::Rush => "event_rush",
            Self::Slow => "event_slow",
            Self::Rich => "event_rich",
        }
    }

    pub fn spawn_threshold(&self, base: f64) -> f64 {
        match self {
            Self::Rush => base / 2.0,
            Self::Slow => base * 2.0,
            Self::Normal | Self::Rich => base,
        }
    }

    pub fn tips(&self) -> bool {
        matches!(self, Self::Rich)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEvent {
    pub title:       String,
    pub description: String,
    pub effect:      EventEffect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub served: u32,
    pub burnt:  u32,
    pub earned: Money,
    pub review: String,
}

pub struct DayController {
    pub phase:          DayPhase,
    pub event:          Option<DailyEvent>,
    pub stats:          DayStats,
    pub timer:          DayTimer,
    pub throttle:       TickThrottle,
    pub pending_event:  Option<PendingNarrative<DailyEvent>>,
    pub pending_review: Option<PendingNarrative<String>>,
}

impl DayController {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            phase:          DayPhase::Lobby,
            event:          None,
            stats:          DayStats::default(),
            timer:          DayTimer::default(),
            throttle:       TickThrottle::new(tick_interval),
            pending_event:  None,
            pending_review: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == DayPhase::Active
    }

    pub fn is_ended(&self) -> bool {
        self.phase == DayPhase::Ended
    }

    /// A provider request is in flight; the UI disables its trigger.
    pub fn is_loading(&self) -> bool {
        self.pending_event.is_some() || self.pending_review.is_some()
    }

    /// The active modifier; Normal outside a day.
    pub fn effect(&self) -> EventEffect {
        self.event.as_ref().map_or(EventEffect::Normal, |e| e.effect)
    }

    /// Enter Active with a fresh countdown and tick throttle.
    pub fn activate(&mut self, event: DailyEvent, now: Duration, day_length_secs: u32) {
        debug_assert_eq!(self.phase, DayPhase::Lobby);
        self.event = Some(event);
        self.stats = DayStats::default();
        self.throttle.reset();
        self.timer.arm(now, day_length_secs);
        self.phase = DayPhase::Active;
    }

    /// Leave Active. The countdown is cancelled so it cannot fire again.
    pub fn finish(&mut self) {
        debug_assert_eq!(self.phase, DayPhase::Active);
        self.timer.cancel();
        self.phase = DayPhase::Ended;
    }

    pub fn reopen_lobby(&mut self) {
        debug_assert_eq!(self.phase, DayPhase::Ended);
        self.event = None;
        self.phase = DayPhase::Lobby;
    }
}
