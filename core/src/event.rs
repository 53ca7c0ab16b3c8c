//! Simulation events: everything that happens is recorded as one.
//!
//! Variants are append-only. The serde tag doubles as the journal's
//! event_type column.

use crate::{
    day_controller::EventEffect,
    economy::UpgradeId,
    locale::Language,
    types::{CustomerId, Filling, MoldId, Money, RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine ────────────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed:   u64,
    },

    // ── Molds ─────────────────────────────────────
    DoughPoured {
        tick:    Tick,
        mold_id: MoldId,
    },
    MoldFilled {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    CookingStarted {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    BunCooked {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    BunBurnt {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    BunHarvested {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    BunDiscarded {
        tick:    Tick,
        mold_id: MoldId,
        filling: Filling,
    },
    MoldAdded {
        tick:    Tick,
        mold_id: MoldId,
    },

    // ── Customers ─────────────────────────────────
    CustomerArrived {
        tick:        Tick,
        customer_id: CustomerId,
        order:       Filling,
        avatar_id:   u32,
    },
    CustomerWalkedAway {
        tick:        Tick,
        customer_id: CustomerId,
        order:       Filling,
    },
    CustomerServed {
        tick:        Tick,
        customer_id: CustomerId,
        order:       Filling,
        price:       Money,
        tip:         Money,
    },

    // ── Economy ───────────────────────────────────
    ReputationChanged {
        tick:       Tick,
        reputation: u32,
        delta:      i64,
    },
    UpgradePurchased {
        tick:      Tick,
        upgrade:   UpgradeId,
        level:     u32,
        paid:      Money,
        next_cost: Money,
    },
    FillingSelected {
        tick:    Tick,
        filling: Filling,
    },

    // ── Day ───────────────────────────────────────
    DayStartRequested {
        tick: Tick,
        day:  u32,
    },
    DayStarted {
        tick:     Tick,
        day:      u32,
        title:    String,
        effect:   EventEffect,
        fallback: bool,
    },
    CountdownTicked {
        tick:      Tick,
        remaining: u32,
    },
    DayEnded {
        tick:   Tick,
        day:    u32,
        served: u32,
        burnt:  u32,
        earned: Money,
    },
    ReviewReceived {
        tick:     Tick,
        day:      u32,
        fallback: bool,
    },
    DayAdvanced {
        tick: Tick,
        day:  u32,
    },
    NarrativeFallback {
        tick:    Tick,
        request: String,
        reason:  String,
    },

    // ── Player actions ────────────────────────────
    /// A player action that was a no-op (mid-cook click, no stock, …).
    ActionIgnored {
        tick:   Tick,
        action: String,
        reason: String,
    },

    // ── Settings ──────────────────────────────────
    LanguageChanged {
        tick:     Tick,
        language: Language,
    },
}

impl SimEvent {
    /// Stable name for the journal's event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }     => "run_initialized",
            Self::DoughPoured { .. }        => "dough_poured",
            Self::MoldFilled { .. }         => "mold_filled",
            Self::CookingStarted { .. }     => "cooking_started",
            Self::BunCooked { .. }          => "bun_cooked",
            Self::BunBurnt { .. }           => "bun_burnt",
            Self::BunHarvested { .. }       => "bun_harvested",
            Self::BunDiscarded { .. }       => "bun_discarded",
            Self::MoldAdded { .. }          => "mold_added",
            Self::CustomerArrived { .. }    => "customer_arrived",
            Self::CustomerWalkedAway { .. } => "customer_walked_away",
            Self::CustomerServed { .. }     => "customer_served",
            Self::ReputationChanged { .. }  => "reputation_changed",
            Self::UpgradePurchased { .. }   => "upgrade_purchased",
            Self::FillingSelected { .. }    => "filling_selected",
            Self::DayStartRequested { .. }  => "day_start_requested",
            Self::DayStarted { .. }         => "day_started",
            Self::CountdownTicked { .. }    => "countdown_ticked",
            Self::DayEnded { .. }           => "day_ended",
            Self::ReviewReceived { .. }     => "review_received",
            Self::DayAdvanced { .. }        => "day_advanced",
            Self::NarrativeFallback { .. }  => "narrative_fallback",
            Self::ActionIgnored { .. }      => "action_ignored",
            Self::LanguageChanged { .. }    => "language_changed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub tick:       Tick,
    pub subsystem:  String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
