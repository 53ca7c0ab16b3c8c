//! Read-only view of a session for the presentation layer.
//!
//! The presentation layer renders from snapshots and talks back only
//! through PlayerCommand; it never holds simulation state.

use crate::{
    customer_subsystem::Customer,
    day_controller::{DailyEvent, DayPhase, DayStats},
    economy::{GameState, Upgrade},
    locale::Language,
    mold_subsystem::Mold,
    types::{Filling, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tick:             Tick,
    pub phase:            DayPhase,
    pub is_day_active:    bool,
    pub day_ended:        bool,
    pub loading:          bool,
    pub time_remaining:   u32,
    pub game_state:       GameState,
    pub molds:            Vec<Mold>,
    pub customers:        Vec<Customer>,
    pub max_customers:    usize,
    pub upgrades:         Vec<Upgrade>,
    pub daily_event:      Option<DailyEvent>,
    pub day_stats:        DayStats,
    pub selected_filling: Filling,
    pub cook_speed:       f64,
    pub language:         Language,
}
