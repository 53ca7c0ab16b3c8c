//! Subsystem trait and the per-tick parameter slice.
//!
//! RULE: Every ticked subsystem implements SimSubsystem.
//! The engine calls update() on each one in a fixed order, every
//! effective tick while a day is active. Subsystems own their entity
//! lists and see the rest of the session only through TickParams;
//! cross-cutting effects (reputation penalties, stats) are returned
//! as events and applied by the engine.

use crate::{error::SimResult, event::SimEvent, rng::SubsystemRng, types::{Filling, Tick}};

/// Read-only values derived from session state at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickParams {
    /// `cook_rate_base × cook_speed_multiplier`
    pub cook_step:       f64,
    pub burn_step:       f64,
    /// Spawn counter must exceed this before a customer arrives.
    pub spawn_threshold: f64,
    pub max_customers:   usize,
    /// `patience_decay_base / patience_divisor`
    pub patience_decay:  f64,
    pub max_patience:    f64,
    pub avatar_count:    u32,
    /// Fillings a new customer may order.
    pub order_pool:      Vec<Filling>,
}

/// The contract every ticked subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name, used as the journal's subsystem column.
    fn name(&self) -> &'static str;

    /// Called once per effective tick by the engine.
    fn update(
        &mut self,
        tick: Tick,
        params: &TickParams,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;

    /// Return to the start-of-day state.
    fn reset_for_day(&mut self);
}
