//! Mold subsystem: the bun production line.
//!
//! Lifecycle per mold:
//!   Empty → Dough → Filled → Cooking → Cooked → Burnt
//! with Cooked (harvest) and Burnt (discard) both returning to Empty.
//!
//! Player clicks drive every transition except Cooking → Cooked and
//! Cooked → Burnt, which only happen on tick.
//!
//! NOTE: `cook_progress` carries two meanings. While Cooking it is the
//! cook timer; on reaching 100 the mold flips to Cooked and the same
//! field restarts from 0 as the burn clock. Do not split it.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickParams},
    types::{Filling, MoldId, Tick},
};
use serde::{Deserialize, Serialize};

pub const PROGRESS_FULL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoldState {
    Empty,
    Dough,
    Filled,
    Cooking,
    Cooked,
    Burnt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mold {
    pub id:            MoldId,
    pub state:         MoldState,
    pub filling:       Filling,
    pub cook_progress: f64,
}

/// What a single player click did to a mold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Poured,
    Filled(Filling),
    StartedCooking(Filling),
    /// Clicking a cooking mold does nothing.
    StillCooking,
    Harvested(Filling),
    Discarded(Filling),
}

/// A tick-driven state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Cooked(Filling),
    Burnt(Filling),
}

impl Mold {
    pub fn new(id: MoldId) -> Self {
        Self {
            id,
            state:         MoldState::Empty,
            filling:       Filling::None,
            cook_progress: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.state = MoldState::Empty;
        self.filling = Filling::None;
        self.cook_progress = 0.0;
    }

    /// Apply one player click. `selected` is the globally selected filling,
    /// only read on Dough → Filled.
    pub fn interact(&mut self, selected: Filling) -> Interaction {
        match self.state {
            MoldState::Empty => {
                self.state = MoldState::Dough;
                Interaction::Poured
            }
            MoldState::Dough => {
                assert_ne!(selected, Filling::None, "filling a mold with nothing");
                self.state = MoldState::Filled;
                self.filling = selected;
                Interaction::Filled(selected)
            }
            MoldState::Filled => {
                self.state = MoldState::Cooking;
                self.cook_progress = 0.0;
                Interaction::StartedCooking(self.filling)
            }
            MoldState::Cooking => Interaction::StillCooking,
            MoldState::Cooked => {
                let filling = self.filling;
                self.reset();
                Interaction::Harvested(filling)
            }
            MoldState::Burnt => {
                let filling = self.filling;
                self.reset();
                Interaction::Discarded(filling)
            }
        }
    }

    /// Advance one tick. Only Cooking and Cooked molds move.
    pub fn advance(&mut self, cook_step: f64, burn_step: f64) -> Option<Transition> {
        match self.state {
            MoldState::Cooking => {
                let progress = self.cook_progress + cook_step;
                if progress >= PROGRESS_FULL {
                    // Done; the field now becomes the burn clock.
                    self.state = MoldState::Cooked;
                    self.cook_progress = 0.0;
                    Some(Transition::Cooked(self.filling))
                } else {
                    self.cook_progress = progress;
                    None
                }
            }
            MoldState::Cooked => {
                let burn = self.cook_progress + burn_step;
                if burn > PROGRESS_FULL {
                    // Burn clock keeps its last in-range value.
                    self.state = MoldState::Burnt;
                    Some(Transition::Burnt(self.filling))
                } else {
                    self.cook_progress = burn;
                    None
                }
            }
            _ => None,
        }
    }
}

pub struct MoldSubsystem {
    molds: Vec<Mold>,
}

impl MoldSubsystem {
    pub fn new(count: u32) -> Self {
        let mut subsystem = Self { molds: Vec::with_capacity(count as usize) };
        for _ in 0..count {
            subsystem.add_mold();
        }
        subsystem
    }

    /// Append one Empty mold. Ids are 1-based and never reused.
    pub fn add_mold(&mut self) -> MoldId {
        let id = self.molds.len() as MoldId + 1;
        self.molds.push(Mold::new(id));
        id
    }

    pub fn get_mut(&mut self, id: MoldId) -> Option<&mut Mold> {
        self.molds.iter_mut().find(|m| m.id == id)
    }

    pub fn molds(&self) -> &[Mold] {
        &self.molds
    }
}

impl SimSubsystem for MoldSubsystem {
    fn name(&self) -> &'static str {
        "mold"
    }

    fn update(
        &mut self,
        tick: Tick,
        params: &TickParams,
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        for mold in &mut self.molds {
            match mold.advance(params.cook_step, params.burn_step) {
                Some(Transition::Cooked(filling)) => {
                    log::debug!("tick={tick} mold: #{} cooked ({filling:?})", mold.id);
                    out.push(SimEvent::BunCooked { tick, mold_id: mold.id, filling });
                }
                Some(Transition::Burnt(filling)) => {
                    log::debug!("tick={tick} mold: #{} burnt ({filling:?})", mold.id);
                    out.push(SimEvent::BunBurnt { tick, mold_id: mold.id, filling });
                }
                None => {}
            }
        }
        Ok(out)
    }

    fn reset_for_day(&mut self) {
        self.molds.iter_mut().for_each(Mold::reset);
    }
}
