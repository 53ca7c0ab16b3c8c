//! Scripted player for headless runs.
//!
//! Each call to `act` looks at the session and issues whatever commands a
//! sensible stall owner would: keep the molds busy with the most wanted
//! filling, harvest and discard, serve anyone whose bun is in stock, and
//! spend savings in the lobby before opening.

use fishbun_core::{
    day_controller::DayPhase,
    economy::UpgradeId,
    engine::SimEngine,
    error::SimResult,
    mold_subsystem::MoldState,
    types::{Filling, MoldId},
};

/// One finished day, as printed by the runner.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub day:        u32,
    pub title:      String,
    pub effect:     String,
    pub served:     u32,
    pub burnt:      u32,
    pub earned:     i64,
    pub money:      i64,
    pub reputation: u32,
    pub review:     String,
}

#[derive(Debug, Default)]
pub struct Autopilot {
    reports: Vec<DayReport>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[DayReport] {
        &self.reports
    }

    /// Issue this frame's commands. Returns a report when a day was closed
    /// out and the session moved back to the lobby.
    pub fn act(&mut self, engine: &mut SimEngine) -> SimResult<Option<DayReport>> {
        if engine.is_loading() {
            return Ok(None);
        }
        match engine.phase() {
            DayPhase::Lobby => {
                if let Some(upgrade) = cheapest_affordable(engine) {
                    engine.purchase_upgrade(upgrade)?;
                }
                engine.start_day()?;
                Ok(None)
            }
            DayPhase::Active => {
                self.work_the_stall(engine)?;
                Ok(None)
            }
            DayPhase::Ended => {
                let report = day_report(engine);
                engine.advance_day()?;
                self.reports.push(report.clone());
                Ok(Some(report))
            }
        }
    }

    fn work_the_stall(&mut self, engine: &mut SimEngine) -> SimResult<()> {
        let wanted = most_requested(engine);
        if engine.selected_filling() != wanted {
            engine.select_filling(wanted)?;
        }

        let ready: Vec<MoldId> = engine
            .molds()
            .iter()
            .filter(|m| m.state != MoldState::Cooking)
            .map(|m| m.id)
            .collect();
        for mold_id in ready {
            engine.interact_mold(mold_id)?;
        }

        let servable: Vec<_> = engine
            .customers()
            .iter()
            .filter(|c| engine.state().holding_area.count(c.order) > 0)
            .map(|c| c.id)
            .collect();
        for customer_id in servable {
            // Stock may run out part way through the queue.
            engine.serve_customer(customer_id)?;
        }
        Ok(())
    }
}

/// Filling most ordered by the queue, less what is already in stock.
fn most_requested(engine: &SimEngine) -> Filling {
    let holding = &engine.state().holding_area;
    Filling::SELECTABLE
        .iter()
        .copied()
        .map(|f| {
            let orders = engine.customers().iter().filter(|c| c.order == f).count() as i64;
            (f, orders - i64::from(holding.count(f)))
        })
        .filter(|(_, shortfall)| *shortfall > 0)
        .max_by_key(|(_, shortfall)| *shortfall)
        .map_or(engine.selected_filling(), |(f, _)| f)
}

fn cheapest_affordable(engine: &SimEngine) -> Option<UpgradeId> {
    let money = engine.state().money;
    engine
        .upgrades()
        .iter()
        .filter(|u| !u.is_maxed() && u.cost <= money)
        .min_by_key(|u| u.cost)
        .map(|u| u.id)
}

fn day_report(engine: &SimEngine) -> DayReport {
    let stats = engine.day_stats();
    DayReport {
        day:        engine.state().day,
        title:      engine.daily_event().map(|e| e.title.clone()).unwrap_or_default(),
        effect:     engine
            .daily_event()
            .map(|e| engine.translate(e.effect.label_key(), &[]))
            .unwrap_or_default(),
        served:     stats.served,
        burnt:      stats.burnt,
        earned:     stats.earned,
        money:      engine.state().money,
        reputation: engine.state().reputation,
        review:     stats.review.clone(),
    }
}
