//! Tuning parameters for the stall.
//!
//! The per-tick rates below are calibrated against a 50 ms tick. If
//! `tick_interval_ms` changes, rescale `cook_rate_base`, `burn_rate` and
//! `patience_decay_base` proportionally to keep real-time pacing.

use crate::{
    economy::UpgradeId,
    error::{SimError, SimResult},
    types::{Filling, Money},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub red_bean: Money,
    pub custard:  Money,
    pub nutella:  Money,
}

impl PriceTable {
    pub fn price(&self, filling: Filling) -> Money {
        match filling {
            Filling::None    => 0,
            Filling::RedBean => self.red_bean,
            Filling::Custard => self.custard,
            Filling::Nutella => self.nutella,
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self { red_bean: 500, custard: 700, nutella: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    pub id:        UpgradeId,
    pub cost:      Money,
    pub level:     u32,
    pub max_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Minimum wall-clock gap between two effective ticks.
    pub tick_interval_ms: u64,
    pub day_length_secs:  u32,

    // ── Cooking ───────────────────────────────────
    /// Cook progress per tick, before the cook_speed multiplier.
    pub cook_rate_base: f64,
    /// Burn-clock progress per tick once a bun is cooked.
    pub burn_rate:      f64,

    // ── Customers ─────────────────────────────────
    pub patience_decay_base: f64,
    /// Ticks between spawns on a NORMAL day.
    pub spawn_rate_base:     f64,
    pub max_patience:        f64,
    pub base_customer_cap:   u32,
    /// Reputation points per additional queue slot.
    pub reputation_per_slot: u32,
    /// Nutella orders appear once `day > nutella_unlock_day`.
    pub nutella_unlock_day:  u32,
    pub avatar_count:        u32,

    // ── Economy ───────────────────────────────────
    pub starting_money:      Money,
    pub starting_reputation: u32,
    pub starting_molds:      u32,
    pub prices:              PriceTable,
    /// Tip as a fraction of the price on a RICH day.
    pub tip_ratio:           f64,
    pub walk_away_penalty:   u32,
    pub serve_reputation:    u32,
    /// Multiplier gained per upgrade level (cook speed, patience).
    pub upgrade_step:        f64,
    pub upgrade_cost_growth: f64,
    pub upgrades:            Vec<UpgradeConfig>,

    // ── Narrative provider ────────────────────────
    pub narrative_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms:     50,
            day_length_secs:      60,
            cook_rate_base:       0.5,
            burn_rate:            0.2,
            patience_decay_base:  0.1,
            spawn_rate_base:      200.0,
            max_patience:         100.0,
            base_customer_cap:    3,
            reputation_per_slot:  10,
            nutella_unlock_day:   3,
            avatar_count:         5,
            starting_money:       1000,
            starting_reputation:  10,
            starting_molds:       3,
            prices:               PriceTable::default(),
            tip_ratio:            0.5,
            walk_away_penalty:    2,
            serve_reputation:     1,
            upgrade_step:         0.2,
            upgrade_cost_growth:  1.5,
            upgrades: vec![
                UpgradeConfig { id: UpgradeId::MoldCount, cost: 2000, level: 1, max_level: 3 },
                UpgradeConfig { id: UpgradeId::CookSpeed, cost: 1500, level: 1, max_level: 5 },
                UpgradeConfig { id: UpgradeId::Marketing, cost: 3000, level: 1, max_level: 3 },
            ],
            narrative_timeout_ms: 5_000,
        }
    }
}

impl SimConfig {
    /// Load a tuning file. Missing fields fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(SimError::Config("tick_interval_ms must be > 0".into()));
        }
        if self.day_length_secs == 0 {
            return Err(SimError::Config("day_length_secs must be > 0".into()));
        }
        if self.avatar_count == 0 {
            return Err(SimError::Config("avatar_count must be > 0".into()));
        }
        if self.max_patience <= 0.0 {
            return Err(SimError::Config("max_patience must be > 0".into()));
        }
        if self.cook_rate_base <= 0.0 || self.burn_rate <= 0.0 || self.patience_decay_base <= 0.0 {
            return Err(SimError::Config("per-tick rates must be > 0".into()));
        }
        for u in &self.upgrades {
            if u.level > u.max_level {
                return Err(SimError::Config(format!(
                    "upgrade {:?} starts above its max level ({} > {})",
                    u.id, u.level, u.max_level
                )));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_millis(self.narrative_timeout_ms)
    }
}
