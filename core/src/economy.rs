//! Money, reputation and the upgrade shop.
//!
//! Upgrades feed back into the simulation only through the multipliers
//! exposed here; `mold_count` is the one structural upgrade and its
//! side effect (a new mold) is applied by the engine.

use crate::{
    config::{SimConfig, UpgradeConfig},
    inventory::HoldingArea,
    types::Money,
};
use serde::{Deserialize, Serialize};

/// Process-wide session state. Lives for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub money:        Money,
    pub day:          u32,
    pub reputation:   u32,
    pub holding_area: HoldingArea,
}

impl GameState {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            money:        config.starting_money,
            day:          1,
            reputation:   config.starting_reputation,
            holding_area: HoldingArea::new(),
        }
    }

    /// Queue capacity: base + one slot per `per_slot` reputation.
    pub fn customer_cap(&self, base: u32, per_slot: u32) -> usize {
        let extra = if per_slot == 0 { 0 } else { self.reputation / per_slot };
        (base + extra) as usize
    }

    /// Lower reputation, floored at zero. Returns the applied delta.
    pub fn penalize(&mut self, amount: u32) -> i64 {
        let before = self.reputation;
        self.reputation = self.reputation.saturating_sub(amount);
        i64::from(self.reputation) - i64::from(before)
    }

    pub fn credit_sale(&mut self, total: Money, reputation_gain: u32) {
        self.money += total;
        self.reputation += reputation_gain;
    }
}

/// Price and tip of a single sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub price: Money,
    pub tip:   Money,
}

impl Sale {
    /// `tip = floor(price × tip_ratio)` when tipping applies, else 0.
    pub fn new(price: Money, tip_ratio: f64, tipping: bool) -> Self {
        let tip = if tipping {
            (price as f64 * tip_ratio).floor() as Money
        } else {
            0
        };
        Self { price, tip }
    }

    pub fn total(&self) -> Money {
        self.price + self.tip
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    MoldCount,
    CookSpeed,
    Marketing,
}

impl UpgradeId {
    pub fn name_key(&self) -> &'static str {
        match self {
            Self::MoldCount => "upgrade_mold_name",
            Self::CookSpeed => "upgrade_speed_name",
            Self::Marketing => "upgrade_marketing_name",
        }
    }

    pub fn description_key(&self) -> &'static str {
        match self {
            Self::MoldCount => "upgrade_mold_desc",
            Self::CookSpeed => "upgrade_speed_desc",
            Self::Marketing => "upgrade_marketing_desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id:          UpgradeId,
    pub name:        String,
    pub description: String,
    pub cost:        Money,
    pub level:       u32,
    pub max_level:   u32,
}

impl Upgrade {
    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }
}

impl From<&UpgradeConfig> for Upgrade {
    fn from(c: &UpgradeConfig) -> Self {
        Self {
            id:          c.id,
            name:        c.id.name_key().into(),
            description: c.id.description_key().into(),
            cost:        c.cost,
            level:       c.level,
            max_level:   c.max_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { level: u32, paid: Money, next_cost: Money },
    Unknown,
    MaxLevel,
    InsufficientFunds { cost: Money },
}

/// The fixed set of upgrades for this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeBook {
    upgrades:    Vec<Upgrade>,
    step:        f64,
    cost_growth: f64,
}

impl UpgradeBook {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            upgrades:    config.upgrades.iter().map(Upgrade::from).collect(),
            step:        config.upgrade_step,
            cost_growth: config.upgrade_cost_growth,
        }
    }

    pub fn get(&self, id: UpgradeId) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn all(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Current level; an upgrade missing from the catalog counts as level 1.
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.get(id).map_or(1, |u| u.level)
    }

    /// `1 + level(cook_speed) × step`
    pub fn cook_speed_multiplier(&self) -> f64 {
        1.0 + f64::from(self.level(UpgradeId::CookSpeed)) * self.step
    }

    /// Divisor applied to patience decay: `1 + level(marketing) × step`
    pub fn patience_divisor(&self) -> f64 {
        1.0 + f64::from(self.level(UpgradeId::Marketing)) * self.step
    }

    /// Buy one level. Rejections leave both `money` and the book untouched.
    pub fn purchase(&mut self, id: UpgradeId, money: &mut Money) -> PurchaseOutcome {
        let growth = self.cost_growth;
        let Some(upgrade) = self.upgrades.iter_mut().find(|u| u.id == id) else {
            return PurchaseOutcome::Unknown;
        };
        if upgrade.is_maxed() {
            return PurchaseOutcome::MaxLevel;
        }
        if *money < upgrade.cost {
            return PurchaseOutcome::InsufficientFunds { cost: upgrade.cost };
        }

        let paid = upgrade.cost;
        *money -= paid;
        upgrade.level += 1;
        upgrade.cost = (upgrade.cost as f64 * growth).floor() as Money;
        debug_assert!(upgrade.level <= upgrade.max_level);

        PurchaseOutcome::Purchased {
            level: upgrade.level,
            paid,
            next_cost: upgrade.cost,
        }
    }
}
