//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// One effective simulation tick (~50 ms of wall-clock time).
/// Monotonic across days; never reset.
pub type Tick = u64;

/// Stable, 1-based mold identifier. Never reused.
pub type MoldId = u32;

/// Unique customer token, derived from the seeded RNG.
pub type CustomerId = uuid::Uuid;

/// In-game currency (whole won).
pub type Money = i64;

/// The canonical run identifier used by the event journal.
pub type RunId = String;

/// What goes inside a bun, and what a customer orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Filling {
    None,
    RedBean,
    Custard,
    Nutella,
}

impl Filling {
    /// Fillings a player can put into a mold.
    pub const SELECTABLE: [Filling; 3] = [Filling::RedBean, Filling::Custard, Filling::Nutella];

    /// Localization key for the filling's display name.
    pub fn name_key(&self) -> &'static str {
        match self {
            Self::None    => "filling_none",
            Self::RedBean => "filling_redbean",
            Self::Custard => "filling_custard",
            Self::Nutella => "filling_nutella",
        }
    }
}
