use crate::{
    economy::UpgradeId,
    locale::Language,
    types::{CustomerId, Filling, MoldId},
};
use serde::{Deserialize, Serialize};

/// All player-issued commands, one per presentation entry point.
/// Variants are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Stall ─────────────────────────────────────
    InteractMold { mold_id: MoldId },
    ServeCustomer { customer_id: CustomerId },
    SelectFilling { filling: Filling },

    // ── Lobby ─────────────────────────────────────
    PurchaseUpgrade { upgrade: UpgradeId },
    StartDay,

    // ── Day flow ──────────────────────────────────
    /// Force the countdown to zero.
    EndDayNow,
    AdvanceDay,

    SetLanguage { language: Language },
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InteractMold { .. }    => "interact_mold",
            Self::ServeCustomer { .. }   => "serve_customer",
            Self::SelectFilling { .. }   => "select_filling",
            Self::PurchaseUpgrade { .. } => "purchase_upgrade",
            Self::StartDay               => "start_day",
            Self::EndDayNow              => "end_day_now",
            Self::AdvanceDay             => "advance_day",
            Self::SetLanguage { .. }     => "set_language",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_a_cmd_tag() {
        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"purchase_upgrade","upgrade":"cook_speed"}"#).unwrap();
        assert_eq!(cmd, PlayerCommand::PurchaseUpgrade { upgrade: UpgradeId::CookSpeed });

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"select_filling","filling":"NUTELLA"}"#).unwrap();
        assert_eq!(cmd, PlayerCommand::SelectFilling { filling: Filling::Nutella });

        assert_eq!(serde_json::to_string(&PlayerCommand::StartDay).unwrap(), r#"{"cmd":"start_day"}"#);
    }
}
