//! Localization lookup. The core never formats user-facing text itself;
//! it hands semantic keys and parameters to a Translator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

impl Language {
    /// Name used when asking the narrative provider for text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ko => "Korean",
            Self::En => "English",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ko" => Ok(Self::Ko),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

pub trait Translator: Send + Sync {
    /// Look up `key` and substitute `{name}` placeholders from `params`.
    /// Unknown keys come back verbatim.
    fn translate(&self, language: Language, key: &str, params: &[(&str, String)]) -> String;
}

/// The built-in string tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Translator for Catalog {
    fn translate(&self, language: Language, key: &str, params: &[(&str, String)]) -> String {
        let table = match language {
            Language::En => EN,
            Language::Ko => KO,
        };
        let mut text = table
            .iter()
            .find(|(k, _)| *k == key)
            .map_or_else(|| key.to_string(), |(_, v)| (*v).to_string());
        for (name, value) in params {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

const EN: &[(&str, &str)] = &[
    ("filling_none", "None"),
    ("filling_redbean", "Red Bean"),
    ("filling_custard", "Custard"),
    ("filling_nutella", "Nutella"),
    ("event_rush", "RUSH"),
    ("event_slow", "SLOW"),
    ("event_rich", "RICH"),
    ("event_normal", "NORMAL"),
    ("default_event_title", "Sunny Day"),
    ("default_event_desc", "Perfect weather for snacks!"),
    ("default_review", "Great hustle today! The fish buns smelled delicious."),
    ("day_complete", "Day {day} Complete!"),
    ("start_day_title", "Start Day {day}"),
    ("upgrade_mold_name", "Extra Mold Slot"),
    ("upgrade_mold_desc", "Cook more Bungeoppang at once."),
    ("upgrade_speed_name", "Better Burner"),
    ("upgrade_speed_desc", "Cooks Bungeoppang faster."),
    ("upgrade_marketing_name", "Cute Signboard"),
    ("upgrade_marketing_desc", "Attracts richer customers and increases patience."),
    ("stat_served", "Served"),
    ("stat_burnt", "Burnt"),
    ("stat_earnings", "Total Earnings"),
];

const KO: &[(&str, &str)] = &[
    ("filling_none", "없음"),
    ("filling_redbean", "팥"),
    ("filling_custard", "슈크림"),
    ("filling_nutella", "누텔라"),
    ("event_rush", "손님 폭주"),
    ("event_slow", "한산함"),
    ("event_rich", "부자 손님"),
    ("event_normal", "평범함"),
    ("default_event_title", "맑은 날"),
    ("default_event_desc", "간식 먹기 딱 좋은 날씨네요!"),
    ("default_review", "오늘 정말 고생 많았어요! 붕어빵 냄새가 정말 좋네요."),
    ("day_complete", "{day}일차 영업 종료!"),
    ("start_day_title", "{day}일차 영업 시작"),
    ("upgrade_mold_name", "추가 붕어빵 틀"),
    ("upgrade_mold_desc", "한 번에 더 많은 붕어빵을 구울 수 있습니다."),
    ("upgrade_speed_name", "고화력 버너"),
    ("upgrade_speed_desc", "붕어빵이 더 빨리 익습니다."),
    ("upgrade_marketing_name", "귀여운 간판"),
    ("upgrade_marketing_desc", "손님들의 인내심이 늘어나고 팁을 줄 확률이 높습니다."),
    ("stat_served", "판매량"),
    ("stat_burnt", "태운 것"),
    ("stat_earnings", "총 수익"),
];
