use serde::{Deserialize, Serialize};

use crate::types::Wind;

/// Optional scoring rules forwarded to the hand-value evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionalRules {
    pub has_open_tanyao: bool,
    pub has_aka_dora: bool,
    pub has_double_yakuman: bool,
    /// Round 4 han 30 fu / 3 han 60 fu up to mangan.
    pub kiriage: bool,
    pub fu_for_open_pinfu: bool,
    pub fu_for_pinfu_tsumo: bool,
    pub renhou_as_yakuman: bool,
    pub has_daisharin: bool,
    pub has_daisharin_other_suits: bool,
    pub has_sashikomi_yakuman: bool,
    pub limit_to_sextuple_yakuman: bool,
    pub paarenchan_needs_yaku: bool,
    pub has_daichisei: bool,
}

impl Default for OptionalRules {
    fn default() -> Self {
        Self {
            has_open_tanyao: false,
            has_aka_dora: false,
            has_double_yakuman: false,
            kiriage: false,
            fu_for_open_pinfu: false,
            fu_for_pinfu_tsumo: false,
            renhou_as_yakuman: false,
            has_daisharin: false,
            has_daisharin_other_suits: false,
            has_sashikomi_yakuman: false,
            limit_to_sextuple_yakuman: false,
            paarenchan_needs_yaku: false,
            has_daichisei: false,
        }
    }
}

/// Situation flags and counters of a win, passed opaquely to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub is_tsumo: bool,
    pub is_riichi: bool,
    pub is_ippatsu: bool,
    pub is_rinshan: bool,
    pub is_chankan: bool,
    pub is_haitei: bool,
    pub is_houtei: bool,
    pub is_daburu_riichi: bool,
    pub is_nagashi_mangan: bool,
    pub is_tenhou: bool,
    pub is_renhou: bool,
    pub is_chiihou: bool,
    pub is_open_riichi: bool,

    pub player_wind: Wind,
    pub round_wind: Wind,

    /// Riichi sticks on the table.
    pub kyoutaku_number: u32,
    /// Honba counter.
    pub tsumi_number: u32,
    pub paarenchan: u32,

    pub options: OptionalRules,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            is_tsumo: false,
            is_riichi: false,
            is_ippatsu: false,
            is_rinshan: false,
            is_chankan: false,
            is_haitei: false,
            is_houtei: false,
            is_daburu_riichi: false,
            is_nagashi_mangan: false,
            is_tenhou: false,
            is_renhou: false,
            is_chiihou: false,
            is_open_riichi: false,
            player_wind: Wind::East,
            round_wind: Wind::East,
            kyoutaku_number: 0,
            tsumi_number: 0,
            paarenchan: 0,
            options: OptionalRules::default(),
        }
    }
}

impl RuleConfig {
    /// Common online ruleset: open tanyao and red fives.
    pub fn default_online() -> Self {
        Self {
            options: OptionalRules {
                has_open_tanyao: true,
                has_aka_dora: true,
                ..OptionalRules::default()
            },
            ..Self::default()
        }
    }

    /// Competition ruleset: no red fives, kiriage mangan, single yakuman cap.
    pub fn default_competition() -> Self {
        Self {
            options: OptionalRules {
                has_open_tanyao: true,
                kiriage: true,
                ..OptionalRules::default()
            },
            ..Self::default()
        }
    }

    /// Permissive local ruleset with double yakuman and optional yakuman.
    pub fn default_local() -> Self {
        Self {
            options: OptionalRules {
                has_open_tanyao: true,
                has_aka_dora: true,
                has_double_yakuman: true,
                renhou_as_yakuman: true,
                has_daisharin: true,
                limit_to_sextuple_yakuman: true,
                ..OptionalRules::default()
            },
            ..Self::default()
        }
    }

    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_winds(mut self, player_wind: Wind, round_wind: Wind) -> Self {
        self.player_wind = player_wind;
        self.round_wind = round_wind;
        self
    }
}
