//! Request/response records for hand analysis.
//!
//! Requests arrive as loosely-typed JSON (tile names in any encoding, null
//! entries allowed); responses are `{ok, result}` on success and
//! `{ok: false, error, error_kind}` on failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tehai_engine::errors::{EngineError, EngineResult, ErrorKind};
use tehai_engine::evaluator::{EvaluatorError, HandValue, HandValueEvaluator, HandValueRequest};
use tehai_engine::meld::{convert_to_melds, MeldDeclaration};
use tehai_engine::rule::{OptionalRules, RuleConfig};
use tehai_engine::shanten::WaitResult;
use tehai_engine::tile::{normalize, parse_tile, Tile, TileEncoding};
use tehai_engine::types::{Hand, Meld, Wind, FULL_HAND_SIZE};

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(error: impl ToString, error_kind: Option<ErrorKind>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.to_string()),
            error_kind,
        }
    }
}

impl<T> From<EngineResult<T>> for ApiResponse<T> {
    fn from(res: EngineResult<T>) -> Self {
        match res {
            Ok(v) => Self::success(v),
            Err(e) => Self::failure(&e, Some(e.kind())),
        }
    }
}

impl<T> From<Result<T, EvaluatorError>> for ApiResponse<T> {
    fn from(res: Result<T, EvaluatorError>) -> Self {
        match res {
            Ok(v) => Self::success(v),
            Err(EvaluatorError::Engine(e)) => Self::failure(&e, Some(e.kind())),
            Err(e) => Self::failure(e, None),
        }
    }
}

fn declared_melds(melds: &[MeldDeclaration]) -> EngineResult<Vec<Meld>> {
    let actions = melds
        .iter()
        .map(MeldDeclaration::to_action)
        .collect::<EngineResult<Vec<_>>>()?;
    convert_to_melds(actions)
}

fn optional_tile(raw: Option<&str>) -> EngineResult<Option<Tile>> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => parse_tile(s).map(Some),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Tenpai analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenpaiRequest {
    pub hand: Vec<Option<String>>,
    pub melds: Vec<MeldDeclaration>,
    /// Encoding of the returned waits; MJAI names when absent.
    pub encoding: Option<TileEncoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenpaiStatus {
    Agari,
    Shanten,
    Tenpai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenpaiReport {
    pub status: TenpaiStatus,
    pub shanten: i8,
    pub waits: Vec<String>,
}

impl TenpaiReport {
    fn from_waits(result: &WaitResult, encoding: TileEncoding) -> Self {
        let status = match result {
            WaitResult::Complete => TenpaiStatus::Agari,
            WaitResult::Shanten(_) => TenpaiStatus::Shanten,
            WaitResult::Tenpai(_) => TenpaiStatus::Tenpai,
        };
        Self {
            status,
            shanten: result.shanten(),
            waits: result
                .waits()
                .iter()
                .map(|&k| Tile::from(k).to_display(encoding))
                .collect(),
        }
    }
}

/// Shanten and waits of a declared hand.
///
/// A 13-tile shape (melds counted as three) reports waits. A 14-tile shape
/// reports `agari` when complete and its shanten otherwise.
pub fn analyze_tenpai(req: &TenpaiRequest) -> EngineResult<TenpaiReport> {
    let concealed = normalize(req.hand.iter().map(|t| t.as_deref()))?;
    let melds = declared_melds(&req.melds)?;
    let hand = Hand::new(concealed, melds, None)?;
    let encoding = req.encoding.unwrap_or(TileEncoding::Mjai);

    let size = hand.concealed().len() + 3 * hand.melds().len();
    let report = if size == FULL_HAND_SIZE {
        let shanten = hand.shanten();
        TenpaiReport {
            status: if shanten < 0 {
                TenpaiStatus::Agari
            } else {
                TenpaiStatus::Shanten
            },
            shanten,
            waits: Vec::new(),
        }
    } else {
        TenpaiReport::from_waits(&hand.waits()?, encoding)
    };
    debug!(status = ?report.status, shanten = report.shanten, "tenpai analysis");
    Ok(report)
}

pub fn respond_tenpai(req: &TenpaiRequest) -> ApiResponse<TenpaiReport> {
    let res = analyze_tenpai(req);
    if let Err(e) = &res {
        warn!(error = %e, "tenpai request rejected");
    }
    res.into()
}

// ---------------------------------------------------------------------------
// Hand value analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    #[default]
    Ron,
    Tsumo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandAnalysisRequest {
    pub hand: Vec<Option<String>>,
    pub win_tile: Option<String>,
    pub melds: Vec<MeldDeclaration>,
    pub dora_indicators: Vec<Option<String>>,
    pub seat_wind: Wind,
    pub round_wind: Wind,
    pub win_type: WinType,
    pub riichi: bool,
    pub ippatsu: bool,
    pub riichi_sticks: u32,
    pub honba: u32,
    /// Optional rules; red fives are enabled automatically when the hand
    /// holds one.
    pub rules: Option<OptionalRules>,
}

impl HandAnalysisRequest {
    /// Validated hand plus the evaluator request.
    pub fn prepare(&self) -> EngineResult<(Hand, HandValueRequest)> {
        let concealed = normalize(self.hand.iter().map(|t| t.as_deref()))?;
        let win_tile = optional_tile(self.win_tile.as_deref())?;
        let melds = declared_melds(&self.melds)?;
        let hand = Hand::new(concealed, melds, win_tile)?;
        let indicators = normalize(self.dora_indicators.iter().map(|t| t.as_deref()))?;

        let mut options = self.rules.unwrap_or_default();
        options.has_aka_dora |= hand.all_tiles().iter().any(|t| t.is_red());
        let config = RuleConfig {
            is_tsumo: self.win_type == WinType::Tsumo,
            is_riichi: self.riichi,
            is_ippatsu: self.ippatsu,
            player_wind: self.seat_wind,
            round_wind: self.round_wind,
            kyoutaku_number: self.riichi_sticks,
            tsumi_number: self.honba,
            options,
            ..RuleConfig::default()
        };
        let request = HandValueRequest::new(&hand, &indicators, config)?;
        Ok((hand, request))
    }
}

/// Validates the request and hands it to `evaluator`.
pub fn analyze_hand_value(
    req: &HandAnalysisRequest,
    evaluator: &dyn HandValueEvaluator,
) -> Result<HandValue, EvaluatorError> {
    let (hand, request) = req.prepare()?;
    if hand.win_tile().is_none() {
        return Err(EngineError::InvalidSize {
            expected: FULL_HAND_SIZE,
            actual: hand.concealed().len() + 3 * hand.melds().len(),
        }
        .into());
    }
    let value = evaluator.estimate_hand_value(&request)?;
    info!(han = value.han, fu = value.fu, cost = value.cost.main, "hand evaluated");
    Ok(value)
}

pub fn respond_hand_value(
    req: &HandAnalysisRequest,
    evaluator: &dyn HandValueEvaluator,
) -> ApiResponse<HandValue> {
    let res = analyze_hand_value(req, evaluator);
    if let Err(e) = &res {
        warn!(error = %e, "hand value request rejected");
    }
    res.into()
}
