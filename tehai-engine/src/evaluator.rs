//! Contract with the external hand-value (han / fu / points) evaluator.
//!
//! Scoring itself is not implemented here. The engine prepares a request in
//! the evaluator's 136-index encoding and consumes the returned value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::EngineError;
use crate::rule::RuleConfig;
use crate::tile::{tile_from_136, Tile, Tile136Allocator};
use crate::types::{Hand, MeldType};

/// A meld in 136-index form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorMeld {
    pub meld_type: MeldType,
    pub tiles: Vec<u32>,
    pub opened: bool,
    pub called_tile: Option<u32>,
}

/// Everything the evaluator needs for one hand.
///
/// `tiles` holds every tile of the hand, meld tiles and the winning tile
/// included; meld and winning-tile ids are drawn from the same allocation so
/// they refer to entries of `tiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandValueRequest {
    pub tiles: Vec<u32>,
    pub win_tile: Option<u32>,
    pub melds: Vec<EvaluatorMeld>,
    pub dora_indicators: Vec<u32>,
    pub config: RuleConfig,
}

impl HandValueRequest {
    pub fn new(
        hand: &Hand,
        dora_indicators: &[Tile],
        config: RuleConfig,
    ) -> Result<Self, EngineError> {
        let mut alloc = Tile136Allocator::new();
        let mut tiles = Vec::with_capacity(18);

        let mut melds = Vec::with_capacity(hand.melds().len());
        for meld in hand.melds() {
            let ids = meld.to_136(&mut alloc)?;
            let called_tile = match meld.called_tile() {
                Some(called) => ids
                    .iter()
                    .copied()
                    .find(|&id| tile_from_136(id) == Some(called)),
                None => None,
            };
            tiles.extend_from_slice(&ids);
            melds.push(EvaluatorMeld {
                meld_type: meld.meld_type,
                tiles: ids,
                opened: meld.is_opened(),
                called_tile,
            });
        }

        let win_tile = match hand.win_tile() {
            Some(win) => {
                let id = alloc.allocate(win)?;
                tiles.push(id);
                Some(id)
            }
            None => None,
        };
        tiles.extend(alloc.allocate_all(hand.concealed())?);
        tiles.sort_unstable();

        // Indicators are separate physical tiles.
        let dora_indicators = Tile136Allocator::new().allocate_all(dora_indicators)?;

        Ok(Self {
            tiles,
            win_tile,
            melds,
            dora_indicators,
            config,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub main: u32,
    pub additional: u32,
}

/// Evaluator result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandValue {
    pub han: u32,
    pub fu: u32,
    pub cost: Cost,
    pub yaku: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("hand is not winning")]
    NotWinning,
    #[error("no yaku")]
    NoYaku,
    #[error("evaluator failure: {0}")]
    Backend(String),
}

/// An external scorer.
pub trait HandValueEvaluator: Send + Sync {
    fn estimate_hand_value(&self, request: &HandValueRequest) -> Result<HandValue, EvaluatorError>;
}
