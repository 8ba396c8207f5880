//! Discard analysis for a hand holding one tile too many.
//!
//! Computes the base shanten plus the shanten after each of the 34 possible
//! discards in one pass, then enumerates waits for the discards that leave
//! the hand tenpai.

use serde::Serialize;
use tracing::debug;

use tehai_engine::errors::{EngineError, EngineResult};
use tehai_engine::shanten::{calc_shanten_from_counts, waits_from_counts};
use tehai_engine::tile::{to_counts, Tile, TileType, MAX_COPIES, NUM_TILE_TYPES};
use tehai_engine::types::{Hand, FULL_HAND_SIZE};

/// Result of batch discard-shanten computation.
#[derive(Debug, Clone)]
pub struct DiscardShantenResult {
    /// Shanten of the full hand.
    pub base: i8,
    /// Shanten after discarding each kind. `None` if the kind is not held.
    pub discard: [Option<i8>; NUM_TILE_TYPES],
}

/// `len_div3` is the number of groups the closed tiles must supply; called
/// melds make up the rest.
pub fn batch_discard_shanten(hand: &[u8; NUM_TILE_TYPES], len_div3: u8) -> DiscardShantenResult {
    let mut result = DiscardShantenResult {
        base: calc_shanten_from_counts(hand, len_div3),
        discard: [None; NUM_TILE_TYPES],
    };
    let mut tmp = *hand;
    for t in 0..NUM_TILE_TYPES {
        if tmp[t] == 0 {
            continue;
        }
        tmp[t] -= 1;
        result.discard[t] = Some(calc_shanten_from_counts(&tmp, len_div3));
        tmp[t] += 1;
    }
    result
}

/// One candidate discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardOption {
    pub discard: Tile,
    pub shanten: i8,
    /// Waits after the discard; empty unless `shanten == 0`.
    pub waits: Vec<Tile>,
    /// Unseen copies of the waits.
    pub wait_count: u32,
}

/// Shanten and waits after discarding each distinct kind of a hand whose
/// closed part is `14 - 3 * melds` tiles.
///
/// A plain copy is discarded before a red five. Options come in canonical
/// kind order.
pub fn analyze_discards(hand: &Hand) -> EngineResult<Vec<DiscardOption>> {
    let closed = hand.closed_tiles();
    let expected = FULL_HAND_SIZE.saturating_sub(3 * hand.melds().len());
    if closed.len() != expected {
        return Err(EngineError::InvalidSize {
            expected,
            actual: closed.len(),
        });
    }

    let counts = to_counts(&closed);
    let visible = to_counts(&hand.all_tiles());
    let len_div3 = hand.len_div3();
    let batch = batch_discard_shanten(&counts, len_div3);

    let mut options = Vec::new();
    for kind in TileType::all() {
        let Some(shanten) = batch.discard[kind.index()] else {
            continue;
        };
        let Some(discard) = closed
            .iter()
            .copied()
            .filter(|t| t.base_key() == kind)
            .min()
        else {
            continue;
        };

        let mut after = counts;
        after[kind.index()] -= 1;
        let mut seen = visible;
        seen[kind.index()] -= 1;

        let waits: Vec<Tile> = if shanten == 0 {
            waits_from_counts(&after, &seen, len_div3)
                .waits()
                .iter()
                .map(|&k| Tile::from(k))
                .collect()
        } else {
            Vec::new()
        };
        let wait_count = waits
            .iter()
            .map(|w| u32::from(MAX_COPIES - seen[w.base_key().index()]))
            .sum();

        options.push(DiscardOption {
            discard,
            shanten,
            waits,
            wait_count,
        });
    }
    debug!(base = batch.base, options = options.len(), "discard analysis");
    Ok(options)
}

/// The options with the lowest shanten, most unseen waits first.
pub fn best_discards(options: &[DiscardOption]) -> Vec<&DiscardOption> {
    let Some(min) = options.iter().map(|o| o.shanten).min() else {
        return Vec::new();
    };
    let mut best: Vec<&DiscardOption> = options.iter().filter(|o| o.shanten == min).collect();
    best.sort_by(|a, b| b.wait_count.cmp(&a.wait_count));
    best
}
