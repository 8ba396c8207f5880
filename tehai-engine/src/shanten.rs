//! Shanten (replacement number) and wait enumeration.
//!
//! All calculations work on 34-bin histograms of base keys. The regular form
//! is an exhaustive decomposition search; seven pairs and thirteen orphans
//! are closed formulas. `-1` means the tiles already form a winning shape.

use rayon::prelude::*;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};
use crate::tile::{
    to_counts, validate, Tile, TileType, JIHAI_START, MAX_COPIES, NUM_SUIT_TILES, NUM_TILE_TYPES,
    TERMINALS_AND_HONORS,
};
use crate::types::{Hand, FULL_HAND_SIZE, HAND_SIZE};

/// Groups in a complete regular hand.
const GROUPS: u8 = 4;

/// Depth-first search over group/partial/head assignments.
struct Decomposer {
    counts: [u8; NUM_TILE_TYPES],
    /// Groups already fixed outside the tiles (called melds).
    called: u8,
    best: i8,
}

impl Decomposer {
    fn new(counts: &[u8; NUM_TILE_TYPES], len_div3: u8) -> Self {
        Self {
            counts: *counts,
            called: GROUPS.saturating_sub(len_div3),
            best: 8,
        }
    }

    #[inline]
    fn chains(i: usize, offset: usize) -> bool {
        i < JIHAI_START as usize && i % NUM_SUIT_TILES + offset < NUM_SUIT_TILES
    }

    fn take(&mut self, idx: &[usize]) {
        for &i in idx {
            self.counts[i] -= 1;
        }
    }

    fn give(&mut self, idx: &[usize]) {
        for &i in idx {
            self.counts[i] += 1;
        }
    }

    fn branch(&mut self, idx: &[usize], at: usize, complete: u8, partial: u8, head: bool) {
        self.take(idx);
        self.scan(at, complete, partial, head);
        self.give(idx);
    }

    fn scan(&mut self, start: usize, complete: u8, partial: u8, head: bool) {
        if self.best == -1 {
            return;
        }
        let Some(i) = (start..NUM_TILE_TYPES).find(|&i| self.counts[i] > 0) else {
            self.record(complete, partial, head);
            return;
        };
        let c = self.counts[i];

        if c >= 3 {
            self.branch(&[i, i, i], i, complete + 1, partial, head);
        }
        if Self::chains(i, 2) && self.counts[i + 1] > 0 && self.counts[i + 2] > 0 {
            self.branch(&[i, i + 1, i + 2], i, complete + 1, partial, head);
        }
        if c >= 2 && !head {
            self.branch(&[i, i], i, complete, partial, true);
        }
        if complete + self.called + partial < GROUPS {
            if c >= 2 {
                self.branch(&[i, i], i, complete, partial + 1, head);
            }
            if Self::chains(i, 1) && self.counts[i + 1] > 0 {
                self.branch(&[i, i + 1], i, complete, partial + 1, head);
            }
            if Self::chains(i, 2) && self.counts[i + 2] > 0 {
                self.branch(&[i, i + 2], i, complete, partial + 1, head);
            }
        }

        // Leave every remaining copy of `i` isolated.
        self.counts[i] = 0;
        self.scan(i + 1, complete, partial, head);
        self.counts[i] = c;
    }

    fn record(&mut self, complete: u8, partial: u8, head: bool) {
        let groups = complete + self.called;
        let partial = partial.min(GROUPS.saturating_sub(groups));
        let shanten = 8 - 2 * groups as i8 - partial as i8 - head as i8;
        self.best = self.best.min(shanten.max(-1));
    }
}

/// Regular form (four groups and a pair).
///
/// `len_div3` is the number of groups the tiles themselves must supply;
/// the remaining `4 - len_div3` are treated as already complete melds.
pub fn calc_normal(tiles: &[u8; NUM_TILE_TYPES], len_div3: u8) -> i8 {
    let mut search = Decomposer::new(tiles, len_div3);
    search.scan(0, 0, 0, false);
    search.best
}

/// Seven pairs: `6 - distinct pairs`. Four copies count as one pair.
pub fn calc_chitoi(tiles: &[u8; NUM_TILE_TYPES]) -> i8 {
    let pairs = tiles.iter().filter(|&&c| c >= 2).count().min(7) as i8;
    6 - pairs
}

/// Thirteen orphans: one of each terminal/honor plus a duplicate.
pub fn calc_kokushi(tiles: &[u8; NUM_TILE_TYPES]) -> i8 {
    let mut kinds = 0i8;
    let mut has_pair = false;
    for &idx in &TERMINALS_AND_HONORS {
        let c = tiles[idx as usize];
        if c > 0 {
            kinds += 1;
            has_pair |= c >= 2;
        }
    }
    (13 - kinds - has_pair as i8).max(-1)
}

/// Shanten of the closed part of a hand with `4 - len_div3` called melds.
///
/// Seven pairs and thirteen orphans need a fully concealed hand, so with
/// any called meld only the regular form counts.
pub fn calc_shanten_from_counts(tehai: &[u8; NUM_TILE_TYPES], tehai_len_div3: u8) -> i8 {
    let shanten = calc_normal(tehai, tehai_len_div3);
    if tehai_len_div3 < GROUPS {
        return shanten;
    }
    shanten.min(calc_chitoi(tehai)).min(calc_kokushi(tehai))
}

/// Minimum over the three patterns for a bare multiset of any size.
pub fn calc_shanten(tehai: &[u8; NUM_TILE_TYPES]) -> i8 {
    calc_shanten_from_counts(tehai, GROUPS)
}

/// Validated shanten of up to 14 tiles.
pub fn shanten(tiles: &[Tile]) -> EngineResult<i8> {
    if tiles.len() > FULL_HAND_SIZE {
        return Err(EngineError::InvalidSize {
            expected: FULL_HAND_SIZE,
            actual: tiles.len(),
        });
    }
    validate(tiles)?;
    Ok(calc_shanten(&to_counts(tiles)))
}

// ---------------------------------------------------------------------------
// Waits
// ---------------------------------------------------------------------------

/// Outcome of wait enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    /// Already a winning shape. Never produced for 13-tile input.
    Complete,
    /// Not yet tenpai; carries the shanten number (> 0).
    Shanten(u8),
    /// Tenpai; waits in canonical kind order.
    Tenpai(Vec<TileType>),
}

impl WaitResult {
    pub fn shanten(&self) -> i8 {
        match self {
            WaitResult::Complete => -1,
            WaitResult::Shanten(n) => *n as i8,
            WaitResult::Tenpai(_) => 0,
        }
    }

    pub fn waits(&self) -> &[TileType] {
        match self {
            WaitResult::Tenpai(waits) => waits,
            _ => &[],
        }
    }
}

#[inline]
fn completes(
    closed: &[u8; NUM_TILE_TYPES],
    visible: &[u8; NUM_TILE_TYPES],
    len_div3: u8,
    kind: TileType,
) -> bool {
    if visible[kind.index()] >= MAX_COPIES {
        return false;
    }
    let mut test = *closed;
    test[kind.index()] += 1;
    calc_shanten_from_counts(&test, len_div3) == -1
}

/// Enumerates waits of `closed`, skipping kinds whose four copies are
/// already accounted for in `visible` (closed tiles plus meld tiles).
fn wait_result(
    closed: &[u8; NUM_TILE_TYPES],
    visible: &[u8; NUM_TILE_TYPES],
    len_div3: u8,
    parallel: bool,
) -> WaitResult {
    let current = calc_shanten_from_counts(closed, len_div3);
    if current < 0 {
        return WaitResult::Complete;
    }
    if current > 0 {
        return WaitResult::Shanten(current as u8);
    }
    let waits = if parallel {
        (0..NUM_TILE_TYPES as u8)
            .into_par_iter()
            .filter_map(TileType::new)
            .filter(|&k| completes(closed, visible, len_div3, k))
            .collect()
    } else {
        TileType::all()
            .filter(|&k| completes(closed, visible, len_div3, k))
            .collect()
    };
    WaitResult::Tenpai(waits)
}

/// Waits of an arbitrary closed histogram with `4 - len_div3` called melds.
/// `visible` (closed tiles plus any meld tiles) caps candidates at four
/// physical copies.
pub fn waits_from_counts(
    closed: &[u8; NUM_TILE_TYPES],
    visible: &[u8; NUM_TILE_TYPES],
    len_div3: u8,
) -> WaitResult {
    wait_result(closed, visible, len_div3, false)
}

fn check_wait_input(tiles: &[Tile]) -> EngineResult<[u8; NUM_TILE_TYPES]> {
    if tiles.len() != HAND_SIZE {
        return Err(EngineError::InvalidSize {
            expected: HAND_SIZE,
            actual: tiles.len(),
        });
    }
    validate(tiles)?;
    Ok(to_counts(tiles))
}

/// Waits of a 13-tile concealed hand.
pub fn waiting_tiles(tiles: &[Tile]) -> EngineResult<WaitResult> {
    let counts = check_wait_input(tiles)?;
    let result = wait_result(&counts, &counts, GROUPS, false);
    debug!(shanten = result.shanten(), waits = result.waits().len(), "wait enumeration");
    Ok(result)
}

/// Same as [`waiting_tiles`], evaluating the 34 candidates on the rayon pool.
pub fn waiting_tiles_par(tiles: &[Tile]) -> EngineResult<WaitResult> {
    let counts = check_wait_input(tiles)?;
    Ok(wait_result(&counts, &counts, GROUPS, true))
}

impl Hand {
    /// Groups the closed part still has to supply.
    pub fn len_div3(&self) -> u8 {
        let called = u8::try_from(self.melds().len()).unwrap_or(GROUPS);
        GROUPS.saturating_sub(called)
    }

    /// Shanten of the closed part, with every meld counted as a finished group.
    pub fn shanten(&self) -> i8 {
        calc_shanten_from_counts(&self.counts(), self.len_div3())
    }

    /// Waits of a hand before its 14th tile, melds included.
    ///
    /// The hand must carry no winning tile and its concealed part must be
    /// `13 - 3 * melds` tiles.
    pub fn waits(&self) -> EngineResult<WaitResult> {
        let expected = HAND_SIZE.saturating_sub(3 * self.melds().len());
        let actual = self.concealed().len() + usize::from(self.win_tile().is_some());
        if self.win_tile().is_some() || actual != expected {
            return Err(EngineError::InvalidSize { expected, actual });
        }
        let visible = to_counts(&self.all_tiles());
        Ok(waits_from_counts(&self.counts(), &visible, self.len_div3()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{normalize, parse_tile};
    use crate::types::{Meld, MeldTile, MeldType, Seat};

    fn counts(tiles: &[&str]) -> [u8; NUM_TILE_TYPES] {
        to_counts(&normalize(tiles.iter().copied()).unwrap())
    }

    fn kinds(names: &[&str]) -> Vec<TileType> {
        names
            .iter()
            .map(|n| parse_tile(n).unwrap().base_key())
            .collect()
    }

    fn hand(names: &[&str]) -> Vec<Tile> {
        normalize(names.iter().copied()).unwrap()
    }

    #[test]
    fn complete_regular_hand() {
        let c = counts(&[
            "1m", "2m", "3m", "4p", "5p", "6p", "7s", "8s", "9s", "E", "E", "E", "P", "P",
        ]);
        assert_eq!(calc_normal(&c, 4), -1);
        assert_eq!(calc_shanten(&c), -1);
    }

    #[test]
    fn regular_formula_counts_partials() {
        // 123m 456p + 78s + 35m + EE: 8 - 4 - 2 - 1 = 1
        let c = counts(&[
            "1m", "2m", "3m", "4p", "5p", "6p", "7s", "8s", "3m", "5m", "E", "E", "N",
        ]);
        assert_eq!(calc_normal(&c, 4), 1);
    }

    #[test]
    fn scattered_hand_is_far() {
        let c = counts(&[
            "1m", "4m", "7m", "1p", "4p", "7p", "1s", "4s", "7s", "E", "S", "W", "N",
        ]);
        assert_eq!(calc_normal(&c, 4), 8);
        assert_eq!(calc_chitoi(&c), 6);
        assert_eq!(calc_kokushi(&c), 6);
        assert_eq!(calc_shanten(&c), 6);
    }

    #[test]
    fn honors_never_chain() {
        let c = counts(&["E", "S", "W"]);
        // one group needed, nothing usable: 8 - 6 - 0 - 0
        assert_eq!(calc_normal(&c, 1), 2);
        let c = counts(&["8m", "9m", "1p"]);
        assert_eq!(calc_normal(&c, 1), 1);
    }

    #[test]
    fn seven_pairs_boundary() {
        let tiles = hand(&[
            "1m", "1m", "3m", "3m", "5m", "5m", "7m", "7m", "1p", "1p", "3p", "3p", "5s",
        ]);
        assert_eq!(shanten(&tiles).unwrap(), 0);
        assert_eq!(
            waiting_tiles(&tiles).unwrap(),
            WaitResult::Tenpai(kinds(&["5s"]))
        );
    }

    #[test]
    fn short_multiset_takes_all_three_patterns() {
        // five pairs: regular 8 - 4 - 1 = 3, seven pairs 6 - 5 = 1
        let tiles = hand(&["1m", "1m", "3m", "3m", "5p", "5p", "7p", "7p", "9s", "9s"]);
        let c = to_counts(&tiles);
        assert_eq!(calc_normal(&c, 4), 3);
        assert_eq!(calc_chitoi(&c), 1);
        assert_eq!(shanten(&tiles).unwrap(), 1);

        // seven orphans with a pair: 13 - 7 - 1
        let tiles = hand(&["1m", "9m", "1p", "9p", "1s", "9s", "E", "E"]);
        assert_eq!(calc_kokushi(&to_counts(&tiles)), 5);
        assert_eq!(shanten(&tiles).unwrap(), 5);
    }

    #[test]
    fn seven_pairs_has_no_kind_penalty() {
        let c = counts(&[
            "1m", "1m", "1m", "1m", "3m", "3m", "5m", "5m", "7m", "7m", "1p", "1p", "5s",
        ]);
        assert_eq!(calc_chitoi(&c), 1);
    }

    #[test]
    fn thirteen_orphans_boundary() {
        let names = [
            "1m", "9m", "1p", "9p", "1s", "9s", "E", "S", "W", "N", "P", "F", "C",
        ];
        let tiles = hand(&names);
        assert_eq!(calc_kokushi(&to_counts(&tiles)), 0);
        assert_eq!(shanten(&tiles).unwrap(), 0);
        assert_eq!(
            waiting_tiles(&tiles).unwrap(),
            WaitResult::Tenpai(kinds(&names))
        );
    }

    #[test]
    fn thirteen_orphans_ignores_simples() {
        let c = counts(&[
            "1m", "1m", "9m", "1p", "9p", "1s", "9s", "E", "S", "W", "N", "P", "5m",
        ]);
        // 11 kinds + pair
        assert_eq!(calc_kokushi(&c), 1);
    }

    #[test]
    fn floating_pair_hand_is_one_shanten() {
        let tiles = hand(&[
            "1m", "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", "9m", "1p", "1p",
        ]);
        assert_eq!(waiting_tiles(&tiles).unwrap(), WaitResult::Shanten(1));
    }

    #[test]
    fn two_sided_wait_with_pair() {
        let tiles = hand(&[
            "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", "1p", "1p", "2p", "3p",
        ]);
        assert_eq!(
            waiting_tiles(&tiles).unwrap(),
            WaitResult::Tenpai(kinds(&["1p", "4p"]))
        );
    }

    #[test]
    fn nine_gates_waits_on_every_rank() {
        let tiles = hand(&[
            "1m", "1m", "1m", "2m", "3m", "4m", "0m", "6m", "7m", "8m", "9m", "9m", "9m",
        ]);
        assert_eq!(
            waiting_tiles(&tiles).unwrap(),
            WaitResult::Tenpai(kinds(&["1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m"]))
        );
    }

    #[test]
    fn exhausted_kind_is_not_a_wait() {
        // 1111m 234p 567p 888s + 9s: tanki on 9s only
        let tiles = hand(&[
            "1m", "1m", "1m", "1m", "2p", "3p", "4p", "5p", "6p", "7p", "8s", "8s", "8s",
        ]);
        let result = waiting_tiles(&tiles).unwrap();
        assert!(!result.waits().contains(&kinds(&["1m"])[0]));
    }

    #[test]
    fn parallel_matches_sequential() {
        let tiles = hand(&[
            "2m", "3m", "4m", "4m", "5m", "6m", "3p", "4p", "5p", "6s", "7s", "E", "E",
        ]);
        assert_eq!(
            waiting_tiles_par(&tiles).unwrap(),
            waiting_tiles(&tiles).unwrap()
        );
        assert_eq!(
            waiting_tiles(&tiles).unwrap(),
            WaitResult::Tenpai(kinds(&["5s", "8s"]))
        );
    }

    #[test]
    fn wait_size_is_enforced() {
        let tiles = hand(&["1m", "2m"]);
        assert_eq!(
            waiting_tiles(&tiles).unwrap_err(),
            EngineError::InvalidSize {
                expected: 13,
                actual: 2
            }
        );
        let fifteen = vec![parse_tile("1m").unwrap(); 15];
        assert!(matches!(
            shanten(&fifteen),
            Err(EngineError::InvalidSize { .. })
        ));
    }

    #[test]
    fn validation_runs_before_shanten() {
        let tiles = hand(&["1m", "1m", "1m", "1m", "1m"]);
        assert_eq!(shanten(&tiles).unwrap_err().kind(), crate::errors::ErrorKind::Overflow);
    }

    #[test]
    fn hand_with_meld_uses_group_budget() {
        let p = parse_tile("P").unwrap();
        let meld = Meld::new(
            MeldType::Pon,
            vec![MeldTile::opponent(p), MeldTile::own(p), MeldTile::own(p)],
            Some(Seat::Left),
        );
        let concealed = hand(&["1m", "2m", "3m", "4p", "5p", "6p", "7s", "8s", "E", "E"]);
        let h = Hand::new(concealed, vec![meld], None).unwrap();
        assert_eq!(h.shanten(), 0);
        assert_eq!(
            h.waits().unwrap(),
            WaitResult::Tenpai(kinds(&["6s", "9s"]))
        );
    }

    #[test]
    fn called_meld_closes_seven_pairs() {
        let p = parse_tile("P").unwrap();
        let meld = Meld::new(
            MeldType::Pon,
            vec![MeldTile::opponent(p), MeldTile::own(p), MeldTile::own(p)],
            Some(Seat::Right),
        );
        let concealed = hand(&["1m", "1m", "3m", "3m", "5p", "5p", "7p", "7p", "9s", "9s"]);
        assert_eq!(shanten(&concealed).unwrap(), 1);
        let h = Hand::new(concealed, vec![meld], None).unwrap();
        assert_eq!(h.len_div3(), 3);
        // one pon + three partials + head: 8 - 2 - 3 - 1
        assert_eq!(h.shanten(), 2);
    }

    #[test]
    fn hand_waits_cap_counts_meld_tiles() {
        // Pon of 9s and a 78s shape: 9s has one copy left.
        let nine = parse_tile("9s").unwrap();
        let meld = Meld::new(
            MeldType::Daiminkan,
            vec![
                MeldTile::opponent(nine),
                MeldTile::own(nine),
                MeldTile::own(nine),
                MeldTile::own(nine),
            ],
            Some(Seat::Left),
        );
        let concealed = hand(&["1m", "2m", "3m", "4p", "5p", "6p", "7s", "8s", "E", "E"]);
        let h = Hand::new(concealed, vec![meld], None).unwrap();
        assert_eq!(h.waits().unwrap(), WaitResult::Tenpai(kinds(&["6s"])));
    }
}
