//! Call candidates (chi / pon / kan) for a hand and a target tile.

use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;
use crate::meld::{CallAction, CallKind, CalledTile};
use crate::tile::{validate, Tile, TileType};
use crate::types::{Meld, MeldTile, MeldType, Origin, Seat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Chi,
    Pon,
    Kan,
}

/// Where the target tile comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    /// Drawn by the caller (concealed or added quad).
    SelfDraw,
    Opponent(Seat),
}

/// One legal call: the meld it forms and the concealed tiles left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallCandidate {
    pub meld: Meld,
    pub hand: Vec<Tile>,
}

impl CallCandidate {
    /// The call as a recordable action. An added quad is recorded as its
    /// single promoting tile, which the normalizer later pairs with the pon.
    pub fn to_action(&self) -> CallAction {
        let (kind, tiles): (CallKind, Vec<&MeldTile>) = match self.meld.meld_type {
            MeldType::Chi => (CallKind::Chi, self.meld.tiles.iter().collect()),
            MeldType::Pon => (CallKind::Pon, self.meld.tiles.iter().collect()),
            MeldType::Ankan | MeldType::Daiminkan => {
                (CallKind::Kan, self.meld.tiles.iter().collect())
            }
            MeldType::Kakan => (CallKind::Kan, self.meld.tiles.last().into_iter().collect()),
        };
        let tiles = tiles
            .into_iter()
            .map(|mt| CalledTile {
                tile: mt.tile,
                from_other: mt.origin == Origin::Opponent,
            })
            .collect();
        CallAction::new(kind, tiles, self.meld.called_from)
    }
}

/// Removes the tiles at `picked` from `hand`, keeping the order of the rest.
fn remove_indices(hand: &[Tile], picked: &[usize]) -> Vec<Tile> {
    hand.iter()
        .enumerate()
        .filter(|(i, _)| !picked.contains(i))
        .map(|(_, &t)| t)
        .collect()
}

/// Indices of rank-equal copies of `target`, plain copies first.
fn matching_indices(hand: &[Tile], target: Tile) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..hand.len())
        .filter(|&i| hand[i].rank_equal(target))
        .collect();
    idx.sort_by_key(|&i| hand[i].is_red());
    idx
}

fn pon(hand: &[Tile], target: Tile, seat: Seat) -> Option<CallCandidate> {
    let idx = matching_indices(hand, target);
    if idx.len() < 2 {
        return None;
    }
    let picked = &idx[..2];
    let mut tiles: Vec<MeldTile> = picked.iter().map(|&i| MeldTile::own(hand[i])).collect();
    tiles.insert(seat.triplet_slot(), MeldTile::opponent(target));
    Some(CallCandidate {
        meld: Meld::new(MeldType::Pon, tiles, Some(seat)),
        hand: remove_indices(hand, picked),
    })
}

/// Chi windows around `target`, as rank offsets of the two partners.
const CHI_WINDOWS: [(i8, i8); 3] = [(-2, -1), (-1, 1), (1, 2)];

fn chi(hand: &[Tile], target: Tile) -> Vec<CallCandidate> {
    let kind = target.base_key();
    if !kind.is_suited() {
        return Vec::new();
    }
    let suit = kind.suit();
    let rank = kind.rank() as i8;

    // Present physical variants of a partner rank: plain, then red.
    let variants = |r: i8| -> Vec<Tile> {
        if !(1..=9).contains(&r) {
            return Vec::new();
        }
        let Some(partner) = TileType::from_suit_rank(suit, r as u8) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(2);
        for red in [false, true] {
            if let Some(tile) = Tile::new(partner, red) {
                if hand.contains(&tile) {
                    out.push(tile);
                }
            }
        }
        out
    };

    let mut candidates = Vec::new();
    for (lo, hi) in CHI_WINDOWS {
        let lows = variants(rank + lo);
        let highs = variants(rank + hi);
        for &a in &lows {
            for &b in &highs {
                let mut picked = Vec::with_capacity(2);
                for want in [a, b] {
                    if let Some(i) = (0..hand.len()).find(|&i| hand[i] == want) {
                        picked.push(i);
                    }
                }
                let mut tiles = vec![
                    MeldTile::opponent(target),
                    MeldTile::own(a),
                    MeldTile::own(b),
                ];
                tiles.sort_by_key(|mt| mt.tile);
                candidates.push(CallCandidate {
                    meld: Meld::new(MeldType::Chi, tiles, None),
                    hand: remove_indices(hand, &picked),
                });
            }
        }
    }
    candidates
}

fn kan(hand: &[Tile], target: Tile, source: CallSource, melds: &[Meld]) -> Vec<CallCandidate> {
    let idx: Vec<usize> = (0..hand.len())
        .filter(|&i| hand[i].rank_equal(target))
        .collect();
    let mut candidates = Vec::new();
    match source {
        CallSource::SelfDraw => {
            if idx.len() == 3 {
                let mut tiles = vec![MeldTile::own(target)];
                tiles.extend(idx.iter().map(|&i| MeldTile::own(hand[i])));
                candidates.push(CallCandidate {
                    meld: Meld::new(MeldType::Ankan, tiles, None),
                    hand: remove_indices(hand, &idx),
                });
            }
            if let Some(pon) = melds.iter().find(|m| {
                m.meld_type == MeldType::Pon && m.base_key() == Some(target.base_key())
            }) {
                candidates.push(CallCandidate {
                    meld: pon.promote(target),
                    hand: hand.to_vec(),
                });
            }
        }
        CallSource::Opponent(seat) => {
            if idx.len() == 3 {
                let mut tiles: Vec<MeldTile> =
                    idx.iter().map(|&i| MeldTile::own(hand[i])).collect();
                tiles.insert(seat.quad_slot(), MeldTile::opponent(target));
                candidates.push(CallCandidate {
                    meld: Meld::new(MeldType::Daiminkan, tiles, Some(seat)),
                    hand: remove_indices(hand, &idx),
                });
            }
        }
    }
    candidates
}

/// Enumerates legal calls of `call_type` on `target`.
///
/// The hand, the target and the tiles of `existing_melds` are validated as
/// one physical set first. Otherwise pure and deterministic; an empty list
/// means nothing is legal. `existing_melds` is only consulted for added quads.
pub fn generate_calls(
    call_type: CallType,
    hand: &[Tile],
    target: Tile,
    source: CallSource,
    existing_melds: &[Meld],
) -> EngineResult<Vec<CallCandidate>> {
    let mut physical = hand.to_vec();
    physical.push(target);
    physical.extend(existing_melds.iter().flat_map(Meld::tiles));
    validate(&physical)?;

    Ok(match (call_type, source) {
        (CallType::Pon, CallSource::Opponent(seat)) => {
            pon(hand, target, seat).into_iter().collect()
        }
        (CallType::Chi, CallSource::Opponent(_)) => chi(hand, target),
        (CallType::Kan, _) => kan(hand, target, source, existing_melds),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::meld::convert_to_melds;
    use crate::tile::{normalize, parse_tile};

    fn t(s: &str) -> Tile {
        parse_tile(s).unwrap()
    }

    fn tiles(names: &[&str]) -> Vec<Tile> {
        normalize(names.iter().copied()).unwrap()
    }

    fn calls(
        call_type: CallType,
        hand: &[Tile],
        target: Tile,
        source: CallSource,
        melds: &[Meld],
    ) -> Vec<CallCandidate> {
        generate_calls(call_type, hand, target, source, melds).unwrap()
    }

    fn meld_names(meld: &Meld) -> Vec<String> {
        meld.tiles().map(|t| t.to_string()).collect()
    }

    #[test]
    fn pon_consumes_plain_copies_before_red() {
        let hand = tiles(&["0m", "5m", "1p", "5m", "E"]);
        let out = calls(
            CallType::Pon,
            &hand,
            t("5m"),
            CallSource::Opponent(Seat::Left),
            &[],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(meld_names(&out[0].meld), vec!["5m", "5m", "5m"]);
        assert_eq!(out[0].hand, tiles(&["0m", "1p", "E"]));
        assert!(out[0].meld.is_well_formed());
    }

    #[test]
    fn pon_places_claimed_tile_by_seat() {
        let hand = tiles(&["P", "P", "1m"]);
        for (seat, slot) in [(Seat::Left, 0), (Seat::Across, 1), (Seat::Right, 2)] {
            let out = calls(
                CallType::Pon,
                &hand,
                t("P"),
                CallSource::Opponent(seat),
                &[],
            );
            let meld = &out[0].meld;
            assert_eq!(meld.tiles[slot].origin, Origin::Opponent);
            assert_eq!(meld.called_from, Some(seat));
        }
    }

    #[test]
    fn pon_needs_opponent_and_two_copies() {
        let hand = tiles(&["P", "P", "1m"]);
        assert!(calls(CallType::Pon, &hand, t("P"), CallSource::SelfDraw, &[]).is_empty());
        let hand = tiles(&["P", "F", "1m"]);
        assert!(calls(
            CallType::Pon,
            &hand,
            t("P"),
            CallSource::Opponent(Seat::Right),
            &[]
        )
        .is_empty());
    }

    #[test]
    fn chi_red_and_plain_partner_give_two_candidates() {
        let hand = tiles(&["3m", "5m", "0m", "9p"]);
        let out = calls(
            CallType::Chi,
            &hand,
            t("4m"),
            CallSource::Opponent(Seat::Left),
            &[],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(meld_names(&out[0].meld), vec!["3m", "4m", "5m"]);
        assert_eq!(meld_names(&out[1].meld), vec!["3m", "4m", "0m"]);
        assert_eq!(out[0].hand, tiles(&["0m", "9p"]));
        assert_eq!(out[1].hand, tiles(&["5m", "9p"]));
        assert_eq!(out[0].meld.called_tile(), Some(t("4m")));
        assert!(out.iter().all(|c| c.meld.is_well_formed()));
    }

    #[test]
    fn chi_windows_in_order() {
        let hand = tiles(&["1s", "2s", "4s", "5s"]);
        let out = calls(
            CallType::Chi,
            &hand,
            t("3s"),
            CallSource::Opponent(Seat::Left),
            &[],
        );
        let shapes: Vec<Vec<String>> = out.iter().map(|c| meld_names(&c.meld)).collect();
        assert_eq!(
            shapes,
            vec![
                vec!["1s", "2s", "3s"],
                vec!["2s", "3s", "4s"],
                vec!["3s", "4s", "5s"],
            ]
        );
    }

    #[test]
    fn chi_edges_and_honors() {
        let hand = tiles(&["2m", "3m", "7m", "8m", "E", "S"]);
        let low = calls(
            CallType::Chi,
            &hand,
            t("1m"),
            CallSource::Opponent(Seat::Left),
            &[],
        );
        assert_eq!(low.len(), 1);
        let high = calls(
            CallType::Chi,
            &hand,
            t("9m"),
            CallSource::Opponent(Seat::Left),
            &[],
        );
        assert_eq!(high.len(), 1);
        assert!(calls(
            CallType::Chi,
            &hand,
            t("W"),
            CallSource::Opponent(Seat::Left),
            &[]
        )
        .is_empty());
        assert!(
            calls(CallType::Chi, &hand, t("4m"), CallSource::SelfDraw, &[]).is_empty()
        );
    }

    #[test]
    fn concealed_quad_from_draw() {
        let hand = tiles(&["0m", "5m", "5m", "7m"]);
        let out = calls(CallType::Kan, &hand, t("5m"), CallSource::SelfDraw, &[]);
        assert_eq!(out.len(), 1);
        let meld = &out[0].meld;
        assert_eq!(meld.meld_type, MeldType::Ankan);
        assert_eq!(meld.called_from, None);
        assert!(meld.tiles.iter().all(|mt| mt.origin == Origin::Own));
        assert_eq!(out[0].hand, tiles(&["7m"]));
    }

    #[test]
    fn added_quad_from_existing_pon() {
        let pon = Meld::new(
            MeldType::Pon,
            vec![
                MeldTile::opponent(t("5s")),
                MeldTile::own(t("5s")),
                MeldTile::own(t("5s")),
            ],
            Some(Seat::Left),
        );
        let hand = tiles(&["1m", "2m"]);
        let out = calls(
            CallType::Kan,
            &hand,
            t("0s"),
            CallSource::SelfDraw,
            std::slice::from_ref(&pon),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].meld.meld_type, MeldType::Kakan);
        assert_eq!(out[0].hand, hand);
        assert!(out[0].meld.is_well_formed());

        // the recorded action is a single leftover that re-forms the quad
        let pon_candidate = CallCandidate {
            meld: pon,
            hand: Vec::new(),
        };
        let melds =
            convert_to_melds(vec![pon_candidate.to_action(), out[0].to_action()]).unwrap();
        assert_eq!(melds, vec![out[0].meld.clone()]);
    }

    #[test]
    fn open_quad_slots() {
        let hand = tiles(&["C", "C", "C", "2p"]);
        for (seat, slot) in [(Seat::Left, 0), (Seat::Across, 1), (Seat::Right, 3)] {
            let out = calls(
                CallType::Kan,
                &hand,
                t("C"),
                CallSource::Opponent(seat),
                &[],
            );
            assert_eq!(out.len(), 1);
            let meld = &out[0].meld;
            assert_eq!(meld.meld_type, MeldType::Daiminkan);
            assert_eq!(meld.tiles[slot].origin, Origin::Opponent);
            assert_eq!(out[0].hand, tiles(&["2p"]));
        }
    }

    #[test]
    fn kan_without_three_copies_is_empty() {
        let hand = tiles(&["C", "C", "2p"]);
        assert!(calls(
            CallType::Kan,
            &hand,
            t("C"),
            CallSource::Opponent(Seat::Across),
            &[]
        )
        .is_empty());
        assert!(calls(CallType::Kan, &hand, t("C"), CallSource::SelfDraw, &[]).is_empty());
    }

    #[test]
    fn generation_is_deterministic() {
        let hand = tiles(&["3p", "4p", "0p", "5p", "6p", "7p", "P", "P"]);
        for target in ["5p", "2p", "8p"] {
            let a = calls(
                CallType::Chi,
                &hand,
                t(target),
                CallSource::Opponent(Seat::Left),
                &[],
            );
            let b = calls(
                CallType::Chi,
                &hand,
                t(target),
                CallSource::Opponent(Seat::Left),
                &[],
            );
            assert_eq!(a, b);
        }
    }

    #[test]
    fn hand_is_validated_before_generation() {
        let hand = tiles(&["0m", "0m", "1p"]);
        assert_eq!(
            generate_calls(
                CallType::Pon,
                &hand,
                t("5m"),
                CallSource::Opponent(Seat::Left),
                &[]
            )
            .unwrap_err(),
            EngineError::Overflow {
                tile: "0m".to_string(),
                count: 2,
                red: true,
            }
        );

        // the target plus an existing pon make a fifth copy
        let pon = Meld::new(
            MeldType::Pon,
            vec![
                MeldTile::opponent(t("C")),
                MeldTile::own(t("C")),
                MeldTile::own(t("C")),
            ],
            Some(Seat::Right),
        );
        let hand = tiles(&["C", "2p"]);
        let err = generate_calls(
            CallType::Kan,
            &hand,
            t("C"),
            CallSource::SelfDraw,
            std::slice::from_ref(&pon),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Overflow);
    }
}
