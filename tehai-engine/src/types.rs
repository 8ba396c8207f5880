use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{to_counts, validate, Tile, Tile136Allocator, TileType, NUM_TILE_TYPES};

/// Tiles in a hand of four groups and a pair.
pub const HAND_SIZE: usize = 13;
/// `HAND_SIZE` plus the drawn or winning tile.
pub const FULL_HAND_SIZE: usize = 14;
/// Upper bound on declared melds.
pub const MAX_MELDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeldType {
    /// Run of three consecutive ranks.
    Chi,
    /// Triplet.
    Pon,
    /// Open quad claimed from a discard.
    Daiminkan,
    /// Concealed quad.
    Ankan,
    /// Quad promoted from an existing pon.
    Kakan,
}

impl MeldType {
    pub const fn as_str(self) -> &'static str {
        match self {
            MeldType::Chi => "chi",
            MeldType::Pon => "pon",
            MeldType::Daiminkan => "daiminkan",
            MeldType::Ankan => "ankan",
            MeldType::Kakan => "kakan",
        }
    }

    pub const fn is_quad(self) -> bool {
        matches!(self, MeldType::Daiminkan | MeldType::Ankan | MeldType::Kakan)
    }

    /// Physical tile count of the meld.
    pub const fn tile_count(self) -> usize {
        if self.is_quad() {
            4
        } else {
            3
        }
    }
}

/// Who supplied a tile inside a meld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Own,
    Opponent,
}

/// Seat of the opponent a tile was claimed from, relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Left,
    #[serde(rename = "opposite", alias = "across")]
    Across,
    Right,
}

impl Seat {
    /// Position of the claimed tile in a rendered pon.
    pub const fn triplet_slot(self) -> usize {
        match self {
            Seat::Left => 0,
            Seat::Across => 1,
            Seat::Right => 2,
        }
    }

    /// Position of the claimed tile in a rendered open quad.
    pub const fn quad_slot(self) -> usize {
        match self {
            Seat::Left => 0,
            Seat::Across => 1,
            Seat::Right => 3,
        }
    }
}

/// Represents wind directions in mahjong, used for player seats and round wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wind {
    #[default]
    #[serde(rename = "E")]
    East = 0,
    #[serde(rename = "S")]
    South = 1,
    #[serde(rename = "W")]
    West = 2,
    #[serde(rename = "N")]
    North = 3,
}

impl From<u8> for Wind {
    fn from(val: u8) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            3 => Wind::North,
            _ => unreachable!(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeldTile {
    pub tile: Tile,
    pub origin: Origin,
}

impl MeldTile {
    pub const fn own(tile: Tile) -> Self {
        Self {
            tile,
            origin: Origin::Own,
        }
    }

    pub const fn opponent(tile: Tile) -> Self {
        Self {
            tile,
            origin: Origin::Opponent,
        }
    }
}

/// A declared group set aside from the concealed hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meld {
    pub meld_type: MeldType,
    pub tiles: Vec<MeldTile>,
    /// Contributing opponent for pon and quads; `None` for chi and ankan.
    pub called_from: Option<Seat>,
}

impl Meld {
    pub fn new(meld_type: MeldType, tiles: Vec<MeldTile>, called_from: Option<Seat>) -> Self {
        Self {
            meld_type,
            tiles,
            called_from,
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.iter().map(|mt| mt.tile)
    }

    /// The tile claimed from an opponent, if any.
    pub fn called_tile(&self) -> Option<Tile> {
        self.tiles
            .iter()
            .find(|mt| mt.origin == Origin::Opponent)
            .map(|mt| mt.tile)
    }

    pub fn is_opened(&self) -> bool {
        self.meld_type != MeldType::Ankan
    }

    /// Base key of the lowest tile.
    pub fn base_key(&self) -> Option<TileType> {
        self.tiles().map(Tile::base_key).min()
    }

    /// Checks shape and origin tagging against the meld type.
    pub fn is_well_formed(&self) -> bool {
        if self.tiles.len() != self.meld_type.tile_count() {
            return false;
        }
        let mut kinds: Vec<TileType> = self.tiles().map(Tile::base_key).collect();
        kinds.sort();
        let shape_ok = match self.meld_type {
            MeldType::Chi => {
                kinds[0].is_suited()
                    && kinds[0].suit() == kinds[2].suit()
                    && kinds[1].id() == kinds[0].id() + 1
                    && kinds[2].id() == kinds[1].id() + 1
            }
            _ => kinds.iter().all(|&k| k == kinds[0]),
        };
        let called = self
            .tiles
            .iter()
            .filter(|mt| mt.origin == Origin::Opponent)
            .count();
        let origin_ok = match self.meld_type {
            MeldType::Ankan => called == 0,
            _ => called == 1,
        };
        shape_ok && origin_ok
    }

    /// Appends a self-drawn fourth tile, turning a pon into a kakan.
    pub fn promote(&self, tile: Tile) -> Meld {
        let mut tiles = self.tiles.clone();
        tiles.push(MeldTile::own(tile));
        Meld::new(MeldType::Kakan, tiles, self.called_from)
    }

    /// Sorted 136-format ids for the hand-value evaluator.
    pub fn to_136(&self, alloc: &mut Tile136Allocator) -> EngineResult<Vec<u32>> {
        let mut ids = self
            .tiles()
            .map(|t| alloc.allocate(t))
            .collect::<EngineResult<Vec<u32>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Concealed tiles, declared melds and an optional winning tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hand {
    concealed: Vec<Tile>,
    melds: Vec<Meld>,
    win_tile: Option<Tile>,
}

impl Hand {
    /// Builds a validated hand.
    ///
    /// Quads count as three tiles toward the 13/14 size rule. When a winning
    /// tile is given and the concealed tiles already include it (the total
    /// would exceed 14), one identical copy is dropped from the concealed set.
    pub fn new(
        mut concealed: Vec<Tile>,
        melds: Vec<Meld>,
        win_tile: Option<Tile>,
    ) -> EngineResult<Self> {
        let fixed = usize::from(win_tile.is_some()) + 3 * melds.len();
        if let Some(win) = win_tile {
            if concealed.len() + fixed > FULL_HAND_SIZE {
                if let Some(pos) = concealed.iter().position(|&t| t == win) {
                    concealed.remove(pos);
                }
            }
        }

        let hand = Hand {
            concealed,
            melds,
            win_tile,
        };
        validate(&hand.all_tiles())?;

        let actual = hand.concealed.len() + fixed;
        let sizes_ok = match win_tile {
            Some(_) => actual == FULL_HAND_SIZE,
            None => actual == HAND_SIZE || actual == FULL_HAND_SIZE,
        };
        if !sizes_ok || hand.melds.len() > MAX_MELDS {
            return Err(EngineError::InvalidSize {
                expected: if win_tile.is_some() {
                    FULL_HAND_SIZE
                } else {
                    HAND_SIZE
                },
                actual,
            });
        }
        Ok(hand)
    }

    pub fn concealed(&self) -> &[Tile] {
        &self.concealed
    }

    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    pub fn win_tile(&self) -> Option<Tile> {
        self.win_tile
    }

    /// Concealed tiles plus the winning tile.
    pub fn closed_tiles(&self) -> Vec<Tile> {
        let mut tiles = self.concealed.clone();
        tiles.extend(self.win_tile);
        tiles
    }

    /// Every physical tile: concealed, winning tile and meld tiles.
    pub fn all_tiles(&self) -> Vec<Tile> {
        let mut tiles = self.closed_tiles();
        for meld in &self.melds {
            tiles.extend(meld.tiles());
        }
        tiles
    }

    /// Histogram of the closed part (concealed + winning tile).
    pub fn counts(&self) -> [u8; NUM_TILE_TYPES] {
        to_counts(&self.closed_tiles())
    }
}
