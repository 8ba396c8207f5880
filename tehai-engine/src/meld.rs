//! Raw call actions to canonical melds.
//!
//! A recorded call arrives as an action type plus ordered `(tile, fromOther)`
//! pairs. Single-tile actions are leftovers: a self-drawn fourth tile that
//! upgrades an earlier pon into an added quad.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{normalize, parse_tile, validate, Tile, TileEncoding};
use crate::types::{Meld, MeldTile, MeldType, Origin, Seat};

/// Wire form of one tile of a call: `{"tile": "5mr", "fromOther": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCalledTile {
    pub tile: String,
    #[serde(rename = "fromOther", default)]
    pub from_other: bool,
}

/// Wire form of a call action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCallAction {
    pub target_tiles: Vec<RawCalledTile>,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called_from: Option<Seat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Chi,
    Pon,
    Kan,
    AddedKan,
}

impl CallKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CallKind::Chi => "chi",
            CallKind::Pon => "pon",
            CallKind::Kan => "kan",
            CallKind::AddedKan => "chkan",
        }
    }

    /// Tiles carried by a full (non-leftover) action of this kind.
    pub const fn tile_count(self) -> usize {
        match self {
            CallKind::Chi | CallKind::Pon => 3,
            CallKind::Kan | CallKind::AddedKan => 4,
        }
    }
}

impl FromStr for CallKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chi" => Ok(CallKind::Chi),
            "pon" => Ok(CallKind::Pon),
            "kan" => Ok(CallKind::Kan),
            "chkan" => Ok(CallKind::AddedKan),
            _ => Err(EngineError::UnknownActionType {
                action: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalledTile {
    pub tile: Tile,
    pub from_other: bool,
}

impl CalledTile {
    fn meld_tile(self) -> MeldTile {
        if self.from_other {
            MeldTile::opponent(self.tile)
        } else {
            MeldTile::own(self.tile)
        }
    }
}

/// A parsed call action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAction {
    pub kind: CallKind,
    pub tiles: Vec<CalledTile>,
    pub called_from: Option<Seat>,
}

impl CallAction {
    pub fn new(kind: CallKind, tiles: Vec<CalledTile>, called_from: Option<Seat>) -> Self {
        Self {
            kind,
            tiles,
            called_from,
        }
    }

    /// Builds an action from a declared meld.
    ///
    /// With a source present, the first tile identical to `called_tile` is
    /// marked as taken from the opponent; if none matches, the first tile is.
    pub fn from_declaration(
        kind: CallKind,
        tiles: &[Tile],
        called_tile: Option<Tile>,
        has_source: bool,
        called_from: Option<Seat>,
    ) -> Self {
        let mut used_called = false;
        let mut called: Vec<CalledTile> = tiles
            .iter()
            .map(|&tile| {
                let from_other = has_source && !used_called && called_tile == Some(tile);
                used_called |= from_other;
                CalledTile { tile, from_other }
            })
            .collect();
        if has_source && !used_called {
            if let Some(first) = called.first_mut() {
                first.from_other = true;
            }
        }
        Self::new(kind, called, called_from)
    }

    pub fn is_leftover(&self) -> bool {
        self.tiles.len() == 1
    }

    pub fn to_raw(&self, encoding: TileEncoding) -> RawCallAction {
        RawCallAction {
            target_tiles: self
                .tiles
                .iter()
                .map(|t| RawCalledTile {
                    tile: t.tile.to_display(encoding),
                    from_other: t.from_other,
                })
                .collect(),
            action_type: self.kind.as_str().to_string(),
            called_from: self.called_from,
        }
    }

    fn into_meld(self) -> Meld {
        let from_other = self.tiles.iter().any(|t| t.from_other);
        let meld_type = match self.kind {
            CallKind::Chi => MeldType::Chi,
            CallKind::Pon => MeldType::Pon,
            CallKind::Kan if from_other => MeldType::Daiminkan,
            CallKind::Kan => MeldType::Ankan,
            CallKind::AddedKan => MeldType::Kakan,
        };
        let called_from = if meld_type == MeldType::Ankan {
            None
        } else {
            self.called_from
        };
        let tiles = self.tiles.into_iter().map(CalledTile::meld_tile).collect();
        Meld::new(meld_type, tiles, called_from)
    }
}

impl TryFrom<&RawCallAction> for CallAction {
    type Error = EngineError;

    fn try_from(raw: &RawCallAction) -> Result<Self, Self::Error> {
        let kind = raw.action_type.parse()?;
        let tiles = raw
            .target_tiles
            .iter()
            .map(|t| {
                Ok(CalledTile {
                    tile: parse_tile(&t.tile)?,
                    from_other: t.from_other,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(CallAction::new(kind, tiles, raw.called_from))
    }
}

/// Meld record as entered by a user: `{"kind", "tiles", "calledTile", "calledFrom"}`.
///
/// `calledFrom` may be any seat label (relative or absolute); only its
/// presence decides which tile came from an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeldDeclaration {
    pub kind: String,
    #[serde(default)]
    pub tiles: Vec<Option<String>>,
    #[serde(default)]
    pub called_tile: Option<String>,
    #[serde(default)]
    pub called_from: Option<String>,
}

impl MeldDeclaration {
    /// The kind is matched case-insensitively; `calledFrom` marks the source.
    pub fn to_action(&self) -> EngineResult<CallAction> {
        let kind: CallKind = self
            .kind
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| EngineError::UnknownActionType {
                action: self.kind.clone(),
            })?;
        let tiles = normalize(self.tiles.iter().map(|t| t.as_deref()))?;
        let called_tile = match self.called_tile.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_tile(raw)?),
            _ => None,
        };
        let source = self
            .called_from
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        Ok(CallAction::from_declaration(
            kind,
            &tiles,
            called_tile,
            source.is_some(),
            source.and_then(relative_seat),
        ))
    }
}

fn relative_seat(label: &str) -> Option<Seat> {
    match label.to_ascii_lowercase().as_str() {
        "left" | "kamicha" => Some(Seat::Left),
        "opposite" | "across" | "toimen" => Some(Seat::Across),
        "right" | "shimocha" => Some(Seat::Right),
        _ => None,
    }
}

/// Converts parsed actions into melds.
///
/// All action tiles are validated together first. Each pon takes the first
/// unconsumed leftover of the same base key and becomes an added quad.
/// Leftovers nobody claims are dropped. Fails on a full action with the
/// wrong tile count or on a meld whose shape does not fit its type.
pub fn convert_to_melds(actions: Vec<CallAction>) -> EngineResult<Vec<Meld>> {
    let all: Vec<Tile> = actions
        .iter()
        .flat_map(|a| a.tiles.iter().map(|t| t.tile))
        .collect();
    validate(&all)?;
    for action in actions.iter().filter(|a| !a.is_leftover()) {
        let expected = action.kind.tile_count();
        if action.tiles.len() != expected {
            return Err(EngineError::InvalidSize {
                expected,
                actual: action.tiles.len(),
            });
        }
    }

    let (leftovers, calls): (Vec<CallAction>, Vec<CallAction>) =
        actions.into_iter().partition(CallAction::is_leftover);
    let leftovers: Vec<Tile> = leftovers.iter().map(|a| a.tiles[0].tile).collect();
    let mut consumed = vec![false; leftovers.len()];

    let mut melds = Vec::with_capacity(calls.len());
    for action in calls {
        let promotion = match (action.kind, action.tiles.first()) {
            (CallKind::Pon, Some(first)) => (0..leftovers.len())
                .find(|&i| !consumed[i] && leftovers[i].rank_equal(first.tile)),
            _ => None,
        };
        let meld = action.into_meld();
        let meld = match promotion {
            Some(i) => {
                consumed[i] = true;
                debug!(tile = %leftovers[i], "pon promoted to added quad");
                meld.promote(leftovers[i])
            }
            None => meld,
        };
        melds.push(well_formed(meld)?);
    }

    for (tile, _) in leftovers.iter().zip(&consumed).filter(|(_, used)| !**used) {
        warn!(tile = %tile, "leftover call tile matched no pon; dropped");
    }
    Ok(melds)
}

fn well_formed(meld: Meld) -> EngineResult<Meld> {
    if meld.is_well_formed() {
        return Ok(meld);
    }
    let tiles: Vec<String> = meld.tiles().map(|t| t.to_string()).collect();
    Err(EngineError::MalformedMeld {
        meld: meld.meld_type.as_str().to_string(),
        tiles: tiles.join(" "),
    })
}

/// Parses wire actions and converts them; fails on the first bad tile,
/// unknown action type, overflow or malformed meld.
pub fn convert_raw_actions(actions: &[RawCallAction]) -> EngineResult<Vec<Meld>> {
    let parsed = actions
        .iter()
        .map(CallAction::try_from)
        .collect::<EngineResult<Vec<_>>>()?;
    convert_to_melds(parsed)
}

/// Origin tags in meld order, for positional rendering.
pub fn origins(meld: &Meld) -> Vec<Origin> {
    meld.tiles.iter().map(|t| t.origin).collect()
}
