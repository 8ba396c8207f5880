//! Tile identity and textual encodings.
//!
//! Provides the 34-kind tile type system, red-five handling, parsing from the
//! encodings used by upstream producers (detector class names, UI records,
//! MJAI), multiset validation, and conversion to the 136-index form consumed
//! by hand-value evaluators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::errors::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Total number of distinct tile kinds (0-33).
pub const NUM_TILE_TYPES: usize = 34;

/// Number of ranks per suited category (1-9).
pub const NUM_SUIT_TILES: usize = 9;

/// Physical copies of each kind in a set.
pub const MAX_COPIES: u8 = 4;

// Suit range starts (tile type indices).
pub const MANZU_START: u8 = 0;
pub const PINZU_START: u8 = 9;
pub const SOUZU_START: u8 = 18;
pub const JIHAI_START: u8 = 27;

// Named honor tile indices for readability.
pub const EAST: u8 = 27;
pub const SOUTH: u8 = 28;
pub const WEST: u8 = 29;
pub const NORTH: u8 = 30;
pub const HAKU: u8 = 31;
pub const HATSU: u8 = 32;
pub const CHUN: u8 = 33;

/// The 13 terminal and honor kinds.
pub const TERMINALS_AND_HONORS: [u8; 13] = [0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33];

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// The four tile categories: characters, circles, bamboo and honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Manzu = 0,
    Pinzu = 1,
    Souzu = 2,
    Jihai = 3,
}

impl Suit {
    /// Returns the starting tile type index for this suit.
    #[inline]
    pub const fn start(self) -> u8 {
        match self {
            Suit::Manzu => MANZU_START,
            Suit::Pinzu => PINZU_START,
            Suit::Souzu => SOUZU_START,
            Suit::Jihai => JIHAI_START,
        }
    }

    /// Number of ranks in this suit (9 suited, 7 honors).
    #[inline]
    pub const fn rank_count(self) -> u8 {
        match self {
            Suit::Jihai => 7,
            _ => NUM_SUIT_TILES as u8,
        }
    }

    #[inline]
    pub const fn is_suited(self) -> bool {
        !matches!(self, Suit::Jihai)
    }

    /// Suit letter used by the numeric encodings (`m`, `p`, `s`, `z`).
    pub const fn letter(self) -> char {
        match self {
            Suit::Manzu => 'm',
            Suit::Pinzu => 'p',
            Suit::Souzu => 's',
            Suit::Jihai => 'z',
        }
    }

    fn from_letter(c: u8) -> Option<Self> {
        match c {
            b'm' => Some(Suit::Manzu),
            b'p' => Some(Suit::Pinzu),
            b's' => Some(Suit::Souzu),
            b'z' => Some(Suit::Jihai),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TileType newtype
// ---------------------------------------------------------------------------

/// A tile kind in the range 0-33, ignoring red-five identity.
///
/// This is the canonical base key used wherever rank-equal copies are
/// counted. The numeric order (manzu, pinzu, souzu, then E S W N P F C) is the
/// canonical iteration order for wait enumeration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileType(u8);

impl TileType {
    /// Creates a `TileType` if `id` is in range 0..34.
    #[inline]
    pub const fn new(id: u8) -> Option<Self> {
        if id < NUM_TILE_TYPES as u8 {
            Some(TileType(id))
        } else {
            None
        }
    }

    /// Builds a kind from a suit and a 1-based rank.
    #[inline]
    pub const fn from_suit_rank(suit: Suit, rank: u8) -> Option<Self> {
        if rank == 0 || rank > suit.rank_count() {
            return None;
        }
        Some(TileType(suit.start() + rank - 1))
    }

    /// Raw numeric id (0-33).
    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Which suit this tile belongs to.
    #[inline]
    pub const fn suit(self) -> Suit {
        match self.0 {
            0..9 => Suit::Manzu,
            9..18 => Suit::Pinzu,
            18..27 => Suit::Souzu,
            _ => Suit::Jihai,
        }
    }

    /// 1-based rank within the suit (1-9 suited, 1-7 honors).
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 - self.suit().start() + 1
    }

    /// 1-based number within the suit (1-9), or `None` for honor tiles.
    #[inline]
    pub const fn number(self) -> Option<u8> {
        if self.0 < JIHAI_START {
            Some((self.0 % NUM_SUIT_TILES as u8) + 1)
        } else {
            None
        }
    }

    /// True for 1 or 9 of any suit.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        if self.0 >= JIHAI_START {
            return false;
        }
        let num = self.0 % NUM_SUIT_TILES as u8;
        num == 0 || num == 8
    }

    /// True for wind or dragon tiles (indices 27-33).
    #[inline]
    pub const fn is_honor(self) -> bool {
        self.0 >= JIHAI_START
    }

    /// True for terminals or honors (yaochuuhai).
    #[inline]
    pub const fn is_terminal_or_honor(self) -> bool {
        self.is_terminal() || self.is_honor()
    }

    /// True for manzu, pinzu, or souzu (not jihai).
    #[inline]
    pub const fn is_suited(self) -> bool {
        self.0 < JIHAI_START
    }

    /// True for the suited fives, the only kinds with a red copy.
    #[inline]
    pub const fn is_five(self) -> bool {
        matches!(self.0, 4 | 13 | 22)
    }

    /// The dora tile indicated by this kind.
    pub const fn dora_after(self) -> TileType {
        TileType(next_dora_tile(self.0))
    }

    /// All 34 kinds in canonical order.
    pub fn all() -> impl Iterator<Item = TileType> {
        (0..NUM_TILE_TYPES as u8).map(TileType)
    }
}

impl fmt::Debug for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileType({}={})", self.0, self)
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Tile::plain(*self).to_display(TileEncoding::Canonical))
    }
}

/// Dora wrapping: 9 -> 1 within a suit, winds E->S->W->N->E, dragons P->F->C->P.
const fn next_dora_tile(tile: u8) -> u8 {
    match tile {
        0..=8 => (tile + 1) % 9,
        9..=17 => 9 + (tile - 9 + 1) % 9,
        18..=26 => 18 + (tile - 18 + 1) % 9,
        27..=30 => 27 + (tile - 27 + 1) % 4,
        31..=33 => 31 + (tile - 31 + 1) % 3,
        _ => tile,
    }
}

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

/// Textual tile encodings understood by [`parse_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEncoding {
    /// Two-letter form: `1m`, `0m` for red fives, honors `to na sh pe hk ht ty`.
    Canonical,
    /// Detector class names: `5mr` for red fives, honors `ton nan sha pei hak hat tyn`.
    Romanized,
    /// MJAI names: `5mr` for red fives, honors `E S W N P F C`.
    Mjai,
}

impl TileEncoding {
    pub const ALL: [TileEncoding; 3] = [
        TileEncoding::Canonical,
        TileEncoding::Romanized,
        TileEncoding::Mjai,
    ];

    fn honor_names(self) -> &'static [&'static str; 7] {
        match self {
            TileEncoding::Canonical => &CANONICAL_HONORS,
            TileEncoding::Romanized => &ROMANIZED_HONORS,
            TileEncoding::Mjai => &MJAI_HONORS,
        }
    }
}

static CANONICAL_HONORS: [&str; 7] = ["to", "na", "sh", "pe", "hk", "ht", "ty"];
static ROMANIZED_HONORS: [&str; 7] = ["ton", "nan", "sha", "pei", "hak", "hat", "tyn"];
static MJAI_HONORS: [&str; 7] = ["E", "S", "W", "N", "P", "F", "C"];

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One physical tile: a kind plus the red-five flag.
///
/// Two tiles are rank-equal when their [`Tile::base_key`] matches and
/// identical when the red flag matches too.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    kind: TileType,
    red: bool,
}

impl Tile {
    /// A non-red copy of `kind`.
    #[inline]
    pub const fn plain(kind: TileType) -> Self {
        Tile { kind, red: false }
    }

    /// The red five of a suited `suit`; `None` for honors.
    pub const fn red_five(suit: Suit) -> Option<Self> {
        if !suit.is_suited() {
            return None;
        }
        Some(Tile {
            kind: TileType(suit.start() + 4),
            red: true,
        })
    }

    /// Builds a tile, rejecting a red flag on anything but a suited five.
    pub const fn new(kind: TileType, red: bool) -> Option<Self> {
        if red && !kind.is_five() {
            return None;
        }
        Some(Tile { kind, red })
    }

    /// Strips the red flag; the key used for counting rank-equal copies.
    #[inline]
    pub const fn base_key(self) -> TileType {
        self.kind
    }

    #[inline]
    pub const fn is_red(self) -> bool {
        self.red
    }

    #[inline]
    pub const fn suit(self) -> Suit {
        self.kind.suit()
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.kind.rank()
    }

    #[inline]
    pub fn rank_equal(self, other: Tile) -> bool {
        self.kind == other.kind
    }

    /// Renders this tile in `encoding`; `parse_tile` is its inverse.
    pub fn to_display(self, encoding: TileEncoding) -> String {
        let suit = self.suit();
        if !suit.is_suited() {
            let idx = (self.rank() - 1) as usize;
            return encoding.honor_names()[idx].to_string();
        }
        match (self.red, encoding) {
            (true, TileEncoding::Canonical) => format!("0{}", suit.letter()),
            (true, _) => format!("5{}r", suit.letter()),
            (false, _) => format!("{}{}", self.rank(), suit.letter()),
        }
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({})", self)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display(TileEncoding::Canonical))
    }
}

impl From<TileType> for Tile {
    fn from(kind: TileType) -> Self {
        Tile::plain(kind)
    }
}

impl FromStr for Tile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tile(s)
    }
}

impl Serialize for Tile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_display(TileEncoding::Canonical))
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_tile(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a single tile token in any supported encoding.
pub fn parse_tile(raw: &str) -> EngineResult<Tile> {
    let token = raw.trim();
    for encoding in TileEncoding::ALL {
        if let Some(pos) = encoding.honor_names().iter().position(|&h| h == token) {
            return Ok(Tile::plain(TileType(JIHAI_START + pos as u8)));
        }
    }
    parse_numeric(token).ok_or_else(|| EngineError::invalid_tile(raw))
}

/// `<digit><suit>` with an optional trailing `r`; `0` marks a red five.
fn parse_numeric(token: &str) -> Option<Tile> {
    let bytes = token.as_bytes();
    let (digit, suit, red_marker) = match bytes {
        [d, s] => (*d, *s, false),
        [d, s, b'r'] => (*d, *s, true),
        _ => return None,
    };
    if !digit.is_ascii_digit() {
        return None;
    }
    let num = digit - b'0';
    let suit = Suit::from_letter(suit)?;
    if num == 0 || red_marker {
        if red_marker && num != 5 {
            return None;
        }
        return Tile::red_five(suit);
    }
    TileType::from_suit_rank(suit, num).map(Tile::plain)
}

/// Parses a raw token list, skipping empty and missing entries.
///
/// Accepts plain `&str` items as well as `Option<&str>` for sources that
/// carry nulls (detector output, JSON arrays).
pub fn normalize<'a, I>(raw: I) -> EngineResult<Vec<Tile>>
where
    I: IntoIterator,
    I::Item: Into<Option<&'a str>>,
{
    raw.into_iter()
        .filter_map(|item| item.into())
        .filter(|token| !token.trim().is_empty())
        .map(parse_tile)
        .collect()
}

// ---------------------------------------------------------------------------
// Counting and validation
// ---------------------------------------------------------------------------

/// 34-bin histogram of base keys.
pub fn to_counts(tiles: &[Tile]) -> [u8; NUM_TILE_TYPES] {
    let mut counts = [0u8; NUM_TILE_TYPES];
    for tile in tiles {
        let slot = &mut counts[tile.base_key().index()];
        *slot = slot.saturating_add(1);
    }
    counts
}

/// Checks the physical-set limits: at most 4 rank-equal copies and at most
/// one red five per suit. Reports the first offender in canonical order.
pub fn validate(tiles: &[Tile]) -> EngineResult<()> {
    let counts = to_counts(tiles);
    if let Some(kind) = TileType::all().find(|k| counts[k.index()] > MAX_COPIES) {
        let count = counts[kind.index()] as usize;
        debug!(tile = %kind, count, "tile overflow");
        return Err(EngineError::Overflow {
            tile: kind.to_string(),
            count,
            red: false,
        });
    }

    let mut reds = [0usize; 3];
    for tile in tiles.iter().filter(|t| t.is_red()) {
        reds[tile.suit() as usize] += 1;
    }
    for (suit, count) in [Suit::Manzu, Suit::Pinzu, Suit::Souzu].into_iter().zip(reds) {
        if count > 1 {
            let red = Tile::red_five(suit).map(|t| t.to_string()).unwrap_or_default();
            debug!(tile = %red, count, "red five overflow");
            return Err(EngineError::Overflow {
                tile: red,
                count,
                red: true,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 136-format allocation
// ---------------------------------------------------------------------------

/// Assigns distinct 136-format ids (`kind * 4 + copy`) to tiles.
///
/// Copy 0 of each five is the red one. Plain fives take copies 1-3 first and
/// fall back to copy 0 only when the red tile is absent from the set.
#[derive(Debug, Clone)]
pub struct Tile136Allocator {
    used: [[bool; 4]; NUM_TILE_TYPES],
}

impl Default for Tile136Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tile136Allocator {
    pub fn new() -> Self {
        Self {
            used: [[false; 4]; NUM_TILE_TYPES],
        }
    }

    pub fn allocate(&mut self, tile: Tile) -> EngineResult<u32> {
        let kind = tile.base_key();
        let search_indices: &[usize] = match (kind.is_five(), tile.is_red()) {
            (true, true) => &[0],
            (true, false) => &[1, 2, 3, 0],
            (false, _) => &[0, 1, 2, 3],
        };

        let slots = &mut self.used[kind.index()];
        let copy = search_indices
            .iter()
            .copied()
            .find(|&idx| !slots[idx])
            .ok_or_else(|| EngineError::Overflow {
                tile: tile.to_string(),
                count: MAX_COPIES as usize + 1,
                red: tile.is_red(),
            })?;
        slots[copy] = true;
        Ok((kind.index() * 4 + copy) as u32)
    }

    pub fn allocate_all(&mut self, tiles: &[Tile]) -> EngineResult<Vec<u32>> {
        tiles.iter().map(|&t| self.allocate(t)).collect()
    }
}

/// Inverse of [`Tile136Allocator::allocate`].
pub fn tile_from_136(id: u32) -> Option<Tile> {
    let kind = TileType::new(u8::try_from(id / 4).ok()?)?;
    Tile::new(kind, kind.is_five() && id % 4 == 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Tile {
        parse_tile(s).unwrap()
    }

    #[test]
    fn tile_type_new_valid() {
        for i in 0..34u8 {
            assert!(
                TileType::new(i).is_some(),
                "TileType::new({i}) should be Some"
            );
        }
        assert!(TileType::new(34).is_none());
        assert!(TileType::new(255).is_none());
    }

    #[test]
    fn suit_classification() {
        for i in 0..9u8 {
            let k = TileType::new(i).unwrap();
            assert_eq!(k.suit(), Suit::Manzu, "tile {i} should be Manzu");
            assert!(k.is_suited());
        }
        for i in 27..34u8 {
            let k = TileType::new(i).unwrap();
            assert_eq!(k.suit(), Suit::Jihai, "tile {i} should be Jihai");
            assert!(k.is_honor());
            assert_eq!(k.number(), None);
        }
        assert_eq!(TileType::new(22).unwrap().number(), Some(5)); // 5s
        assert_eq!(TileType::new(33).unwrap().rank(), 7); // C
    }

    #[test]
    fn terminal_detection() {
        for &i in &TERMINALS_AND_HONORS {
            assert!(TileType::new(i).unwrap().is_terminal_or_honor());
        }
        for i in [1, 4, 10, 14, 19, 23] {
            assert!(!TileType::new(i).unwrap().is_terminal_or_honor());
        }
    }

    #[test]
    fn parse_each_encoding() {
        assert_eq!(t("1m").base_key().id(), 0);
        assert_eq!(t("9s").base_key().id(), 26);
        assert_eq!(t("ton").base_key().id(), EAST);
        assert_eq!(t("to").base_key().id(), EAST);
        assert_eq!(t("E").base_key().id(), EAST);
        assert_eq!(t("hak").base_key().id(), HAKU);
        assert_eq!(t("hk").base_key().id(), HAKU);
        assert_eq!(t("P").base_key().id(), HAKU);
        assert_eq!(t("tyn").base_key().id(), CHUN);
        assert_eq!(t("7z").base_key().id(), CHUN);

        let red = t("0p");
        assert!(red.is_red());
        assert_eq!(red.base_key().id(), 13);
        assert_eq!(t("5pr"), red);
        assert!(!t("5p").is_red());
        assert!(t("5p").rank_equal(red));
        assert_ne!(t("5p"), red);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "10m", "0z", "8z", "5zr", "4mr", "x", "1x", "tonn", "e", "5m r"] {
            let err = parse_tile(bad).unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidTile {
                    token: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn display_roundtrip_all_encodings() {
        let mut tiles: Vec<Tile> = TileType::all().map(Tile::plain).collect();
        tiles.extend([Suit::Manzu, Suit::Pinzu, Suit::Souzu].map(|s| Tile::red_five(s).unwrap()));
        for encoding in TileEncoding::ALL {
            for &tile in &tiles {
                let shown = tile.to_display(encoding);
                assert_eq!(parse_tile(&shown).unwrap(), tile, "{encoding:?} {shown}");
            }
        }
    }

    #[test]
    fn display_forms() {
        let red = Tile::red_five(Suit::Souzu).unwrap();
        assert_eq!(red.to_display(TileEncoding::Canonical), "0s");
        assert_eq!(red.to_display(TileEncoding::Romanized), "5sr");
        assert_eq!(red.to_display(TileEncoding::Mjai), "5sr");
        let green = t("hat");
        assert_eq!(green.to_display(TileEncoding::Canonical), "ht");
        assert_eq!(green.to_display(TileEncoding::Mjai), "F");
        assert_eq!(format!("{}", TileType::new(8).unwrap()), "9m");
    }

    #[test]
    fn normalize_skips_empty_and_null() {
        let tiles = normalize(["1m", "", "  ", "ton", "0s"]).unwrap();
        assert_eq!(tiles.len(), 3);

        let tiles = normalize(vec![Some("2p"), None, Some("5mr")]).unwrap();
        assert_eq!(tiles, vec![t("2p"), t("0m")]);

        let err = normalize(["1m", "zz", "qq"]).unwrap_err();
        assert_eq!(err, EngineError::invalid_tile("zz"));
    }

    #[test]
    fn red_flag_only_on_fives() {
        let four = TileType::new(3).unwrap();
        assert!(Tile::new(four, true).is_none());
        assert!(Tile::red_five(Suit::Jihai).is_none());
    }

    #[test]
    fn validate_overflow() {
        let ok = normalize(["5m", "5m", "5m", "0m", "1p"]).unwrap();
        assert!(validate(&ok).is_ok());

        let five_copies = normalize(["5m", "5m", "5m", "0m", "5m"]).unwrap();
        assert_eq!(
            validate(&five_copies).unwrap_err(),
            EngineError::Overflow {
                tile: "5m".to_string(),
                count: 5,
                red: false
            }
        );

        let two_reds = normalize(["0s", "5sr"]).unwrap();
        assert_eq!(
            validate(&two_reds).unwrap_err(),
            EngineError::Overflow {
                tile: "0s".to_string(),
                count: 2,
                red: true
            }
        );
    }

    #[test]
    fn dora_wrapping() {
        let dora = |s: &str| t(s).base_key().dora_after().to_string();
        assert_eq!(dora("1m"), "2m");
        assert_eq!(dora("9m"), "1m");
        assert_eq!(dora("0p"), "6p");
        assert_eq!(dora("pe"), "to");
        assert_eq!(dora("ty"), "hk");
        assert_eq!(dora("hk"), "ht");
    }

    #[test]
    fn allocator_reserves_copy_zero_for_red() {
        let mut alloc = Tile136Allocator::new();
        assert_eq!(alloc.allocate(t("5m")).unwrap(), 17);
        assert_eq!(alloc.allocate(t("0m")).unwrap(), 16);
        assert_eq!(alloc.allocate(t("5m")).unwrap(), 18);
        assert_eq!(alloc.allocate(t("5m")).unwrap(), 19);
        assert!(alloc.allocate(t("5m")).is_err());

        let mut alloc = Tile136Allocator::new();
        let ids = alloc.allocate_all(&[t("E"), t("E")]).unwrap();
        assert_eq!(ids, vec![108, 109]);
    }

    #[test]
    fn tile_136_roundtrip() {
        assert_eq!(tile_from_136(16), Some(t("0m")));
        assert_eq!(tile_from_136(17), Some(t("5m")));
        assert_eq!(tile_from_136(135), Some(t("C")));
        assert_eq!(tile_from_136(136), None);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&vec![t("5mr"), t("nan")]).unwrap();
        assert_eq!(json, r#"["0m","na"]"#);
        let back: Vec<Tile> = serde_json::from_str(r#"["0m","S","3p"]"#).unwrap();
        assert_eq!(back, vec![t("0m"), t("S"), t("3p")]);
        assert!(serde_json::from_str::<Tile>(r#""11m""#).is_err());
    }
}
