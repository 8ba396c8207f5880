pub mod call;
pub mod errors;
pub mod evaluator;
pub mod meld;
pub mod rule;
pub mod shanten;
pub mod tile;
pub mod types;

pub use call::{generate_calls, CallCandidate, CallSource, CallType};
pub use errors::{EngineError, EngineResult, ErrorKind};
pub use evaluator::{HandValue, HandValueEvaluator, HandValueRequest};
pub use meld::{convert_raw_actions, convert_to_melds, CallAction, CallKind, RawCallAction};
pub use rule::{OptionalRules, RuleConfig};
pub use shanten::{shanten, waiting_tiles, waiting_tiles_par, WaitResult};
pub use tile::{normalize, parse_tile, validate, Tile, TileEncoding, TileType};
pub use types::{Hand, Meld, MeldType, Seat, Wind};
