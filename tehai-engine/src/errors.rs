use serde::Serialize;
use thiserror::Error;

/// Stable, inspectable category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTile,
    Overflow,
    InvalidSize,
    UnknownActionType,
    MalformedMeld,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// 牌文字列がどのエンコーディングにも一致しない
    #[error("invalid tile: '{token}'")]
    InvalidTile { token: String },
    /// 同一牌が5枚以上、または同色の赤5が2枚以上
    #[error("{} overflow: {tile} x{count}", overflow_label(.red))]
    Overflow {
        tile: String,
        count: usize,
        red: bool,
    },
    /// 待ち牌計算などで手牌枚数が合わない
    #[error("invalid hand size: expected {expected} tiles, got {actual}")]
    InvalidSize { expected: usize, actual: usize },
    /// 鳴きアクション種別が不明
    #[error("unknown action type: '{action}'")]
    UnknownActionType { action: String },
    /// 面子の形が種別と合わない（順子でないチー、異種の刻子など）
    #[error("malformed {meld}: {tiles}")]
    MalformedMeld { meld: String, tiles: String },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidTile { .. } => ErrorKind::InvalidTile,
            EngineError::Overflow { .. } => ErrorKind::Overflow,
            EngineError::InvalidSize { .. } => ErrorKind::InvalidSize,
            EngineError::UnknownActionType { .. } => ErrorKind::UnknownActionType,
            EngineError::MalformedMeld { .. } => ErrorKind::MalformedMeld,
        }
    }

    pub(crate) fn invalid_tile(token: impl Into<String>) -> Self {
        EngineError::InvalidTile {
            token: token.into(),
        }
    }
}

fn overflow_label(red: &bool) -> &'static str {
    if *red {
        "red"
    } else {
        "tile"
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
