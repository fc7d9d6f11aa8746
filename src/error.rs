//! Error types for snapshot ingestion and the text protocol.

use thiserror::Error;

use crate::board::Pos;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised while reading or applying a turn snapshot.
///
/// Planning itself never fails: an unreachable target or an empty candidate
/// set simply skips the decision. Only malformed input is an error.
#[derive(Debug, Error)]
pub enum GameError {
    /// A tile row contained a character outside `# . O o X x`.
    #[error("Invalid tile code '{code}' at ({x}, {y})")]
    InvalidTileCode {
        /// Offending character.
        code: char,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A tile row had the wrong number of tiles.
    #[error("Tile row {row} has {len} tiles, expected {expected}")]
    RowLength {
        /// Row index.
        row: usize,
        /// Observed length.
        len: usize,
        /// Required length.
        expected: usize,
    },

    /// The snapshot carried the wrong number of tile rows.
    #[error("Snapshot has {0} tile rows")]
    RowCount(usize),

    /// Building type code outside 0..=2.
    #[error("Invalid building type: {0}")]
    InvalidBuildingType(i32),

    /// Owner flag other than 0 (me) or 1 (enemy).
    #[error("Invalid owner flag: {0}")]
    InvalidOwner(i32),

    /// Unit level outside 1..=3.
    #[error("Unit {id} has invalid level {level}")]
    InvalidUnitLevel {
        /// Unit id.
        id: i32,
        /// Reported level.
        level: i32,
    },

    /// A coordinate outside the grid.
    #[error("Position ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A player has no headquarters in the building list.
    #[error("No headquarters for {0}")]
    MissingHeadquarters(&'static str),

    /// A player has more than one headquarters.
    #[error("Duplicate headquarters for {0}")]
    DuplicateHeadquarters(&'static str),

    /// Input ended in the middle of a record.
    #[error("Unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    /// A token could not be parsed.
    #[error("Invalid token '{token}' for {field}")]
    InvalidToken {
        /// Raw token.
        token: String,
        /// What was being read.
        field: &'static str,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    /// Build an out-of-bounds error for a position.
    pub fn out_of_bounds(pos: Pos) -> Self {
        GameError::OutOfBounds { x: pos.x, y: pos.y }
    }
}
