//! Error types.

use thiserror::Error;

/// Errors raised by the rules engine.
///
/// Normal game outcomes (no tile can move, nothing to undo, board full) are
/// not errors; they are silent no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid direction code {0} (expected 0..=3)")]
    InvalidDirection(u8),

    #[error("invalid direction name {0:?}")]
    InvalidDirectionName(String),

    #[error("invalid rotation name {0:?}")]
    InvalidRotationName(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Reasons a serialized board or game snapshot is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("board size {found} does not match expected size {expected}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },

    #[error("tile stored at ({x}, {y}) claims position ({px}, {py})")]
    PositionMismatch { x: usize, y: usize, px: i32, py: i32 },

    #[error("tile at ({x}, {y}) has invalid value {value}")]
    InvalidValue { x: usize, y: usize, value: u64 },

    #[error("board size must be positive")]
    EmptyBoard,

    #[error("board size {0} exceeds the largest supported size")]
    Oversized(usize),

    #[error("move counter {0} is below -1")]
    InvalidMoves(i64),
}
