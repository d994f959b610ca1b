//! Plain serializable state, as handed to storage and restored by undo.
//!
//! ```json
//! {
//!   "grid": { "size": 4, "tiles": [[{"position": {"x": 0, "y": 0}, "value": 2}, null, ...], ...] },
//!   "moves": 3, "score": 12, "over": false, "won": false, "keepPlaying": false
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::{is_tile_value, Position, MAX_BOARD_SIZE};

/// A persisted tile: position and value only.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub position: Position,
    pub value: u64,
}

/// A persisted board. `tiles[x][y]` is the tile at `(x, y)`, or `null`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub tiles: Vec<Vec<Option<TileSnapshot>>>,
}

impl GridSnapshot {
    /// Check that the snapshot describes a well-formed `size`×`size` board.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        validate_tiles(self.size, &self.tiles)
    }
}

/// Check that `tiles` is a `size`×`size` grid whose tiles sit at their own
/// coordinates and hold tile values.
pub(crate) fn validate_tiles(
    size: usize,
    tiles: &[Vec<Option<TileSnapshot>>],
) -> Result<(), SnapshotError> {
    if size == 0 {
        return Err(SnapshotError::EmptyBoard);
    }
    if size > MAX_BOARD_SIZE {
        return Err(SnapshotError::Oversized(size));
    }
    if tiles.len() != size {
        return Err(SnapshotError::RowCount {
            expected: size,
            found: tiles.len(),
        });
    }

    for (x, column) in tiles.iter().enumerate() {
        if column.len() != size {
            return Err(SnapshotError::RowLength {
                row: x,
                expected: size,
                found: column.len(),
            });
        }
        for (y, tile) in column.iter().enumerate() {
            let Some(tile) = tile else { continue };
            let at = Position::new(x as i32, y as i32);
            if tile.position != at {
                return Err(SnapshotError::PositionMismatch {
                    x,
                    y,
                    px: tile.position.x,
                    py: tile.position.y,
                });
            }
            if !is_tile_value(tile.value) {
                return Err(SnapshotError::InvalidValue {
                    x,
                    y,
                    value: tile.value,
                });
            }
        }
    }

    Ok(())
}

/// Everything needed to resume a game.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub grid: GridSnapshot,
    pub moves: i64,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    #[serde(default)]
    pub keep_playing: bool,
}

impl GameSnapshot {
    /// Validate the grid and require it to be `expected_size` wide.
    pub fn validate(&self, expected_size: usize) -> Result<(), SnapshotError> {
        if self.grid.size != expected_size {
            return Err(SnapshotError::SizeMismatch {
                expected: expected_size,
                found: self.grid.size,
            });
        }
        // -1 is a game persisted before its first actuation.
        if self.moves < -1 {
            return Err(SnapshotError::InvalidMoves(self.moves));
        }
        self.grid.validate()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<GameSnapshot> {
        serde_json::from_str(json)
    }
}
