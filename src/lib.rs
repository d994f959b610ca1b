//! Rules engine for the sliding-tile merge puzzle.
//!
//! # Coordinates
//!
//! ```text
//! Positions are (x, y), 0-indexed. x is the column, y the row:
//!
//!   (0,0) (1,0) (2,0) (3,0)
//!   (0,1) (1,1) (2,1) (3,1)
//!   (0,2) (1,2) (2,2) (3,2)
//!   (0,3) (1,3) (2,3) (3,3)
//!
//! Cells are stored column-major as cells[x][y]. Enumeration order
//! (available cells, tiles, snapshots) is x outer, y inner.
//! ```
//!
//! # Moves
//!
//! ```text
//! Up    = ( 0, -1)    code 0
//! Right = ( 1,  0)    code 1
//! Down  = ( 0,  1)    code 2
//! Left  = (-1,  0)    code 3
//! ```
//!
//! A [`Session`] owns one [`Board`] and drives it through the player verbs
//! (move, rotate, flip, undo, restart, keep playing). Persistence and display
//! are delegated to the [`Storage`] and [`Actuator`] collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod board;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod storage;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use board::Board;
pub use error::{GameError, SnapshotError};
pub use session::{Actuator, Command, Config, Metadata, NullActuator, Session, Storage};
pub use snapshot::{GameSnapshot, GridSnapshot, TileSnapshot};
pub use storage::MemoryStorage;

/// A cell coordinate on the board.
///
/// Coordinates are signed so that stepping off any edge yields a position
/// that is simply out of bounds rather than an overflow.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Position {
        Position { x, y }
    }

    /// The position one step along `(dx, dy)`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Position {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction of a sliding move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// All directions, in code order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit vector `(dx, dy)` for this direction.
    #[inline]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = GameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            _ => Err(GameError::InvalidDirection(code)),
        }
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::InvalidDirectionName(s.to_string()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A quarter-turn rotation of the whole board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Counter-clockwise: transpose, then flip y.
    Left,
    /// Clockwise: transpose, then flip x.
    Right,
}

impl Rotation {
    /// Equivalent number of clockwise quarter turns.
    #[inline]
    pub const fn quarter_turns(self) -> i32 {
        match self {
            Rotation::Right => 1,
            Rotation::Left => 3,
        }
    }
}

impl FromStr for Rotation {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(Rotation::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Rotation::Right)
        } else {
            Err(GameError::InvalidRotationName(s.to_string()))
        }
    }
}

/// A numbered piece on the board.
///
/// `previous_position` and `merged_from` only describe the most recent move
/// and are cleared before the next one. They are never persisted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tile {
    pub position: Position,
    pub value: u64,
    pub previous_position: Option<Position>,
    /// The moving and the stationary tile this one was created from.
    pub merged_from: Option<Box<[Tile; 2]>>,
}

impl Tile {
    pub fn new(position: Position, value: u64) -> Tile {
        Tile {
            position,
            value,
            previous_position: None,
            merged_from: None,
        }
    }

    /// Record the current position as the pre-move position.
    #[inline]
    pub fn save_position(&mut self) {
        self.previous_position = Some(self.position);
    }

    #[inline]
    pub fn update_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Equal values below [`MAX_TILE_VALUE`] combine into one tile.
    #[inline]
    pub fn can_merge_with(&self, other: &Tile) -> bool {
        self.value == other.value && self.value < MAX_TILE_VALUE
    }

    /// True if this tile was produced by a merge during the current move.
    #[inline]
    pub fn is_merged(&self) -> bool {
        self.merged_from.is_some()
    }

    pub fn serialize(&self) -> TileSnapshot {
        TileSnapshot {
            position: self.position,
            value: self.value,
        }
    }
}

/// Largest value a tile may hold. Two tiles of this value do not merge.
pub const MAX_TILE_VALUE: u64 = 1 << 62;

/// Largest board width, so every coordinate fits in an `i32`.
pub const MAX_BOARD_SIZE: usize = i32::MAX as usize;

/// True for 2, 4, 8, ... up to [`MAX_TILE_VALUE`].
#[inline]
pub(crate) fn is_tile_value(value: u64) -> bool {
    (2..=MAX_TILE_VALUE).contains(&value) && value.is_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_vectors() {
        assert_eq!(Direction::Up.vector(), (0, -1));
        assert_eq!(Direction::Right.vector(), (1, 0));
        assert_eq!(Direction::Down.vector(), (0, 1));
        assert_eq!(Direction::Left.vector(), (-1, 0));
    }

    #[test]
    fn test_direction_codes_roundtrip() {
        for d in Direction::ALL {
            assert_eq!(Direction::try_from(d as u8), Ok(d));
        }
    }

    #[test]
    fn test_invalid_direction_code_rejected() {
        assert_eq!(Direction::try_from(4), Err(GameError::InvalidDirection(4)));
        assert_eq!(Direction::try_from(255), Err(GameError::InvalidDirection(255)));
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("LEFT".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!(
            "north".parse::<Direction>(),
            Err(GameError::InvalidDirectionName("north".to_string()))
        );
    }

    #[test]
    fn test_rotation_from_str() {
        assert_eq!("left".parse::<Rotation>(), Ok(Rotation::Left));
        assert_eq!("Right".parse::<Rotation>(), Ok(Rotation::Right));
        assert!("half".parse::<Rotation>().is_err());
    }

    #[test]
    fn test_position_offset() {
        let p = Position::new(0, 0);
        assert_eq!(p.offset(-1, 0), Position::new(-1, 0));
        assert_eq!(p.offset(0, 1), Position::new(0, 1));
    }

    #[test]
    fn test_tile_position_bookkeeping() {
        let mut tile = Tile::new(Position::new(1, 2), 4);
        assert_eq!(tile.previous_position, None);
        assert!(!tile.is_merged());

        tile.save_position();
        tile.update_position(Position::new(0, 2));

        assert_eq!(tile.previous_position, Some(Position::new(1, 2)));
        assert_eq!(tile.position, Position::new(0, 2));
        assert_eq!(
            tile.serialize(),
            TileSnapshot {
                position: Position::new(0, 2),
                value: 4
            }
        );
    }

    #[test]
    fn test_tile_values() {
        assert!(is_tile_value(2));
        assert!(is_tile_value(2048));
        assert!(!is_tile_value(0));
        assert!(!is_tile_value(1));
        assert!(!is_tile_value(6));
        assert!(is_tile_value(MAX_TILE_VALUE));
        assert!(!is_tile_value(MAX_TILE_VALUE << 1));
    }

    #[test]
    fn test_largest_tiles_do_not_merge() {
        let a = Tile::new(Position::new(0, 0), MAX_TILE_VALUE);
        let b = Tile::new(Position::new(1, 0), MAX_TILE_VALUE);
        assert!(!a.can_merge_with(&b));

        let half = MAX_TILE_VALUE / 2;
        let c = Tile::new(Position::new(0, 0), half);
        let d = Tile::new(Position::new(1, 0), half);
        assert!(c.can_merge_with(&d));
        assert!(!c.can_merge_with(&a));
    }
}
