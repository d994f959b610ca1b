//! The N×N grid of optional tiles and its geometric transforms.

use log::warn;
use rand::Rng;

use crate::error::SnapshotError;
use crate::snapshot::{validate_tiles, GridSnapshot, TileSnapshot};
use crate::{Position, Rotation, Tile};

/// Board of `size`×`size` cells.
///
/// Invariant: a tile stored at `cells[x][y]` has `position == (x, y)`.
/// [`Board::transpose`] is the one operation that leaves positions stale;
/// it is always followed by a flip inside [`Board::rotate`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    size: usize,
    cells: Vec<Vec<Option<Tile>>>,
}

impl Board {
    /// Create an empty board.
    pub fn new(size: usize) -> Board {
        Board {
            size,
            cells: Self::empty_cells(size),
        }
    }

    /// Rebuild a board from a snapshot.
    ///
    /// Every stored tile becomes a fresh [`Tile`] without move history.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Result<Board, SnapshotError> {
        Self::with_tiles(snapshot.size, &snapshot.tiles)
    }

    /// Create a board of `size` populated from `previous` (`previous[x][y]`).
    pub fn with_tiles(
        size: usize,
        previous: &[Vec<Option<TileSnapshot>>],
    ) -> Result<Board, SnapshotError> {
        validate_tiles(size, previous)?;

        let cells = previous
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|tile| tile.map(|t| Tile::new(t.position, t.value)))
                    .collect()
            })
            .collect();

        Ok(Board { size, cells })
    }

    /// The board width as a coordinate. Sizes past [`crate::MAX_BOARD_SIZE`] are
    /// rejected by config and snapshot validation.
    #[inline]
    pub(crate) fn coordinate_limit(&self) -> i32 {
        i32::try_from(self.size).unwrap_or(i32::MAX)
    }

    fn empty_cells(size: usize) -> Vec<Vec<Option<Tile>>> {
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Array indices for `position`, or `None` when it is off the board.
    #[inline]
    fn index(&self, position: Position) -> Option<(usize, usize)> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        (x < self.size && y < self.size).then_some((x, y))
    }

    #[inline]
    pub fn within_bounds(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// The tile at `position`. Off-board positions are simply empty.
    pub fn cell_content(&self, position: Position) -> Option<&Tile> {
        let (x, y) = self.index(position)?;
        self.cells[x][y].as_ref()
    }

    #[inline]
    pub fn cell_available(&self, position: Position) -> bool {
        !self.cell_occupied(position)
    }

    #[inline]
    pub fn cell_occupied(&self, position: Position) -> bool {
        self.cell_content(position).is_some()
    }

    /// All empty positions, x outer and y inner.
    pub fn available_cells(&self) -> Vec<Position> {
        self.positions()
            .filter(|&p| self.cell_available(p))
            .collect()
    }

    pub fn cells_available(&self) -> bool {
        self.cells.iter().flatten().any(Option::is_none)
    }

    /// Pick an empty position uniformly at random.
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let cells = self.available_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[rng.random_range(0..cells.len())])
    }

    /// Every position on the board, x outer and y inner.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = self.coordinate_limit();
        (0..size).flat_map(move |x| (0..size).map(move |y| Position::new(x, y)))
    }

    /// Occupied cells in enumeration order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten().flatten()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> + '_ {
        self.cells.iter_mut().flatten().flatten()
    }

    /// Place `tile` at its own position. Off-board tiles are dropped.
    pub fn insert_tile(&mut self, tile: Tile) {
        match self.index(tile.position) {
            Some((x, y)) => self.cells[x][y] = Some(tile),
            None => warn!("dropping tile {} placed off board at {}", tile.value, tile.position),
        }
    }

    /// Clear the cell at `position`, returning what was there.
    pub fn remove_tile(&mut self, position: Position) -> Option<Tile> {
        let (x, y) = self.index(position)?;
        self.cells[x][y].take()
    }

    /// Write a cell directly, returning its previous content.
    ///
    /// Unlike [`Board::insert_tile`] this does not look at the tile's own
    /// position; the caller is responsible for keeping them in step.
    pub fn set_tile(&mut self, position: Position, tile: Option<Tile>) -> Option<Tile> {
        let (x, y) = self.index(position)?;
        std::mem::replace(&mut self.cells[x][y], tile)
    }

    // ========== Geometry ==========

    /// Swap rows and columns: `cells[y][x] <- cells[x][y]`.
    ///
    /// Tile positions are not rewritten.
    pub fn transpose(&mut self) {
        for x in 0..self.size {
            for y in (x + 1)..self.size {
                let a = self.cells[x][y].take();
                let b = self.cells[y][x].take();
                self.cells[x][y] = b;
                self.cells[y][x] = a;
            }
        }
    }

    /// Mirror along the x axis: `x -> size - 1 - x`.
    pub fn flip_x(&mut self) {
        self.cells.reverse();
        self.update_tiles();
    }

    /// Mirror along the y axis: `y -> size - 1 - y`.
    pub fn flip_y(&mut self) {
        for column in &mut self.cells {
            column.reverse();
        }
        self.update_tiles();
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        match rotation {
            Rotation::Left => {
                self.transpose();
                self.flip_y();
            }
            Rotation::Right => {
                self.transpose();
                self.flip_x();
            }
        }
    }

    /// Rotate clockwise by `n` quarter turns (any integer, taken modulo 4).
    pub fn rotate_quarter_turns(&mut self, n: i32) {
        match n.rem_euclid(4) {
            1 => self.rotate(Rotation::Right),
            2 => {
                self.cells.reverse();
                self.flip_y();
            }
            3 => self.rotate(Rotation::Left),
            _ => {}
        }
    }

    /// Re-derive every tile position from the cell it sits in.
    fn update_tiles(&mut self) {
        for (x, column) in self.cells.iter_mut().enumerate() {
            for (y, cell) in column.iter_mut().enumerate() {
                if let Some(tile) = cell {
                    tile.update_position(Position::new(x as i32, y as i32));
                }
            }
        }
    }

    pub fn serialize(&self) -> GridSnapshot {
        GridSnapshot {
            size: self.size,
            tiles: self
                .cells
                .iter()
                .map(|column| column.iter().map(|c| c.as_ref().map(Tile::serialize)).collect())
                .collect(),
        }
    }
}
