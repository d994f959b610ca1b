//! Game session: the state machine behind every player command.
//!
//! A [`Session`] processes one [`Command`] at a time to completion. Every
//! accepted mutation ends in an actuation: the best score is updated, the
//! snapshot is persisted (or cleared once the game is over) and the
//! [`Actuator`] is handed the board plus [`Metadata`].

use std::collections::VecDeque;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::GameError;
use crate::snapshot::GameSnapshot;
use crate::{is_tile_value, Direction, Position, Rotation, Tile, MAX_BOARD_SIZE, MAX_TILE_VALUE};

/// Probability that a spawned tile is a 2 rather than a 4.
const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// Session settings, fixed for the session's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Board width and height.
    pub size: usize,
    /// Tiles spawned on a new game.
    pub start_tiles: usize,
    /// Maximum number of undoable moves kept.
    pub undo_limit: usize,
    /// Merging into this value wins the game.
    pub winning_value: u64,
    /// Seed for tile spawning.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            size: 4,
            start_tiles: 2,
            undo_limit: 5,
            winning_value: 2048,
            seed: 0,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.size == 0 {
            return Err(GameError::InvalidConfig("board size must be positive".into()));
        }
        if self.size > MAX_BOARD_SIZE {
            return Err(GameError::InvalidConfig(format!(
                "board size {} exceeds {}",
                self.size, MAX_BOARD_SIZE
            )));
        }
        if self.winning_value < 4 || !is_tile_value(self.winning_value) {
            return Err(GameError::InvalidConfig(format!(
                "winning value {} is not a power of two in 4..={}",
                self.winning_value, MAX_TILE_VALUE
            )));
        }
        Ok(())
    }
}

/// Persistence collaborator.
pub trait Storage {
    /// The last persisted game, if any. Unreadable state is reported as absent.
    fn game_state(&self) -> Option<GameSnapshot>;
    fn set_game_state(&mut self, state: &GameSnapshot);
    fn clear_game_state(&mut self);
    fn best_score(&self) -> u64;
    fn set_best_score(&mut self, score: u64);
}

/// Display collaborator.
pub trait Actuator {
    /// Prepare an empty grid of `size`×`size` cells.
    fn build_grid(&mut self, _size: usize) {}

    /// Show the board after an accepted mutation.
    fn actuate(&mut self, board: &Board, metadata: &Metadata);

    /// Dismiss any win/lose/confirmation prompt.
    fn continue_game(&mut self) {}

    /// Ask the player to confirm a restart.
    fn prompt_restart(&mut self) {}
}

/// An actuator that displays nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullActuator;

impl Actuator for NullActuator {
    fn actuate(&mut self, _board: &Board, _metadata: &Metadata) {}
}

/// Everything besides the board that an actuation reports.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub moves: i64,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub best_score: u64,
    pub terminated: bool,
}

/// The commands an input source can deliver.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Command {
    Move(Direction),
    Rotate(Rotation),
    FlipX,
    FlipY,
    Restart,
    RestartWithConfirmation,
    KeepPlaying,
    Undo,
}

/// One game session.
pub struct Session<S: Storage, A: Actuator> {
    config: Config,
    board: Board,
    score: u64,
    /// Incremented on every actuation; starts at -1 so the first one reports 0.
    moves: i64,
    over: bool,
    won: bool,
    keep_playing: bool,
    /// Pre-move snapshots, oldest first.
    history: VecDeque<GameSnapshot>,
    /// What the last actuation persisted; the undo point for the next move.
    persisted: GameSnapshot,
    rng: StdRng,
    storage: S,
    actuator: A,
}

impl<S: Storage, A: Actuator> Session<S, A> {
    /// Create a session and restore or start a game.
    ///
    /// Call [`Session::begin`] to show the initial state.
    pub fn new(config: Config, storage: S, actuator: A) -> Result<Self, GameError> {
        config.validate()?;

        let board = Board::new(config.size);
        let persisted = GameSnapshot {
            grid: board.serialize(),
            moves: -1,
            score: 0,
            over: false,
            won: false,
            keep_playing: false,
        };

        let mut session = Session {
            config,
            board,
            score: 0,
            moves: -1,
            over: false,
            won: false,
            keep_playing: false,
            history: VecDeque::with_capacity(config.undo_limit),
            persisted,
            rng: StdRng::seed_from_u64(config.seed),
            storage,
            actuator,
        };
        session.setup();
        Ok(session)
    }

    /// Show the current state.
    pub fn begin(&mut self) {
        self.actuate();
    }

    /// Route one command to its handler.
    pub fn dispatch(&mut self, command: Command) {
        debug!("command {:?}", command);
        match command {
            Command::Move(direction) => {
                self.move_tiles(direction);
            }
            Command::Rotate(rotation) => self.rotate(rotation),
            Command::FlipX => self.flip_x(),
            Command::FlipY => self.flip_y(),
            Command::Restart => self.restart(),
            Command::RestartWithConfirmation => self.restart_with_confirmation(),
            Command::KeepPlaying => self.keep_playing_ack(),
            Command::Undo => self.undo(),
        }
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn moves(&self) -> i64 {
        self.moves
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn keep_playing(&self) -> bool {
        self.keep_playing
    }

    /// Over, or won without the player choosing to continue.
    pub fn is_terminated(&self) -> bool {
        self.over || (self.won && !self.keep_playing)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// The current state in persisted form.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid: self.board.serialize(),
            moves: self.moves,
            score: self.score,
            over: self.over,
            won: self.won,
            keep_playing: self.keep_playing,
        }
    }

    // ========== Setup ==========

    fn setup(&mut self) {
        self.actuator.build_grid(self.config.size);

        match self.storage.game_state() {
            Some(previous) => match self.load_from_previous_state(&previous) {
                Ok(()) => info!("restored game at move {} with score {}", self.moves, self.score),
                Err(e) => {
                    warn!("ignoring persisted game: {}", e);
                    self.create_new_state();
                }
            },
            None => self.create_new_state(),
        }
    }

    /// Start a fresh game and spawn the starting tiles.
    pub fn create_new_state(&mut self) {
        self.board = Board::new(self.config.size);
        self.moves = -1;
        self.score = 0;
        self.over = false;
        self.won = false;
        self.keep_playing = false;

        for _ in 0..self.config.start_tiles {
            self.add_random_tile();
        }
        self.persisted = self.snapshot();
        info!("new {}x{} game", self.config.size, self.config.size);
    }

    /// Switch to a game from outside this session, such as a saved file.
    ///
    /// Unlike an undo restore, the undo history of the abandoned game is
    /// dropped. On error nothing changes. Call [`Session::begin`] to show it.
    pub fn load_game(&mut self, snapshot: &GameSnapshot) -> Result<(), GameError> {
        self.load_from_previous_state(snapshot)?;
        self.history.clear();
        self.actuator.continue_game();
        info!("loaded game at move {} with score {}", self.moves, self.score);
        Ok(())
    }

    /// Replace the whole game state with `previous`.
    ///
    /// The snapshot is validated first; on error nothing changes.
    pub fn load_from_previous_state(&mut self, previous: &GameSnapshot) -> Result<(), GameError> {
        previous.validate(self.config.size)?;
        self.board = Board::from_snapshot(&previous.grid)?;
        self.moves = previous.moves;
        self.score = previous.score;
        self.over = previous.over;
        self.won = previous.won;
        self.keep_playing = previous.keep_playing;
        self.persisted = previous.clone();
        Ok(())
    }

    /// Spawn a 2 (90%) or a 4 (10%) in a random empty cell.
    pub fn add_random_tile(&mut self) {
        if !self.board.cells_available() {
            return;
        }
        let value = if self.rng.random_bool(SPAWN_TWO_PROBABILITY) { 2 } else { 4 };
        if let Some(position) = self.board.random_available_cell(&mut self.rng) {
            trace!("spawn {} at {}", value, position);
            self.board.insert_tile(Tile::new(position, value));
        }
    }

    fn actuate(&mut self) {
        if self.storage.best_score() < self.score {
            self.storage.set_best_score(self.score);
        }

        let snapshot = self.snapshot();
        if self.over {
            self.storage.clear_game_state();
        } else {
            self.storage.set_game_state(&snapshot);
        }
        self.persisted = snapshot;

        self.moves = self.moves.saturating_add(1);
        let metadata = Metadata {
            moves: self.moves,
            score: self.score,
            over: self.over,
            won: self.won,
            best_score: self.storage.best_score(),
            terminated: self.is_terminated(),
        };
        self.actuator.actuate(&self.board, &metadata);
    }

    // ========== Moves ==========

    /// Clear merge markers and remember where every tile started.
    fn prepare_tiles(&mut self) {
        for tile in self.board.tiles_mut() {
            tile.merged_from = None;
            tile.save_position();
        }
    }

    /// Cells in processing order: farthest along `direction` first.
    pub fn build_traversals(&self, direction: Direction) -> Vec<Position> {
        let (dx, dy) = direction.vector();
        let size = self.board.coordinate_limit();

        let mut xs: Vec<i32> = (0..size).collect();
        let mut ys: Vec<i32> = (0..size).collect();
        if dx == 1 {
            xs.reverse();
        }
        if dy == 1 {
            ys.reverse();
        }

        xs.iter()
            .flat_map(|&x| ys.iter().map(move |&y| Position::new(x, y)))
            .collect()
    }

    /// Walk from `cell` along `direction` over empty cells.
    ///
    /// Returns the last empty cell reached (or `cell` itself) and the first
    /// cell beyond it, which is either occupied or off the board.
    pub fn find_farthest_position(&self, cell: Position, direction: Direction) -> (Position, Position) {
        let (dx, dy) = direction.vector();
        let mut previous = cell;
        let mut next = cell.offset(dx, dy);
        while self.board.within_bounds(next) && self.board.cell_available(next) {
            previous = next;
            next = next.offset(dx, dy);
        }
        (previous, next)
    }

    /// Slide every tile toward `direction`, merging equal pairs.
    ///
    /// Returns whether the move was accepted. A rejected move (terminated
    /// game, or nothing could slide or merge) leaves score, counter, history
    /// and occupancy untouched and spawns nothing.
    pub fn move_tiles(&mut self, direction: Direction) -> bool {
        if self.is_terminated() {
            debug!("move {} ignored: game terminated", direction);
            return false;
        }

        let traversals = self.build_traversals(direction);
        let previous_state = self.persisted.clone();
        let mut moved = false;

        self.prepare_tiles();

        for cell in traversals {
            let Some(mut tile) = self.board.set_tile(cell, None) else {
                continue;
            };
            let (farthest, next) = self.find_farthest_position(cell, direction);

            // A tile produced by a merge this move cannot merge again.
            let mergeable = self
                .board
                .cell_content(next)
                .is_some_and(|other| tile.can_merge_with(other) && !other.is_merged());
            let target = if mergeable { self.board.remove_tile(next) } else { None };

            let destination = match target {
                Some(other) => {
                    tile.update_position(next);
                    let mut merged = Tile::new(next, tile.value * 2);
                    merged.merged_from = Some(Box::new([tile, other]));

                    self.score = self.score.saturating_add(merged.value);
                    self.won = self.won || merged.value == self.config.winning_value;
                    trace!("merge into {} at {}", merged.value, next);

                    self.board.insert_tile(merged);
                    next
                }
                None => {
                    tile.update_position(farthest);
                    self.board.set_tile(farthest, Some(tile));
                    farthest
                }
            };

            if destination != cell {
                moved = true;
            }
        }

        if !moved {
            debug!("move {} rejected: nothing moved", direction);
            return false;
        }

        if self.history.len() >= self.config.undo_limit {
            self.history.pop_front();
        }
        if self.history.len() < self.config.undo_limit {
            self.history.push_back(previous_state);
        }

        self.add_random_tile();
        self.over = !self.moves_available();
        if self.over {
            info!("game over with score {}", self.score);
        }

        self.actuate();
        true
    }

    /// An empty cell exists or two neighbours share a value.
    pub fn moves_available(&self) -> bool {
        self.board.cells_available() || self.tile_matches_available()
    }

    fn tile_matches_available(&self) -> bool {
        self.board.tiles().any(|tile| {
            Direction::ALL.into_iter().any(|direction| {
                let (dx, dy) = direction.vector();
                self.board
                    .cell_content(tile.position.offset(dx, dy))
                    .is_some_and(|other| tile.can_merge_with(other))
            })
        })
    }

    // ========== Transforms ==========

    pub fn rotate(&mut self, rotation: Rotation) {
        if self.over {
            return;
        }
        self.prepare_tiles();
        self.board.rotate(rotation);
        self.actuate();
    }

    pub fn flip_x(&mut self) {
        if self.over {
            return;
        }
        self.prepare_tiles();
        self.board.flip_x();
        self.actuate();
    }

    pub fn flip_y(&mut self) {
        if self.over {
            return;
        }
        self.prepare_tiles();
        self.board.flip_y();
        self.actuate();
    }

    // ========== History & lifecycle ==========

    /// Restore the state before the most recent move.
    pub fn undo(&mut self) {
        let Some(target) = self.history.pop_back() else {
            return;
        };

        if self.over {
            self.actuator.continue_game();
        }

        if let Err(e) = self.load_from_previous_state(&target) {
            warn!("discarding undo entry: {}", e);
            return;
        }
        debug!("undo to move {}", self.moves);
        self.actuate();
    }

    /// Abandon the current game and start a new one.
    pub fn restart(&mut self) {
        self.storage.clear_game_state();
        self.actuator.continue_game();
        self.history.clear();
        self.setup();
        self.begin();
    }

    pub fn restart_with_confirmation(&mut self) {
        self.actuator.prompt_restart();
    }

    /// Continue playing after reaching the winning value.
    pub fn keep_playing_ack(&mut self) {
        self.keep_playing = true;
        self.actuator.continue_game();
    }
}
