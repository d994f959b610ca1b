//! WASM bindings for slide-merge-core
//!
//! Provides a JavaScript-friendly API around a [`Session`]. State lives in
//! memory; the host persists it with `saveState` / `loadState`.

use wasm_bindgen::prelude::*;

use crate::session::{Config, NullActuator, Session, Storage};
use crate::snapshot::GameSnapshot;
use crate::storage::MemoryStorage;
use crate::{Direction, Rotation};

/// WASM-friendly wrapper around Session
#[wasm_bindgen]
pub struct WasmGame {
    inner: Session<MemoryStorage, NullActuator>,
}

impl WasmGame {
    fn with_config_inner(config: Config) -> Result<WasmGame, JsError> {
        let mut inner = Session::new(config, MemoryStorage::new(), NullActuator)?;
        inner.begin();
        Ok(WasmGame { inner })
    }
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a new game on a size×size board
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize, seed: u64) -> Result<WasmGame, JsError> {
        let config = Config {
            size,
            seed,
            ..Config::default()
        };
        Self::with_config_inner(config)
    }

    /// Start a new game from a JSON config (missing fields use defaults)
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<WasmGame, JsError> {
        let config: Config = serde_json::from_str(config_json)?;
        Self::with_config_inner(config)
    }

    /// Slide tiles. Direction: 0=up, 1=right, 2=down, 3=left.
    /// Returns true if the board changed.
    #[wasm_bindgen(js_name = "move")]
    pub fn move_tiles(&mut self, direction: u8) -> Result<bool, JsError> {
        let direction = Direction::try_from(direction)?;
        Ok(self.inner.move_tiles(direction))
    }

    /// Rotate the board: "left" or "right"
    pub fn rotate(&mut self, rotation: &str) -> Result<(), JsError> {
        let rotation: Rotation = rotation.parse()?;
        self.inner.rotate(rotation);
        Ok(())
    }

    #[wasm_bindgen(js_name = flipX)]
    pub fn flip_x(&mut self) {
        self.inner.flip_x();
    }

    #[wasm_bindgen(js_name = flipY)]
    pub fn flip_y(&mut self) {
        self.inner.flip_y();
    }

    pub fn undo(&mut self) {
        self.inner.undo();
    }

    pub fn restart(&mut self) {
        self.inner.restart();
    }

    #[wasm_bindgen(js_name = keepPlaying)]
    pub fn keep_playing(&mut self) {
        self.inner.keep_playing_ack();
    }

    pub fn score(&self) -> u64 {
        self.inner.score()
    }

    #[wasm_bindgen(js_name = bestScore)]
    pub fn best_score(&self) -> u64 {
        self.inner.storage().best_score()
    }

    /// Move counter as last reported
    pub fn moves(&self) -> i64 {
        self.inner.moves()
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.inner.is_over()
    }

    #[wasm_bindgen(js_name = isWon)]
    pub fn is_won(&self) -> bool {
        self.inner.is_won()
    }

    #[wasm_bindgen(js_name = isTerminated)]
    pub fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }

    /// Tile values, x outer and y inner, 0 for empty cells
    pub fn cells(&self) -> Vec<u64> {
        let board = self.inner.board();
        board
            .positions()
            .map(|p| board.cell_content(p).map_or(0, |t| t.value))
            .collect()
    }

    /// Full snapshot as a JS object: { grid, moves, score, over, won, keepPlaying }
    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
    }

    /// Last persisted snapshot as JSON text, or undefined once the game is over
    #[wasm_bindgen(js_name = saveState)]
    pub fn save_state(&self) -> Option<String> {
        self.inner.storage().game_state_json().map(str::to_string)
    }

    /// Restore a snapshot produced by `saveState`. Malformed input is rejected
    /// and leaves the current game untouched. Undo history starts empty.
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&mut self, json: &str) -> Result<(), JsError> {
        let snapshot = GameSnapshot::from_json(json)?;
        self.inner.load_game(&snapshot)?;
        self.inner.begin();
        Ok(())
    }
}
