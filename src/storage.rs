//! In-memory key/value storage holding JSON text.

use std::collections::HashMap;

use log::warn;

use crate::session::Storage;
use crate::snapshot::GameSnapshot;

const BEST_SCORE_KEY: &str = "bestScore";
const GAME_STATE_KEY: &str = "gameState";

/// String key/value store with the layout of a browser local store:
/// the best score as decimal text, the game as a JSON document.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        self.items.insert(key.to_string(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }

    /// The raw persisted game document, if any.
    pub fn game_state_json(&self) -> Option<&str> {
        self.get_item(GAME_STATE_KEY)
    }

    /// Store a raw game document without checking it.
    pub fn set_game_state_json(&mut self, json: impl Into<String>) {
        self.set_item(GAME_STATE_KEY, json);
    }
}

impl Storage for MemoryStorage {
    fn game_state(&self) -> Option<GameSnapshot> {
        let json = self.get_item(GAME_STATE_KEY)?;
        match GameSnapshot::from_json(json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("unreadable game state: {}", e);
                None
            }
        }
    }

    fn set_game_state(&mut self, state: &GameSnapshot) {
        match state.to_json() {
            Ok(json) => self.set_item(GAME_STATE_KEY, json),
            Err(e) => warn!("failed to encode game state: {}", e),
        }
    }

    fn clear_game_state(&mut self) {
        self.remove_item(GAME_STATE_KEY);
    }

    fn best_score(&self) -> u64 {
        self.get_item(BEST_SCORE_KEY)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn set_best_score(&mut self, score: u64) {
        self.set_item(BEST_SCORE_KEY, score.to_string());
    }
}
