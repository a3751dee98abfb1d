//! Session storage: key to puzzle, created lazily, shared by all readers.
//!
//! The map lock is held only long enough to fetch or insert a per-key cell.
//! Generation itself runs outside the lock inside the cell's one-time init,
//! so concurrent first requests for one key block on the winner instead of
//! generating twice, and requests for other keys proceed untouched.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::generate::GenerateError;
use crate::puzzle::Puzzle;

type PuzzleCell = Arc<OnceCell<Arc<Puzzle>>>;

/// Shared store of generated puzzles, keyed by session key.
///
/// Entries live for the process lifetime. Date keys keep the population
/// bounded at one per day; token keys grow with every new game.
#[derive(Default)]
pub struct SessionStore {
    games: RwLock<HashMap<String, PuzzleCell>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puzzle stored under `key`, if one has finished generating.
    ///
    /// A key whose first generation is still in flight (or failed) reads as
    /// absent.
    pub fn get(&self, key: &str) -> Option<Arc<Puzzle>> {
        self.games.read().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Returns the puzzle for `key`, running `generate` if the key has none.
    ///
    /// At most one `generate` runs per key at a time; losers of the race
    /// block and receive the winner's puzzle. A failed generation leaves the
    /// key unpopulated so a later call may retry.
    pub fn get_or_create<F>(&self, key: &str, generate: F) -> Result<Arc<Puzzle>, GenerateError>
    where
        F: FnOnce() -> Result<Puzzle, GenerateError>,
    {
        let cell = self.games.read().get(key).cloned();
        let cell = match cell {
            Some(cell) => cell,
            None => self.games.write().entry(key.to_string()).or_default().clone(),
        };
        cell.get_or_try_init(|| generate().map(Arc::new)).cloned()
    }

    /// Number of keys seen, populated or not.
    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }
}
