//! Level selection and unlock count

use crate::persistence::{KeyValueStore, SharedStore};

/// Storage key for the number of available levels
pub const LEVEL_COUNT_KEY: &str = "LevelCount";
/// Level count used until one is stored
pub const DEFAULT_LEVEL_COUNT: usize = 10;

/// Where to go after a level ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextScene {
    Level(usize),
    Home,
}

/// Which level is selected and how many exist
pub struct LevelProgression {
    store: SharedStore,
    selected: usize,
    level_count: usize,
}

impl std::fmt::Debug for LevelProgression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelProgression")
            .field("selected", &self.selected)
            .field("level_count", &self.level_count)
            .finish()
    }
}

impl LevelProgression {
    pub fn load(store: SharedStore) -> Self {
        let level_count = store
            .borrow()
            .get(LEVEL_COUNT_KEY)
            .and_then(|raw| match raw.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::warn!("Ignoring unreadable level count '{raw}'");
                    None
                }
            })
            .unwrap_or(DEFAULT_LEVEL_COUNT);
        Self {
            store,
            selected: 0,
            level_count,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, level: usize) {
        self.selected = level;
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Change and persist the level count
    pub fn set_level_count(&mut self, count: usize) {
        self.level_count = count;
        let mut store = self.store.borrow_mut();
        store.set(LEVEL_COUNT_KEY, count.to_string());
        if let Err(e) = store.flush() {
            log::warn!("Could not save level count: {e}");
        }
    }

    pub fn is_last_level(&self) -> bool {
        self.selected == self.level_count
    }

    /// Advance to the next level if it exists, otherwise head home.
    /// The selection only moves when the next level exists.
    pub fn next_level(&mut self, exists: impl Fn(usize) -> bool) -> NextScene {
        let Some(next) = self.selected.checked_add(1) else {
            log::warn!("Level index {} has no successor; returning home", self.selected);
            return NextScene::Home;
        };
        if exists(next) {
            self.selected = next;
            log::info!("Loading level {next}");
            NextScene::Level(next)
        } else {
            log::info!("No level {next}; returning home");
            NextScene::Home
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, shared};

    #[test]
    fn test_default_and_stored_count() {
        let store = shared(MemoryStore::new());
        assert_eq!(LevelProgression::load(store.clone()).level_count(), DEFAULT_LEVEL_COUNT);

        LevelProgression::load(store.clone()).set_level_count(14);
        assert_eq!(LevelProgression::load(store).level_count(), 14);
    }

    #[test]
    fn test_bad_stored_count_uses_default() {
        let store = shared(MemoryStore::new());
        store.borrow_mut().set(LEVEL_COUNT_KEY, "many".to_string());
        assert_eq!(LevelProgression::load(store).level_count(), DEFAULT_LEVEL_COUNT);
    }

    #[test]
    fn test_next_level() {
        let mut levels = LevelProgression::load(shared(MemoryStore::new()));
        levels.select(2);
        assert_eq!(levels.next_level(|n| n <= 3), NextScene::Level(3));
        assert_eq!(levels.selected(), 3);
        assert_eq!(levels.next_level(|n| n <= 3), NextScene::Home);
        assert_eq!(levels.selected(), 3);
    }

    #[test]
    fn test_next_level_from_last_index_goes_home() {
        let mut levels = LevelProgression::load(shared(MemoryStore::new()));
        levels.select(usize::MAX);
        assert_eq!(levels.next_level(|_| true), NextScene::Home);
        assert_eq!(levels.selected(), usize::MAX);
    }

    #[test]
    fn test_is_last_level() {
        let mut levels = LevelProgression::load(shared(MemoryStore::new()));
        levels.set_level_count(5);
        levels.select(4);
        assert!(!levels.is_last_level());
        levels.select(5);
        assert!(levels.is_last_level());
    }
}
