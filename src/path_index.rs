use crate::director::StageDirector;
use crate::tree_item::{ItemForest, ItemHandle};
use std::cell::RefCell;
use std::collections::HashMap;

/// External path -> first tree row registered for it.
///
/// Entries are weak: a lookup that finds the row gone (older forest) or its actor
/// destroyed drops the entry and reports a miss. Lookups take `&self` so a purge can
/// happen from inside a guarded selection sync.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: RefCell<HashMap<String, ItemHandle>>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `handle` unless the path already has a row. Returns whether it was recorded.
    pub fn register_first(&mut self, path: &str, handle: ItemHandle) -> bool {
        let entries = self.entries.get_mut();
        if entries.contains_key(path) {
            return false;
        }
        entries.insert(path.to_string(), handle);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
    }

    /// Resolves `path` against the live forest, purging the entry when it went stale.
    pub fn lookup(&self, path: &str, forest: &ItemForest, director: &dyn StageDirector) -> Option<ItemHandle> {
        let handle = *self.entries.borrow().get(path)?;
        let live = forest
            .get(handle)
            .is_some_and(|item| item.actor.map_or(true, |actor| director.is_actor_alive(actor)));
        if live {
            return Some(handle);
        }
        tracing::debug!("[outliner] purging stale lookup entry for {path}");
        self.entries.borrow_mut().remove(path);
        None
    }
}
