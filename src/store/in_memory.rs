//! An in-memory `Store` backed by a hash map.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::{item::Item, levels::LevelsWithItems, store::Store};

/// An in-memory [`Store`] backed by a `parent -> (level -> children)` map.
///
/// Identity is by handle: two items are the same entry iff they compare
/// equal (and hash equal). Distance-zero duplicates with distinct handles
/// are therefore stored, and returned, as separate items.
///
/// All operations take a single internal mutex, so each call is atomic with
/// respect to every other call: a concurrent reader observes an edge either
/// entirely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryStore<I: Item + Eq + Hash> {
    /// Edges of the tree. The `None` key is the root sentinel.
    items: Mutex<HashMap<Option<I>, HashMap<i32, Vec<I>>>>,
}

impl<I: Item + Eq + Hash> InMemoryStore<I> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    /// The number of items currently held.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.lock().keys().filter(|key| key.is_some()).count()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

impl<I: Item + Eq + Hash> Store<I> for InMemoryStore<I> {
    fn load_children(&self, parents: &[Option<I>]) -> Result<Vec<LevelsWithItems<I>>, String> {
        let items = self.items.lock();

        Ok(parents
            .iter()
            .map(|parent| {
                let mut levels = LevelsWithItems::new();
                if let Some(children) = items.get(parent) {
                    for (&level, level_items) in children {
                        levels.set(level, level_items.clone());
                    }
                }
                levels
            })
            .collect())
    }

    fn add_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        let mut items = self.items.lock();

        // the forward entry must exist so the item's children can be loaded
        items.entry(Some(item.clone())).or_default();

        let slot = items.entry(parent.cloned()).or_default().entry(level).or_default();
        if !slot.contains(item) {
            slot.push(item.clone());
        }

        Ok(())
    }

    fn update_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        let mut items = self.items.lock();

        if parent.is_none() {
            if let Some(root_levels) = items.get_mut(&None) {
                for level_items in root_levels.values_mut() {
                    level_items.retain(|existing| existing != item);
                }
            }
        }

        items.entry(Some(item.clone())).or_default();

        let slot = items.entry(parent.cloned()).or_default().entry(level).or_default();
        if !slot.contains(item) {
            slot.push(item.clone());
        }

        Ok(())
    }

    fn remove_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        let mut items = self.items.lock();

        let parent_key = parent.cloned();
        if let Some(levels) = items.get_mut(&parent_key) {
            if let Some(level_items) = levels.get_mut(&level) {
                level_items.retain(|existing| existing != item);
                if level_items.is_empty() {
                    levels.remove(&level);
                }
            }
        }

        items.remove(&Some(item.clone()));

        Ok(())
    }
}
