//! Provides `LevelsWithItems`, the child items of one parent separated into
//! their levels.

use std::collections::HashMap;

use crate::item::Item;

/// The child items of one parent, separated into their levels.
///
/// Within a level, items keep the order in which they were added; the order
/// carries no meaning to the search algorithm but makes results stable.
#[derive(Clone, Debug)]
pub struct LevelsWithItems<I: Item> {
    /// The children at each level.
    items: HashMap<i32, Vec<I>>,
}

impl<I: Item> LevelsWithItems<I> {
    /// Creates an empty set of levels.
    #[must_use]
    pub fn new() -> Self {
        Self { items: HashMap::new() }
    }

    /// Adds an item at the specified level.
    pub fn add(&mut self, level: i32, item: I) {
        self.items.entry(level).or_default().push(item);
    }

    /// Replaces the items for an entire level.
    pub fn set(&mut self, level: i32, items: Vec<I>) {
        self.items.insert(level, items);
    }

    /// The items at the specified level, in insertion order.
    #[must_use]
    pub fn items_at(&self, level: i32) -> &[I] {
        self.items.get(&level).map_or(&[], Vec::as_slice)
    }

    /// Removes and returns the items at the specified level.
    pub fn take_items_at(&mut self, level: i32) -> Vec<I> {
        self.items.remove(&level).unwrap_or_default()
    }

    /// The levels that currently hold items, highest first.
    #[must_use]
    pub fn levels(&self) -> Vec<i32> {
        let mut levels = self.items.keys().copied().collect::<Vec<_>>();
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels
    }

    /// Whether no level holds any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.values().all(Vec::is_empty)
    }

    /// The total number of items across all levels.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// Flattens the levels into a single sequence, highest level first.
    #[must_use]
    pub fn into_items(mut self) -> Vec<I> {
        self.levels()
            .into_iter()
            .flat_map(|level| self.items.remove(&level).unwrap_or_default())
            .collect()
    }
}

impl<I: Item> Default for LevelsWithItems<I> {
    fn default() -> Self {
        Self::new()
    }
}
