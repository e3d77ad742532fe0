//! A store that fans out across several underlying stores.

use std::hash::Hasher;

use fnv::FnvHasher;
use rayon::prelude::*;

use crate::{item::Item, levels::LevelsWithItems, store::Store};

/// Maps a parent key to a partition key. The argument is `None` for the root
/// sentinel. Must be pure: the same parent always maps to the same key.
pub type PartitioningFn<I> = fn(Option<&I>) -> String;

/// A [`Store`] that distributes operations across several underlying stores.
///
/// Each parent key is mapped to a partition key by a user-supplied function,
/// and the partition key is hashed to select the store responsible for that
/// parent. Operations for a given partition key are therefore always
/// assigned to the same store.
///
/// Batched loads are grouped by target store and dispatched in parallel;
/// the combined result preserves the caller's parent order, so a partitioned
/// store is indistinguishable from a single store to the tree above it.
#[allow(clippy::module_name_repetitions)]
pub struct PartitionedStore<I: Item, S: Store<I>> {
    /// Derives the partition key for a parent.
    partition_for_parent: PartitioningFn<I>,
    /// The underlying stores.
    stores: Vec<S>,
}

impl<I: Item, S: Store<I>> PartitionedStore<I, S> {
    /// Creates a store which distributes operations across `stores` using
    /// the specified partitioning function.
    ///
    /// # Errors
    ///
    /// If `stores` is empty.
    pub fn new(partition_for_parent: PartitioningFn<I>, stores: Vec<S>) -> Result<Self, String> {
        if stores.is_empty() {
            return Err("a partitioned store requires at least one underlying store".to_string());
        }

        Ok(Self {
            partition_for_parent,
            stores,
        })
    }

    /// The number of underlying stores.
    #[must_use]
    pub fn num_stores(&self) -> usize {
        self.stores.len()
    }

    /// The index of the store responsible for `parent`.
    #[allow(clippy::cast_possible_truncation)]
    fn store_index(&self, parent: Option<&I>) -> usize {
        let partition_key = (self.partition_for_parent)(parent);

        let mut hasher = FnvHasher::default();
        hasher.write(partition_key.as_bytes());

        (hasher.finish() as usize) % self.stores.len()
    }

    /// The store responsible for `parent`.
    fn store_for_parent(&self, parent: Option<&I>) -> &S {
        &self.stores[self.store_index(parent)]
    }
}

impl<I: Item, S: Store<I>> Store<I> for PartitionedStore<I, S> {
    fn load_children(&self, parents: &[Option<I>]) -> Result<Vec<LevelsWithItems<I>>, String> {
        // group the requested parents by their target store, remembering
        // where each one came from
        let mut groups: Vec<(Vec<Option<I>>, Vec<usize>)> =
            vec![(Vec::new(), Vec::new()); self.stores.len()];
        for (position, parent) in parents.iter().enumerate() {
            let index = self.store_index(parent.as_ref());
            groups[index].0.push(parent.clone());
            groups[index].1.push(position);
        }

        let loaded = groups
            .par_iter()
            .zip(self.stores.par_iter())
            .map(|((group_parents, positions), store)| {
                if group_parents.is_empty() {
                    return Ok(Vec::new());
                }
                let children = store.load_children(group_parents)?;
                Ok(children.into_iter().zip(positions.iter().copied()).collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, String>>()?;

        // reassemble in the caller's order
        let mut children = vec![LevelsWithItems::new(); parents.len()];
        for (child_levels, position) in loaded.into_iter().flatten() {
            children[position] = child_levels;
        }

        Ok(children)
    }

    fn add_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        self.store_for_parent(parent).add_item(item, parent, level)
    }

    fn update_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        self.store_for_parent(parent).update_item(item, parent, level)
    }

    fn remove_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String> {
        self.store_for_parent(parent).remove_item(item, parent, level)
    }

    fn with_root_read_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        self.store_for_parent(None).with_root_read_lock(f)
    }

    fn with_root_write_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        self.store_for_parent(None).with_root_write_lock(f)
    }
}
