//! Provides the `Store` trait and the stock implementations.
//!
//! A [`Store`] makes an entire tree accessible in an extensible way. The tree
//! itself owns no edges; implementations may keep them in memory, in a file,
//! or in a remote key/value service, and any implementation satisfying the
//! contract below is substitutable.

mod in_memory;
mod partitioned;

#[allow(clippy::module_name_repetitions)]
pub use in_memory::InMemoryStore;
#[allow(clippy::module_name_repetitions)]
pub use partitioned::{PartitionedStore, PartitioningFn};

use crate::{item::Item, levels::LevelsWithItems};

/// Persistent storage for the edges of a single tree.
///
/// The state of a tree is a set of edges `(parent, child, level)`, held as a
/// `parent -> (level -> children)` mapping. The parent key is `Option<I>`;
/// `None` is the root sentinel under which root items live.
///
/// Each `Store` instance holds the data for a single tree, so any keys or
/// identifiers needed to address that tree belong to the instance.
///
/// Identity of items is defined by the implementation: a store may key by
/// handle equality (as [`InMemoryStore`] does) or by distance-zero equality.
/// Either way, distance-zero duplicates with distinct handles are a
/// legitimate data-modelling case and must be preserved as separate items.
pub trait Store<I: Item>: Send + Sync {
    /// Loads the explicit child items of each of the specified parents, along
    /// with their levels.
    ///
    /// The result preserves order: the child set at position `i` belongs to
    /// `parents[i]`. A parent of `None` loads the root items.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying storage.
    fn load_children(&self, parents: &[Option<I>]) -> Result<Vec<LevelsWithItems<I>>, String>;

    /// Saves an item as a child of the specified parent, at the given level.
    /// A parent of `None` adds the item to the root set.
    ///
    /// Implementations are free to assume that this is only called for new,
    /// never-before-seen items; a duplicate entry under the same parent is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying storage.
    fn add_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String>;

    /// Updates the parent and level of an existing item.
    ///
    /// It is valid for items to be re-parented. When the new parent is
    /// `None`, the implementation must first detach the item from any prior
    /// root entry at any level, so the root set never holds the same item
    /// twice.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying storage.
    fn update_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String>;

    /// Disassociates an item from the specified parent at the given level,
    /// and deletes the item's own child entry. If no such edge exists this
    /// has no effect.
    ///
    /// Children of the removed item continue to exist as orphans; the tree
    /// re-parents them.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying storage.
    fn remove_item(&self, item: &I, parent: Option<&I>, level: i32) -> Result<(), String>;

    /// Runs `f` while holding a store-wide read lock over the tree's root
    /// metadata.
    ///
    /// Stores shared between processes use this to make root reads coherent;
    /// the trivial implementation just calls `f`.
    fn with_root_read_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        f()
    }

    /// Runs `f` while holding a store-wide write lock over the tree's root
    /// metadata.
    ///
    /// Stores shared between processes use this to serialise root mutations;
    /// the trivial implementation just calls `f`.
    fn with_root_write_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        f()
    }
}
