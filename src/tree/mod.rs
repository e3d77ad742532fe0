//! Provides the `Tree` struct and its operations.
//!
//! Each operation is a level-by-level descent over a cover set; the descents
//! themselves live in one module per operation.

mod find;
mod insert;
mod remove;
mod tracer;

pub use tracer::{TraceMetrics, Tracer};

use parking_lot::RwLock;

use crate::{
    item::{DistanceFn, Item},
    search::cover_set::CoverSet,
    store::Store,
};

/// An online cover tree for exact nearest-neighbour search over a metric
/// space.
///
/// The tree holds no items itself: all edges live in its [`Store`], and the
/// tree owns only its configuration and a lock guarding root-set mutations.
/// Items at level `L` lie within `basis^(L+1)` of their parent, so a descent
/// can discard whole subtrees whose covering radius cannot reach the query.
///
/// Multiple calls to [`Tree::insert`] and [`Tree::find_nearest`] are safe to
/// make concurrently. [`Tree::remove`] requires external synchronisation
/// against all other operations.
///
/// # Type Parameters
///
/// - `I`: The type of the items in the tree.
/// - `S`: The type of the [`Store`] holding the tree's edges.
#[derive(Debug)]
pub struct Tree<I: Item, S: Store<I>> {
    /// Logarithmic base for the per-level covering radii.
    pub(crate) basis: f64,
    /// The level at which root items live; fixed at construction.
    pub(crate) root_level: i32,
    /// The distance function over items.
    pub(crate) distance_between: DistanceFn<I>,
    /// Storage for the tree's edges.
    pub(crate) store: S,
    /// Guards mutations of the root set.
    pub(crate) root_lock: RwLock<()>,
}

impl<I: Item, S: Store<I>> Tree<I, S> {
    /// Creates a tree over the given store.
    ///
    /// The first item ever inserted becomes a root. Later items that no
    /// existing item covers are added as further roots, so `root_distance`
    /// should be an upper bound on the distance between any two items that
    /// belong to the same tree.
    ///
    /// # Arguments
    ///
    /// * `store` - The storage for the tree's edges.
    /// * `basis` - The logarithmic base for level radii; at least 2.
    /// * `root_distance` - The distance that roots are expected to cover;
    ///   determines the fixed root level.
    /// * `distance_between` - The metric over items.
    ///
    /// # Errors
    ///
    /// * If `basis` is not a finite value of at least 2.
    /// * If `root_distance` is not a finite, positive value.
    pub fn new(
        store: S,
        basis: f64,
        root_distance: f64,
        distance_between: DistanceFn<I>,
    ) -> Result<Self, String> {
        if !basis.is_finite() || basis < 2.0 {
            return Err(format!("basis must be a finite value of at least 2 but was {basis}"));
        }
        if !root_distance.is_finite() || root_distance <= 0.0 {
            return Err(format!(
                "root distance must be a finite, positive value but was {root_distance}"
            ));
        }

        Ok(Self {
            basis,
            root_level: level_for_distance(root_distance, basis),
            distance_between,
            store,
            root_lock: RwLock::new(()),
        })
    }

    /// Inserts the given item into the tree.
    ///
    /// Items at distance zero from an existing item are preserved as
    /// separate entries; the tree allows ties.
    ///
    /// Multiple calls to `insert` and `find_nearest` are safe to make
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn insert(&self, item: I) -> Result<(), String> {
        insert::insert(self, item, &mut TraceMetrics::default())
    }

    /// Returns the nearest items in the tree to the specified query item, up
    /// to the specified maximum number of results and maximum distance.
    ///
    /// Results are returned with their distances from the query item, in
    /// order from closest to furthest. If no items match the given criteria,
    /// an empty result set is returned.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn find_nearest(
        &self,
        query: &I,
        max_results: usize,
        max_distance: f64,
    ) -> Result<Vec<(I, f64)>, String> {
        find::search(self, query, max_results, max_distance, &mut TraceMetrics::default())
    }

    /// Removes the item at distance zero from the given item, if any, and
    /// returns it. Children of the removed item are re-parented to other
    /// covering items, or join the root set when nothing covers them.
    ///
    /// `remove` is not safe to run concurrently with any other operation on
    /// the same tree.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn remove(&self, item: &I) -> Result<Option<I>, String> {
        remove::remove(self, item, &mut TraceMetrics::default())
    }

    /// Creates a [`Tracer`] which records performance metrics for the
    /// operations made through it.
    pub fn new_tracer(&self) -> Tracer<'_, I, S> {
        Tracer::new(self)
    }

    /// The logarithmic base for the per-level covering radii.
    #[must_use]
    pub const fn basis(&self) -> f64 {
        self.basis
    }

    /// The level at which root items live.
    #[must_use]
    pub const fn root_level(&self) -> i32 {
        self.root_level
    }

    /// A reference to the store holding the tree's edges.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The covering radius at `level`.
    pub(crate) fn distance_for_level(&self, level: i32) -> f64 {
        self.basis.powi(level)
    }

    /// Loads the root set under the read locks.
    pub(crate) fn load_roots(&self, metrics: &mut TraceMetrics) -> Result<Vec<I>, String> {
        let _guard = self.root_lock.read();
        self.store.with_root_read_lock(|| {
            metrics.count_load();
            let mut root_levels = self.store.load_children(&[None])?;
            let mut roots = root_levels.pop().unwrap_or_default();
            Ok(roots.take_items_at(self.root_level))
        })
    }

    /// Builds the initial cover set over the root set for the given query.
    pub(crate) fn root_cover_set(
        &self,
        query: &I,
        metrics: &mut TraceMetrics,
    ) -> Result<CoverSet<I>, String> {
        let roots = self.load_roots(metrics)?;
        CoverSet::from_items(roots, self.root_level, query, self.distance_between, |parents| {
            metrics.count_load();
            self.store.load_children(parents)
        })
    }

    /// Adds an item to the root set under the write locks.
    pub(crate) fn add_root(&self, item: &I) -> Result<(), String> {
        let _guard = self.root_lock.write();
        self.store
            .with_root_write_lock(|| self.store.add_item(item, None, self.root_level))
    }

    /// Adds the item as the first root if the tree is still empty, re-checking
    /// under the write locks. Returns whether the item was added.
    pub(crate) fn try_add_first_root(&self, item: &I) -> Result<bool, String> {
        let _guard = self.root_lock.write();
        self.store.with_root_write_lock(|| {
            let mut root_levels = self.store.load_children(&[None])?;
            let mut roots = root_levels.pop().unwrap_or_default();
            if roots.take_items_at(self.root_level).is_empty() {
                self.store.add_item(item, None, self.root_level)?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }
}

/// The lowest level whose covering radius reaches `distance`.
#[allow(clippy::cast_possible_truncation)]
fn level_for_distance(distance: f64, basis: f64) -> i32 {
    let estimate = (distance.ln() / basis.ln()).ceil();

    // map values beyond the level range onto its ends
    let mut level = if estimate < f64::from(i32::MIN) {
        i32::MIN
    } else if estimate > f64::from(i32::MAX) {
        i32::MAX
    } else {
        estimate as i32
    };

    // the log ratio can land an ulp off an integer boundary; snap to the
    // lowest level whose radius actually reaches the distance
    while basis.powi(level) < distance && level < i32::MAX {
        level += 1;
    }
    while level > i32::MIN && basis.powi(level - 1) >= distance {
        level -= 1;
    }

    level
}
