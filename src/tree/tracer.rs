//! Per-operation performance metrics.

use core::fmt;
use std::time::{Duration, Instant};

use crate::{item::Item, search::cover_set::CoverSet, store::Store};

use super::{find, insert, remove, Tree};

/// Counters captured while a single tree operation runs.
#[derive(Clone, Copy, Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct TraceMetrics {
    /// Candidates ever admitted to the operation's cover set.
    pub total_covered_set_size: usize,
    /// The largest number of simultaneously visible cover-set candidates.
    pub max_cover_set_size: usize,
    /// The number of levels the descent visited.
    pub max_levels_traversed: usize,
    /// The number of `load_children` calls issued to the store.
    pub load_children_count: usize,
    /// Wall-clock duration of the operation.
    pub total_time: Duration,
}

impl TraceMetrics {
    /// Records one `load_children` round trip.
    pub(crate) fn count_load(&mut self) {
        self.load_children_count += 1;
    }

    /// Records the cover set produced by one descent step.
    pub(crate) fn record_level<I: Item>(&mut self, cover_set: &CoverSet<I>) {
        self.total_covered_set_size = cover_set.total_item_count();
        self.max_cover_set_size = self.max_cover_set_size.max(cover_set.visible_item_count());
        self.max_levels_traversed += 1;
    }
}

impl fmt::Display for TraceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}, total covered set size: {}, max visible cover set size: {}, levels traversed: {}, load children count: {}",
            self.total_time,
            self.total_covered_set_size,
            self.max_cover_set_size,
            self.max_levels_traversed,
            self.load_children_count,
        )
    }
}

/// Records performance metrics for the operations of one [`Tree`].
///
/// Tracers for a given tree are created with the tree's
/// [`new_tracer`](Tree::new_tracer) method. Each operation resets the
/// metrics on entry, so a tracer describes the most recent operation made
/// through it.
///
/// Tracers are not thread-safe and are scoped to a single operation at a
/// time; create one per thread of work.
#[derive(Debug)]
pub struct Tracer<'a, I: Item, S: Store<I>> {
    /// The tree that operations are dispatched to.
    tree: &'a Tree<I, S>,
    /// Metrics from the most recent operation.
    metrics: TraceMetrics,
}

impl<'a, I: Item, S: Store<I>> Tracer<'a, I, S> {
    /// Creates a tracer over the given tree.
    pub(crate) fn new(tree: &'a Tree<I, S>) -> Self {
        Self {
            tree,
            metrics: TraceMetrics::default(),
        }
    }

    /// The metrics recorded by the most recent operation.
    #[must_use]
    pub const fn metrics(&self) -> &TraceMetrics {
        &self.metrics
    }

    /// As [`Tree::insert`], recording metrics for the operation.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn insert(&mut self, item: I) -> Result<(), String> {
        let tree = self.tree;
        self.timed(|metrics| insert::insert(tree, item, metrics))
    }

    /// As [`Tree::find_nearest`], recording metrics for the operation.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn find_nearest(
        &mut self,
        query: &I,
        max_results: usize,
        max_distance: f64,
    ) -> Result<Vec<(I, f64)>, String> {
        let tree = self.tree;
        self.timed(|metrics| find::search(tree, query, max_results, max_distance, metrics))
    }

    /// As [`Tree::remove`], recording metrics for the operation.
    ///
    /// # Errors
    ///
    /// Any failure from the underlying store, propagated verbatim.
    pub fn remove(&mut self, item: &I) -> Result<Option<I>, String> {
        let tree = self.tree;
        self.timed(|metrics| remove::remove(tree, item, metrics))
    }

    /// Resets the metrics, runs `operation`, and records the elapsed time.
    fn timed<T>(&mut self, operation: impl FnOnce(&mut TraceMetrics) -> T) -> T {
        self.metrics = TraceMetrics::default();
        let start = Instant::now();
        let result = operation(&mut self.metrics);
        self.metrics.total_time = start.elapsed();
        result
    }
}
