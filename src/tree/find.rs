//! The nearest-neighbour query descent.

use crate::{item::Item, store::Store};

use super::{tracer::TraceMetrics, Tree};

/// Returns up to `max_results` items within `max_distance` of `query`,
/// closest first.
///
/// At each level the frontier expands by the level's covering radius beyond
/// the current k-th best distance; anything further cannot have a descendant
/// that beats the candidates already in hand.
///
/// # Errors
///
/// Any failure from the underlying store.
pub(crate) fn search<I, S>(
    tree: &Tree<I, S>,
    query: &I,
    max_results: usize,
    max_distance: f64,
    metrics: &mut TraceMetrics,
) -> Result<Vec<(I, f64)>, String>
where
    I: Item,
    S: Store<I>,
{
    let mut cover_set = tree.root_cover_set(query, metrics)?;
    metrics.record_level(&cover_set);

    let mut level = tree.root_level;
    while !cover_set.at_bottom() {
        let bound = cover_set.bound(max_results, max_distance);
        let dist_threshold = bound + tree.distance_for_level(level);

        let (child_cover_set, _) =
            cover_set.child(query, dist_threshold, level - 1, tree.distance_between, |parents| {
                metrics.count_load();
                tree.store.load_children(parents)
            })?;
        metrics.record_level(&child_cover_set);

        cover_set = child_cover_set;
        level -= 1;
    }

    Ok(cover_set.closest(max_results, max_distance))
}
