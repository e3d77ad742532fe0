//! The insertion descent.

use crate::{item::Item, search::cover_set::CoverSet, store::Store};

use super::{tracer::TraceMetrics, Tree};

/// Inserts `item` into the tree.
///
/// The descent follows covering candidates downward until it finds a parent
/// whose covering radius admits the item at the next level. An item no
/// descent path covers joins the root set instead.
///
/// # Errors
///
/// Any failure from the underlying store.
pub(crate) fn insert<I, S>(tree: &Tree<I, S>, item: I, metrics: &mut TraceMetrics) -> Result<(), String>
where
    I: Item,
    S: Store<I>,
{
    loop {
        let cover_set = tree.root_cover_set(&item, metrics)?;

        if cover_set.is_empty() {
            metrics.record_level(&cover_set);
            if tree.try_add_first_root(&item)? {
                return Ok(());
            }
            // lost the race to another inserter; descend against its root
            continue;
        }

        return if descend(tree, &item, &cover_set, tree.root_level, metrics)? {
            Ok(())
        } else {
            // outside the reach of every existing item
            tree.add_root(&item)
        };
    }
}

/// One level of the insertion descent. Returns whether the item was attached
/// at this level or below.
fn descend<I, S>(
    tree: &Tree<I, S>,
    item: &I,
    cover_set: &CoverSet<I>,
    level: i32,
    metrics: &mut TraceMetrics,
) -> Result<bool, String>
where
    I: Item,
    S: Store<I>,
{
    let dist_threshold = tree.distance_for_level(level);

    let (child_cover_set, parent_within_threshold) =
        cover_set.child(item, dist_threshold, level - 1, tree.distance_between, |parents| {
            metrics.count_load();
            tree.store.load_children(parents)
        })?;
    metrics.record_level(&child_cover_set);

    if !child_cover_set.is_empty() {
        // a zero-distance match adopts the new item one level below itself;
        // ties are kept as separate items
        if let Some((duplicate, _)) = child_cover_set.closest(1, 0.0).pop() {
            tree.store.add_item(item, Some(&duplicate), level - 2)?;
            return Ok(true);
        }

        if descend(tree, item, &child_cover_set, level - 1, metrics)? {
            return Ok(true);
        }
    }

    match parent_within_threshold {
        Some((parent, _)) => {
            tree.store.add_item(item, Some(&parent), level - 1)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
