//! The removal descent and orphan adoption.

use crate::{item::Item, search::cover_set::CoverSet, store::Store};

use super::{tracer::TraceMetrics, Tree};

/// Removes the item at distance zero from `item`, if any, and returns it.
///
/// Deleting an interior node breaks the covering invariant only for its
/// direct children. Each orphan is re-parented to the closest covering
/// candidate the unwinding descent can offer; an orphan nothing covers joins
/// the root set.
///
/// # Errors
///
/// Any failure from the underlying store.
pub(crate) fn remove<I, S>(
    tree: &Tree<I, S>,
    item: &I,
    metrics: &mut TraceMetrics,
) -> Result<Option<I>, String>
where
    I: Item,
    S: Store<I>,
{
    let cover_set = tree.root_cover_set(item, metrics)?;
    if cover_set.is_empty() {
        return Ok(None);
    }
    metrics.record_level(&cover_set);

    let matched_root = cover_set
        .candidates()
        .find(|candidate| candidate.distance == 0.0)
        .map(|candidate| candidate.item.clone());
    if let Some(root) = matched_root {
        return remove_root(tree, &root, &cover_set, metrics).map(Some);
    }

    let (removed, orphans) = descend(tree, item, &cover_set, tree.root_level, metrics)?;

    if !orphans.is_empty() {
        // nothing below the roots covers these
        let _guard = tree.root_lock.write();
        tree.store.with_root_write_lock(|| {
            for orphan in &orphans {
                tree.store.update_item(orphan, None, tree.root_level)?;
            }
            Ok::<(), String>(())
        })?;
    }

    Ok(removed)
}

/// Removes a root item: one of its children is promoted into the root set,
/// the rest are re-parented under the surviving roots where possible, and
/// any child no root covers becomes a root itself.
fn remove_root<I, S>(
    tree: &Tree<I, S>,
    root: &I,
    cover_set: &CoverSet<I>,
    metrics: &mut TraceMetrics,
) -> Result<I, String>
where
    I: Item,
    S: Store<I>,
{
    let _guard = tree.root_lock.write();
    tree.store.with_root_write_lock(|| {
        metrics.count_load();
        let children = tree
            .store
            .load_children(std::slice::from_ref(&Some(root.clone())))?
            .pop()
            .unwrap_or_default();
        let mut orphans = children.into_items();

        tree.store.remove_item(root, None, tree.root_level)?;

        let mut roots = cover_set
            .candidates()
            .filter(|candidate| candidate.item != *root)
            .map(|candidate| candidate.item.clone())
            .collect::<Vec<_>>();

        if !orphans.is_empty() {
            let promoted = orphans.remove(0);
            tree.store.update_item(&promoted, None, tree.root_level)?;
            roots.push(promoted);
        }

        let max_distance = tree.distance_for_level(tree.root_level);
        for orphan in orphans {
            let adopter = roots
                .iter()
                .find(|candidate| (tree.distance_between)(&orphan, candidate) <= max_distance);
            match adopter {
                Some(parent) => {
                    tree.store.update_item(&orphan, Some(parent), tree.root_level - 1)?;
                }
                None => tree.store.update_item(&orphan, None, tree.root_level)?,
            }
        }

        Ok(root.clone())
    })
}

/// One level of the removal descent. Returns the removed item, if found at
/// this level or below, along with the orphans still awaiting adoption.
fn descend<I, S>(
    tree: &Tree<I, S>,
    item: &I,
    cover_set: &CoverSet<I>,
    level: i32,
    metrics: &mut TraceMetrics,
) -> Result<(Option<I>, Vec<I>), String>
where
    I: Item,
    S: Store<I>,
{
    let dist_threshold = tree.distance_for_level(level);

    let (child_cover_set, _) =
        cover_set.child(item, dist_threshold, level - 1, tree.distance_between, |parents| {
            metrics.count_load();
            tree.store.load_children(parents)
        })?;
    metrics.record_level(&child_cover_set);

    let mut removed = None;
    let mut orphans = Vec::new();

    if !child_cover_set.is_empty() {
        let found = child_cover_set
            .candidates()
            .find(|candidate| candidate.distance == 0.0)
            .cloned();

        if let Some(found) = found {
            tree.store.remove_item(&found.item, found.parent.as_ref(), found.level)?;
            removed = Some(found.item.clone());
            orphans = found.children.into_items();

            // siblings of the deleted node sit one level below this one
            adopt_orphans(
                tree,
                &mut orphans,
                &child_cover_set,
                &found.item,
                tree.distance_for_level(level - 2),
                level - 2,
            )?;
        } else if !child_cover_set.at_bottom() {
            (removed, orphans) = descend(tree, item, &child_cover_set, level - 1, metrics)?;
        }
    }

    let excluded = removed.as_ref().unwrap_or(item);
    adopt_orphans(tree, &mut orphans, cover_set, excluded, dist_threshold, level - 1)?;

    Ok((removed, orphans))
}

/// Re-parents each orphan under the first cover-set candidate within
/// `max_distance`, at `child_level`. Adopted orphans drop from the list.
fn adopt_orphans<I, S>(
    tree: &Tree<I, S>,
    orphans: &mut Vec<I>,
    cover_set: &CoverSet<I>,
    removed: &I,
    max_distance: f64,
    child_level: i32,
) -> Result<(), String>
where
    I: Item,
    S: Store<I>,
{
    if orphans.is_empty() {
        return Ok(());
    }

    let mut remaining = Vec::new();
    for orphan in orphans.drain(..) {
        let adopter = cover_set
            .candidates()
            .find(|candidate| {
                candidate.item != *removed
                    && (tree.distance_between)(&orphan, &candidate.item) <= max_distance
            })
            .map(|candidate| candidate.item.clone());

        match adopter {
            Some(parent) => tree.store.update_item(&orphan, Some(&parent), child_level)?,
            None => remaining.push(orphan),
        }
    }

    *orphans = remaining;
    Ok(())
}
