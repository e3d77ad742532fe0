//! A tree of trees: spreads operations across multiple subtrees.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::{item::Item, store::Store, tree::Tree};

/// Spreads operations across multiple independent subtrees for scaling and
/// parallelisation.
///
/// Insertions are distributed round-robin, so each subtree stays roughly the
/// same size and, more usefully, root-lock contention is split N ways.
/// Queries fan out to every subtree in parallel and the per-tree results are
/// merged.
///
/// Every subtree must use the same distance function; the merge step assumes
/// the per-tree distances are comparable.
#[derive(Debug)]
pub struct CompositeTree<I: Item, S: Store<I>> {
    /// The subtrees.
    trees: Vec<Tree<I, S>>,
    /// Monotonic insertion counter for round-robin placement.
    insert_count: AtomicUsize,
}

impl<I: Item, S: Store<I>> CompositeTree<I, S> {
    /// Creates a composite over the given subtrees.
    ///
    /// # Errors
    ///
    /// If `trees` is empty.
    pub fn new(trees: Vec<Tree<I, S>>) -> Result<Self, String> {
        if trees.is_empty() {
            return Err("a composite tree requires at least one subtree".to_string());
        }

        Ok(Self {
            trees,
            insert_count: AtomicUsize::new(0),
        })
    }

    /// The number of subtrees.
    #[must_use]
    pub fn num_subtrees(&self) -> usize {
        self.trees.len()
    }

    /// The subtrees, in placement order.
    #[must_use]
    pub fn subtrees(&self) -> &[Tree<I, S>] {
        &self.trees
    }

    /// Inserts the specified item into one of the subtrees.
    ///
    /// Multiple calls to `insert` and `find_nearest` are safe to make
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Any failure from the chosen subtree's store.
    pub fn insert(&self, item: I) -> Result<(), String> {
        let tree_index = self.insert_count.fetch_add(1, Ordering::Relaxed) % self.trees.len();
        self.trees[tree_index].insert(item)
    }

    /// Returns the nearest items across all subtrees to the specified query
    /// item, up to the specified maximum number of results and maximum
    /// distance.
    ///
    /// Subtrees are queried in parallel. Results are returned with their
    /// distances from the query item, in order from closest to furthest; if
    /// no items match the given criteria, an empty result set is returned.
    ///
    /// Multiple calls to `insert` and `find_nearest` are safe to make
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Any failure from any subtree's store.
    pub fn find_nearest(
        &self,
        query: &I,
        max_results: usize,
        max_distance: f64,
    ) -> Result<Vec<(I, f64)>, String> {
        let sub_results = self
            .trees
            .par_iter()
            .map(|tree| tree.find_nearest(query, max_results, max_distance))
            .collect::<Result<Vec<_>, String>>()?;

        Ok(zip_by_distance(&sub_results, max_results))
    }
}

/// Merges per-tree result sequences, each already sorted ascending by
/// distance, into a single sequence of up to `limit` results. Ties go to the
/// earlier sequence, keeping the merge stable.
fn zip_by_distance<I: Item>(result_sets: &[Vec<(I, f64)>], limit: usize) -> Vec<(I, f64)> {
    let mut cursors = vec![0_usize; result_sets.len()];
    let mut results = Vec::new();

    while results.len() < limit {
        let mut closest: Option<(usize, f64)> = None;
        for (set_index, results_for_set) in result_sets.iter().enumerate() {
            if let Some(&(_, distance)) = results_for_set.get(cursors[set_index]) {
                let is_closer = closest.map_or(true, |(_, best)| distance < best);
                if is_closer {
                    closest = Some((set_index, distance));
                }
            }
        }

        match closest {
            Some((set_index, _)) => {
                results.push(result_sets[set_index][cursors[set_index]].clone());
                cursors[set_index] += 1;
            }
            None => break,
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::zip_by_distance;

    #[test]
    fn zip_merges_sorted_sequences_closest_first() {
        let merged = zip_by_distance(
            &[
                vec![("a", 1.0), ("d", 7.0)],
                vec![("b", 2.0), ("c", 3.0)],
                vec![],
            ],
            10,
        );

        assert_eq!(merged, vec![("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 7.0)]);
    }

    #[test]
    fn zip_truncates_to_the_limit() {
        let merged = zip_by_distance(&[vec![("a", 1.0), ("c", 3.0)], vec![("b", 2.0)]], 2);

        assert_eq!(merged, vec![("a", 1.0), ("b", 2.0)]);
    }

    #[test]
    fn zip_breaks_ties_towards_earlier_trees() {
        let merged = zip_by_distance(&[vec![("a", 5.0)], vec![("b", 5.0)]], 10);

        assert_eq!(merged, vec![("a", 5.0), ("b", 5.0)]);
    }
}
