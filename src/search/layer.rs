//! One frontier of search candidates at a single level.

use core::cmp::Ordering;

use crate::{item::Item, levels::LevelsWithItems};

/// A member of the search frontier: an item, its cached distance to the
/// query, the stored edge it was reached through, and its loaded children.
#[derive(Clone, Debug)]
pub(crate) struct Candidate<I: Item> {
    /// The candidate item.
    pub(crate) item: I,
    /// Distance from the item to the query, computed on admission.
    pub(crate) distance: f64,
    /// The parent in the candidate's stored edge; `None` for root items.
    pub(crate) parent: Option<I>,
    /// The level of the candidate's stored edge.
    pub(crate) level: i32,
    /// Children loaded for this candidate. Levels are consumed one by one as
    /// the descent reaches them.
    pub(crate) children: LevelsWithItems<I>,
}

impl<I: Item> Candidate<I> {
    /// Whether any unvisited children remain.
    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The candidates at a single level, sorted ascending by distance to the
/// query.
#[derive(Clone, Debug)]
pub(crate) struct CoverSetLayer<I: Item>(Vec<Candidate<I>>);

impl<I: Item> CoverSetLayer<I> {
    /// Builds a layer from candidates in any order.
    pub(crate) fn new(mut candidates: Vec<Candidate<I>>) -> Self {
        candidates.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Greater));
        Self(candidates)
    }

    /// Wraps candidates that are already sorted ascending by distance.
    pub(crate) fn from_sorted(candidates: Vec<Candidate<I>>) -> Self {
        debug_assert!(candidates.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        Self(candidates)
    }

    /// The prefix of candidates within the given distance.
    ///
    /// Because the layer is sorted, the covered candidates are contiguous and
    /// the cut-off is found by binary search.
    pub(crate) fn constrained_to_distance(&self, distance: f64) -> &[Candidate<I>] {
        &self.0[..self.0.partition_point(|candidate| candidate.distance <= distance)]
    }

    /// All candidates in the layer, closest first.
    pub(crate) fn candidates(&self) -> &[Candidate<I>] {
        &self.0
    }

    /// The number of candidates in the layer.
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}
