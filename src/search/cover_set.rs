//! The descent frontier: a stack of per-level candidate layers.

use crate::{
    item::{DistanceFn, Item},
    levels::LevelsWithItems,
    search::layer::{Candidate, CoverSetLayer},
};

/// The current descent frontier: one [`CoverSetLayer`] per level descended,
/// plus counts of the candidates ever admitted and those still visible under
/// the current distance constraint.
#[derive(Clone, Debug)]
pub(crate) struct CoverSet<I: Item> {
    /// The layers, in descent order.
    layers: Vec<CoverSetLayer<I>>,
    /// Candidates ever admitted to the frontier.
    total_item_count: usize,
    /// Candidates still within the current constraint.
    visible_item_count: usize,
}

impl<I: Item> CoverSet<I> {
    /// Creates an empty frontier.
    pub(crate) fn new() -> Self {
        Self {
            layers: Vec::new(),
            total_item_count: 0,
            visible_item_count: 0,
        }
    }

    /// Builds the initial frontier from the given items (normally the root
    /// set), computing their distances to `query` and loading their children
    /// in one batched call.
    ///
    /// # Errors
    ///
    /// Any failure from `load_children`.
    pub(crate) fn from_items<F>(
        items: Vec<I>,
        level: i32,
        query: &I,
        distance_between: DistanceFn<I>,
        load_children: F,
    ) -> Result<Self, String>
    where
        F: FnOnce(&[Option<I>]) -> Result<Vec<LevelsWithItems<I>>, String>,
    {
        let mut cover_set = Self::new();
        if items.is_empty() {
            return Ok(cover_set);
        }

        let parents = items.iter().cloned().map(Some).collect::<Vec<_>>();
        let children = load_children(&parents)?;
        if children.len() != items.len() {
            return Err(format!(
                "store returned {} child sets for {} parents",
                children.len(),
                items.len()
            ));
        }

        let candidates = items
            .into_iter()
            .zip(children)
            .map(|(item, children)| Candidate {
                distance: distance_between(&item, query),
                parent: None,
                level,
                children,
                item,
            })
            .collect();

        cover_set.add_layer(CoverSetLayer::new(candidates));
        Ok(cover_set)
    }

    /// Pushes a layer onto the frontier, updating both counts.
    pub(crate) fn add_layer(&mut self, layer: CoverSetLayer<I>) {
        self.total_item_count += layer.len();
        self.visible_item_count += layer.len();
        self.layers.push(layer);
    }

    /// Whether no candidate is visible.
    pub(crate) fn is_empty(&self) -> bool {
        self.visible_item_count == 0
    }

    /// Candidates ever admitted to the frontier.
    pub(crate) fn total_item_count(&self) -> usize {
        self.total_item_count
    }

    /// Candidates still within the current constraint.
    pub(crate) fn visible_item_count(&self) -> usize {
        self.visible_item_count
    }

    /// Whether no candidate in any layer has unvisited children.
    pub(crate) fn at_bottom(&self) -> bool {
        self.layers
            .iter()
            .all(|layer| layer.candidates().iter().all(|candidate| !candidate.has_children()))
    }

    /// All visible candidates, layer by layer.
    pub(crate) fn candidates(&self) -> impl Iterator<Item = &Candidate<I>> {
        self.layers.iter().flat_map(|layer| layer.candidates().iter())
    }

    /// Produces the next frontier down: each existing layer constrained to
    /// `dist_threshold`, plus one new layer of covering children taken from
    /// the visible candidates at `child_level` (with their own children
    /// loaded in one batched call).
    ///
    /// Also reports the closest candidate among the constrained existing
    /// layers, which insertion uses as the attachment point when the deeper
    /// descent fails. Children promoted by this very call are not eligible;
    /// they become eligible one level further down.
    ///
    /// The receiver is left intact, so an unwinding caller can still consult
    /// its own frontier.
    ///
    /// # Errors
    ///
    /// Any failure from `load_children`.
    pub(crate) fn child<F>(
        &self,
        query: &I,
        dist_threshold: f64,
        child_level: i32,
        distance_between: DistanceFn<I>,
        load_children: F,
    ) -> Result<(Self, Option<(I, f64)>), String>
    where
        F: FnOnce(&[Option<I>]) -> Result<Vec<LevelsWithItems<I>>, String>,
    {
        let mut child_cover_set = Self {
            layers: Vec::with_capacity(self.layers.len() + 1),
            total_item_count: self.total_item_count,
            visible_item_count: 0,
        };

        let mut parent_within_threshold: Option<(I, f64)> = None;
        let mut promoted: Vec<Candidate<I>> = Vec::new();

        for layer in &self.layers {
            let mut kept = layer.constrained_to_distance(dist_threshold).to_vec();

            if let Some(closest) = kept.first() {
                let is_closer = parent_within_threshold
                    .as_ref()
                    .map_or(true, |(_, distance)| closest.distance < *distance);
                if is_closer {
                    parent_within_threshold = Some((closest.item.clone(), closest.distance));
                }
            }

            for candidate in &mut kept {
                for child in candidate.children.take_items_at(child_level) {
                    let child_distance = distance_between(&child, query);
                    if child_distance <= dist_threshold {
                        promoted.push(Candidate {
                            distance: child_distance,
                            parent: Some(candidate.item.clone()),
                            level: child_level,
                            children: LevelsWithItems::new(),
                            item: child,
                        });
                    }
                }
            }

            child_cover_set.visible_item_count += kept.len();
            child_cover_set.layers.push(CoverSetLayer::from_sorted(kept));
        }

        if !promoted.is_empty() {
            let parents = promoted
                .iter()
                .map(|candidate| Some(candidate.item.clone()))
                .collect::<Vec<_>>();
            let grandchildren = load_children(&parents)?;
            if grandchildren.len() != promoted.len() {
                return Err(format!(
                    "store returned {} child sets for {} parents",
                    grandchildren.len(),
                    promoted.len()
                ));
            }

            for (candidate, children) in promoted.iter_mut().zip(grandchildren) {
                candidate.children = children;
            }

            child_cover_set.add_layer(CoverSetLayer::new(promoted));
        }

        Ok((child_cover_set, parent_within_threshold))
    }

    /// Up to `max_items` visible candidates within `max_distance`, closest
    /// first.
    ///
    /// The layers are already sorted, so this is a cursor merge; ties go to
    /// the earlier layer, which keeps distance-zero duplicates in insertion
    /// order.
    pub(crate) fn closest(&self, max_items: usize, max_distance: f64) -> Vec<(I, f64)> {
        let mut cursors = vec![0_usize; self.layers.len()];
        let mut results = Vec::new();

        while results.len() < max_items {
            match self.next_closest(&mut cursors) {
                Some((candidate, _)) if candidate.distance <= max_distance => {
                    results.push((candidate.item.clone(), candidate.distance));
                }
                _ => break,
            }
        }

        results
    }

    /// The distance of the `max_items`-th closest visible candidate, or
    /// `max_distance` when fewer than `max_items` candidates lie within it.
    ///
    /// Queries use this to shrink their distance threshold as better
    /// candidates accumulate.
    pub(crate) fn bound(&self, max_items: usize, max_distance: f64) -> f64 {
        let mut cursors = vec![0_usize; self.layers.len()];
        let mut bound = max_distance;
        let mut count = 0;

        while count < max_items {
            match self.next_closest(&mut cursors) {
                Some((candidate, _)) if candidate.distance <= max_distance => {
                    bound = candidate.distance;
                    count += 1;
                }
                _ => return max_distance,
            }
        }

        bound
    }

    /// Picks the closest candidate not yet consumed by `cursors`, advancing
    /// the winning cursor.
    fn next_closest(&self, cursors: &mut [usize]) -> Option<(&Candidate<I>, usize)> {
        let mut closest: Option<(&Candidate<I>, usize)> = None;

        for (layer_index, layer) in self.layers.iter().enumerate() {
            if let Some(candidate) = layer.candidates().get(cursors[layer_index]) {
                let is_closer = closest
                    .as_ref()
                    .map_or(true, |(current, _)| candidate.distance < current.distance);
                if is_closer {
                    closest = Some((candidate, layer_index));
                }
            }
        }

        if let Some((_, layer_index)) = closest {
            cursors[layer_index] += 1;
        }
        closest
    }
}
