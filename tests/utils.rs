#![allow(dead_code)]

//! Utility types and functions for tests.

use core::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use covertree::{metrics, CompositeTree, InMemoryStore, LevelsWithItems, Store, Tree};

/// Number of distance evaluations made through `counted_euclidean` since the
/// last reset.
static DISTANCE_CALLS: AtomicUsize = AtomicUsize::new(0);

/// A point in R^3 whose identity is its exact bit pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point(pub [f64; 3]);

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for coordinate in &self.0 {
            state.write_u64(coordinate.to_bits());
        }
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

pub fn euclidean(a: &Point, b: &Point) -> f64 {
    metrics::euclidean(a, b)
}

/// Euclidean distance that also bumps the shared call counter.
pub fn counted_euclidean(a: &Point, b: &Point) -> f64 {
    DISTANCE_CALLS.fetch_add(1, AtomicOrdering::Relaxed);
    euclidean(a, b)
}

/// Euclidean distance slow enough that operation timings are visibly
/// non-zero.
pub fn slow_euclidean(a: &Point, b: &Point) -> f64 {
    std::thread::sleep(std::time::Duration::from_micros(100));
    euclidean(a, b)
}

pub fn reset_distance_calls() {
    DISTANCE_CALLS.store(0, AtomicOrdering::Relaxed);
}

pub fn distance_calls() -> usize {
    DISTANCE_CALLS.load(AtomicOrdering::Relaxed)
}

/// A tree over a fresh in-memory store with the standard test metric.
pub fn new_tree(basis: f64, root_distance: f64) -> Tree<Point, InMemoryStore<Point>> {
    Tree::new(InMemoryStore::new(), basis, root_distance, euclidean).unwrap()
}

/// A tree whose distance function reports into the shared call counter.
pub fn new_counted_tree(basis: f64, root_distance: f64) -> Tree<Point, InMemoryStore<Point>> {
    Tree::new(InMemoryStore::new(), basis, root_distance, counted_euclidean).unwrap()
}

pub fn insert_points<S: Store<Point>>(tree: &Tree<Point, S>, points: &[Point]) {
    for point in points {
        tree.insert(*point).unwrap();
    }
}

pub fn insert_points_composite<S: Store<Point>>(composite: &CompositeTree<Point, S>, points: &[Point]) {
    for point in points {
        composite.insert(*point).unwrap();
    }
}

pub fn point(x: f64, y: f64, z: f64) -> Point {
    Point([x, y, z])
}

/// Distinct random points in the `[0, scale)` cube.
pub fn random_points(count: usize, scale: f64, seed: u64) -> Vec<Point> {
    let rows = symagen::random_data::random_tabular_seedable::<f64>(count, 3, 0.0, scale, seed);

    let mut seen = std::collections::HashSet::new();
    rows.into_iter()
        .map(|row| Point([row[0], row[1], row[2]]))
        .filter(|point| seen.insert(*point))
        .collect()
}

/// Exhaustive reference search: every point within `max_distance`, closest
/// first, truncated to `max_results`. Makes exactly one distance evaluation
/// per point.
pub fn linear_search(
    query: &Point,
    points: &[Point],
    max_results: usize,
    max_distance: f64,
) -> Vec<(Point, f64)> {
    let mut hits = points
        .iter()
        .map(|point| (*point, euclidean(query, point)))
        .filter(|&(_, distance)| distance <= max_distance)
        .collect::<Vec<_>>();
    hits.sort_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Greater));
    hits.truncate(max_results);

    hits
}

/// The current root set of a tree.
pub fn load_root_items<S: Store<Point>>(tree: &Tree<Point, S>) -> Vec<Point> {
    tree.store()
        .load_children(&[None])
        .unwrap()
        .pop()
        .unwrap()
        .items_at(tree.root_level())
        .to_vec()
}

/// Walks the stored tree, checking the covering invariant on every edge and
/// that levels strictly decrease along every path. Returns each reachable
/// item with its stored level.
pub fn collect_tree<S: Store<Point>>(tree: &Tree<Point, S>) -> Vec<(Point, i32)> {
    let mut collected = Vec::new();
    let mut stack = load_root_items(tree)
        .into_iter()
        .map(|root| (root, tree.root_level()))
        .collect::<Vec<_>>();

    while let Some((item, level)) = stack.pop() {
        collected.push((item, level));

        let children = tree
            .store()
            .load_children(&[Some(item)])
            .unwrap()
            .pop()
            .unwrap();
        for child_level in children.levels() {
            assert!(
                child_level < level,
                "child level {child_level} of {item:?} does not descend below {level}"
            );
            let covering_radius = tree.basis().powi(child_level + 1);
            for child in children.items_at(child_level) {
                let distance = euclidean(&item, child);
                assert!(
                    distance <= covering_radius,
                    "edge {item:?} -> {child:?} at level {child_level} has distance {distance}, \
                     beyond its covering radius {covering_radius}"
                );
                stack.push((*child, child_level));
            }
        }
    }

    collected
}

/// Asserts that every item in the tree lies within the root covering radius
/// of some root.
pub fn assert_root_cover<S: Store<Point>>(tree: &Tree<Point, S>) {
    let roots = load_root_items(tree);
    let covering_radius = tree.basis().powi(tree.root_level());

    for (item, _) in collect_tree(tree) {
        let covered = roots
            .iter()
            .any(|root| euclidean(root, &item) <= covering_radius);
        assert!(covered, "{item:?} is beyond the reach of every root");
    }
}

/// Asserts that two result sequences are identical, element by element.
pub fn assert_same_results(query: &Point, actual: &[(Point, f64)], expected: &[(Point, f64)]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "expected {} results for {query:?} but got {}: {actual:?} vs {expected:?}",
        expected.len(),
        actual.len()
    );

    for (index, (expected_result, actual_result)) in expected.iter().zip(actual).enumerate() {
        assert_eq!(
            expected_result.0, actual_result.0,
            "result {index} for {query:?}"
        );
        assert_eq!(
            expected_result.1, actual_result.1,
            "distance of result {index} for {query:?}"
        );
    }
}

/// A store wrapper that records mutating calls and the current root set.
pub struct CountingStore {
    inner: InMemoryStore<Point>,
    saved_count: AtomicUsize,
    roots: Mutex<Vec<Point>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            saved_count: AtomicUsize::new(0),
            roots: Mutex::new(Vec::new()),
        }
    }

    /// The number of mutating store calls made so far.
    pub fn saved_count(&self) -> usize {
        self.saved_count.load(AtomicOrdering::Relaxed)
    }

    /// The roots as maintained through add/update/remove calls.
    pub fn saved_roots(&self) -> Vec<Point> {
        self.roots.lock().unwrap().clone()
    }
}

impl Store<Point> for CountingStore {
    fn load_children(&self, parents: &[Option<Point>]) -> Result<Vec<LevelsWithItems<Point>>, String> {
        self.inner.load_children(parents)
    }

    fn add_item(&self, item: &Point, parent: Option<&Point>, level: i32) -> Result<(), String> {
        self.saved_count.fetch_add(1, AtomicOrdering::Relaxed);
        if parent.is_none() {
            self.roots.lock().unwrap().push(*item);
        }
        self.inner.add_item(item, parent, level)
    }

    fn update_item(&self, item: &Point, parent: Option<&Point>, level: i32) -> Result<(), String> {
        self.saved_count.fetch_add(1, AtomicOrdering::Relaxed);
        let mut roots = self.roots.lock().unwrap();
        if parent.is_none() {
            if !roots.contains(item) {
                roots.push(*item);
            }
        } else {
            roots.retain(|root| root != item);
        }
        drop(roots);
        self.inner.update_item(item, parent, level)
    }

    fn remove_item(&self, item: &Point, parent: Option<&Point>, level: i32) -> Result<(), String> {
        self.saved_count.fetch_add(1, AtomicOrdering::Relaxed);
        if parent.is_none() {
            self.roots.lock().unwrap().retain(|root| root != item);
        }
        self.inner.remove_item(item, parent, level)
    }
}
