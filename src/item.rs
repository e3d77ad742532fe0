//! Traits for the items stored in a tree.

use core::fmt::Debug;

/// Trait for the items stored in a tree.
///
/// The tree never inspects an item's contents. It clones handles, compares
/// them for identity, and measures distances between them with the tree's
/// [`DistanceFn`]; everything else about an item is opaque.
///
/// Identity at the tree level is `PartialEq`. Two items that compare unequal
/// but lie at distance zero from each other are legitimate duplicates, and
/// the tree preserves them as separate entries.
pub trait Item: Clone + PartialEq + Debug + Send + Sync {}

impl<I: Clone + PartialEq + Debug + Send + Sync> Item for I {}

/// A distance function over items.
///
/// The function must satisfy the metric axioms:
///
/// * Non-negativity: `d(x, y) >= 0`
/// * Identity: `d(x, y) = 0` iff `x` and `y` are the same point in the space
/// * Symmetry: `d(x, y) = d(y, x)`
/// * Triangle inequality: `d(x, z) <= d(x, y) + d(y, z)`
///
/// The function may be arbitrarily expensive; the tree exists to call it as
/// few times as possible.
pub type DistanceFn<I> = fn(&I, &I) -> f64;
