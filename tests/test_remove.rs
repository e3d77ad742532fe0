//! Tests for removal, orphan re-parenting, and root promotion.

use covertree::Tree;
use rand::prelude::*;

mod utils;

use utils::point;

#[test]
fn remove_from_an_empty_tree_finds_nothing() {
    let tree = utils::new_tree(2.0, 1000.0);

    let removed = tree.remove(&point(1.0, 2.0, 3.0)).unwrap();

    assert_eq!(removed, None);
}

#[test]
fn remove_of_an_absent_item_finds_nothing() {
    let tree = utils::new_tree(2.0, 1000.0);
    utils::insert_points(&tree, &[point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0)]);

    let removed = tree.remove(&point(1.5, 0.0, 0.0)).unwrap();

    assert_eq!(removed, None);
    assert_eq!(utils::collect_tree(&tree).len(), 2);
}

#[test]
fn removed_items_are_no_longer_found() {
    let tree = utils::new_tree(2.0, 1000.0);
    utils::insert_points(
        &tree,
        &[point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0), point(3.0, 0.0, 0.0)],
    );

    let removed = tree.remove(&point(2.0, 0.0, 0.0)).unwrap();

    assert_eq!(removed, Some(point(2.0, 0.0, 0.0)));
    assert!(tree.find_nearest(&point(2.0, 0.0, 0.0), 1, 0.0).unwrap().is_empty());
}

#[test]
fn remove_preserves_the_children_of_the_removed_item() {
    let tree = utils::new_tree(2.0, 1000.0);
    utils::insert_points(
        &tree,
        &[
            point(1.0, 0.0, 0.0),
            point(1.1, 0.0, 0.0),
            point(1.11, 0.0, 0.0),
            point(1.111, 0.0, 0.0),
        ],
    );

    let removed = tree.remove(&point(1.11, 0.0, 0.0)).unwrap();

    assert_eq!(removed, Some(point(1.11, 0.0, 0.0)));
    assert_eq!(utils::collect_tree(&tree).len(), 3);

    let results = tree.find_nearest(&point(1.111, 0.0, 0.0), 1, 0.0).unwrap();
    assert_eq!(results, vec![(point(1.111, 0.0, 0.0), 0.0)]);
}

#[test]
fn remove_re_hoists_the_subtree_of_an_interior_item() {
    let tree = utils::new_tree(2.0, 1000.0);
    utils::insert_points(
        &tree,
        &[point(0.0, 0.0, 0.0), point(16.0, 0.0, 0.0), point(15.0, 0.0, 6.0)],
    );

    let removed = tree.remove(&point(16.0, 0.0, 0.0)).unwrap();

    assert_eq!(removed, Some(point(16.0, 0.0, 0.0)));
    assert_eq!(utils::collect_tree(&tree).len(), 2);
    utils::assert_root_cover(&tree);

    for remaining in [point(0.0, 0.0, 0.0), point(15.0, 0.0, 6.0)] {
        let results = tree.find_nearest(&remaining, 1, 0.0).unwrap();
        assert_eq!(results, vec![(remaining, 0.0)]);
    }

    // the orphan is re-parented under the surviving root
    assert_eq!(utils::load_root_items(&tree), vec![point(0.0, 0.0, 0.0)]);
}

#[test]
fn removing_a_root_promotes_one_of_its_children() {
    let store = utils::CountingStore::new();
    let tree = Tree::new(store, 2.0, 1000.0, utils::euclidean).unwrap();
    utils::insert_points(
        &tree,
        &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0)],
    );
    assert_eq!(tree.store().saved_roots(), vec![point(0.0, 0.0, 0.0)]);

    let removed = tree.remove(&point(0.0, 0.0, 0.0)).unwrap();

    assert_eq!(removed, Some(point(0.0, 0.0, 0.0)));

    let roots = tree.store().saved_roots();
    assert_eq!(roots.len(), 1, "expected a single promoted root, got {roots:?}");
    assert_ne!(roots[0], point(0.0, 0.0, 0.0));

    for remaining in [point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0)] {
        let results = tree.find_nearest(&remaining, 1, 0.0).unwrap();
        assert_eq!(results, vec![(remaining, 0.0)]);
    }
}

#[test]
fn uncovered_items_become_additional_roots() {
    let tree = utils::new_tree(2.0, 4.0);

    // the second point is beyond the root covering radius of the first
    utils::insert_points(&tree, &[point(0.0, 0.0, 0.0), point(100.0, 0.0, 0.0)]);

    let roots = utils::load_root_items(&tree);
    assert_eq!(roots, vec![point(0.0, 0.0, 0.0), point(100.0, 0.0, 0.0)]);

    for inserted in [point(0.0, 0.0, 0.0), point(100.0, 0.0, 0.0)] {
        let results = tree.find_nearest(&inserted, 1, 0.0).unwrap();
        assert_eq!(results, vec![(inserted, 0.0)]);
    }
}

#[test]
fn remove_preserves_findability_of_all_other_items() {
    let tree = utils::new_tree(2.0, 1000.0);
    let points = utils::random_points(200, 1000.0, 31);
    utils::insert_points(&tree, &points);

    let mut rng = StdRng::seed_from_u64(37);
    let mut removed = points.clone();
    removed.shuffle(&mut rng);
    let (removed, remaining) = removed.split_at(points.len() / 3);

    for target in removed {
        assert_eq!(tree.remove(target).unwrap(), Some(*target));
    }

    assert_eq!(utils::collect_tree(&tree).len(), remaining.len());
    utils::assert_root_cover(&tree);

    for target in removed {
        assert!(tree.find_nearest(target, 1, 0.0).unwrap().is_empty());
    }
    for target in remaining {
        let results = tree.find_nearest(target, 1, 0.0).unwrap();
        assert_eq!(results, vec![(*target, 0.0)], "lost {target:?} after removals");
    }
}

#[test]
fn inserting_then_removing_everything_leaves_the_tree_empty() {
    let tree = utils::new_tree(2.0, 1000.0);
    let points = utils::random_points(200, 1000.0, 41);
    utils::insert_points(&tree, &points);

    let mut rng = StdRng::seed_from_u64(43);
    let mut order = points.clone();
    order.shuffle(&mut rng);

    for target in &order {
        assert_eq!(tree.remove(target).unwrap(), Some(*target), "failed to remove {target:?}");
    }

    assert!(utils::load_root_items(&tree).is_empty());
    assert!(tree.store().is_empty());
    assert!(tree.find_nearest(&order[0], 1, f64::MAX).unwrap().is_empty());

    // the next insert re-initialises the tree
    tree.insert(point(5.0, 5.0, 5.0)).unwrap();
    assert_eq!(utils::load_root_items(&tree), vec![point(5.0, 5.0, 5.0)]);
}

#[test]
fn store_mutations_are_counted_per_operation() {
    let store = utils::CountingStore::new();
    let tree = Tree::new(store, 2.0, 1000.0, utils::euclidean).unwrap();

    tree.insert(point(1.0, 0.0, 0.0)).unwrap();
    assert_eq!(tree.store().saved_count(), 1);

    tree.insert(point(2.0, 0.0, 0.0)).unwrap();
    assert_eq!(tree.store().saved_count(), 2);

    // removing a leaf deletes one edge and re-parents nothing
    tree.remove(&point(2.0, 0.0, 0.0)).unwrap();
    assert_eq!(tree.store().saved_count(), 3);
}
