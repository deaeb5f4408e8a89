use crate::{Error, RadixTree, Result};

/// Hard ceiling on the parent-chain length. A common prefix is at most the
/// 30 code bits plus the 32 tie-break bits, which bounds the tree height;
/// a longer chain means the tree is corrupt.
pub const MAX_DEPTH: usize = 64;

/// Bottom-up reduction over the tree: an array parallel to the node array
/// where leaf slot `leaf_start + i` holds `data[i]` and every internal slot
/// holds the `op`-fold of all descendant leaf values.
///
/// Propagation is leaf-driven: each leaf value walks its parent chain and
/// is merged into every ancestor exactly once, so `op` must be associative
/// and commutative but need not be idempotent (a box merge, a count, a
/// min/max all work). Fails with [`Error::DepthExceeded`] if a chain runs
/// past [`MAX_DEPTH`].
pub fn build_pyramid<T, I, F>(tree: &RadixTree, data: &[T], init: I, op: F) -> Result<Vec<T>>
where
    T: Clone,
    I: Fn() -> T,
    F: Fn(&T, &T) -> T,
{
    debug_assert_eq!(data.len(), tree.leaf_count());
    let mut pyramid: Vec<T> = (0..tree.len()).map(|_| init()).collect();

    for (i, value) in data.iter().enumerate() {
        let leaf = tree.leaf_node(i);
        pyramid[leaf] = value.clone();

        // Fold the leaf value itself into each ancestor. Re-reading the
        // merged slot instead would re-add sibling contributions at every
        // higher level and double-count under non-idempotent ops.
        let mut parent = tree.node(leaf).parent;
        let mut depth = 0;
        while let Some(k) = parent {
            if depth >= MAX_DEPTH {
                return Err(Error::DepthExceeded {
                    node: leaf,
                    depth: MAX_DEPTH,
                });
            }
            pyramid[k] = op(&pyramid[k], value);
            parent = tree.node(k).parent;
            depth += 1;
        }
    }

    Ok(pyramid)
}

#[cfg(test)]
use crate::{build_tree, Extents, MortonCode};
#[cfg(test)]
use glam::Vec3;

#[test]
fn two_box_root_union() {
    let ids = [0u32, 1];
    let codes = [MortonCode(0), MortonCode(1)];
    let tree = build_tree(&ids, &codes).unwrap();

    let boxes = [
        Extents {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        },
        Extents {
            min: Vec3::splat(2.0),
            max: Vec3::splat(3.0),
        },
    ];
    let pyramid = build_pyramid(&tree, &boxes, || Extents::EMPTY, |a, b| a.merge(*b)).unwrap();

    let root = &pyramid[tree.root()];
    assert_eq!(root.min, Vec3::ZERO);
    assert_eq!(root.max, Vec3::splat(3.0));
}

#[test]
fn four_box_root_union() {
    let ids: Vec<u32> = (0..4).collect();
    let codes: Vec<MortonCode> = (0..4).map(MortonCode).collect();
    let tree = build_tree(&ids, &codes).unwrap();

    let boxes: Vec<Extents> = (0..4)
        .map(|i| Extents {
            min: Vec3::splat(i as f32),
            max: Vec3::splat(i as f32 + 0.5),
        })
        .collect();
    let pyramid = build_pyramid(&tree, &boxes, || Extents::EMPTY, |a, b| a.merge(*b)).unwrap();

    let expected = boxes.iter().fold(Extents::EMPTY, |acc, b| acc.merge(*b));
    assert_eq!(pyramid[tree.root()], expected);
}

#[test]
fn leaf_counts_fold_to_n() {
    let n = 12;
    let ids: Vec<u32> = (0..n as u32).collect();
    let codes: Vec<MortonCode> = (0..n as u32).map(MortonCode).collect();
    let tree = build_tree(&ids, &codes).unwrap();

    let ones = vec![1u32; n];
    let pyramid = build_pyramid(&tree, &ones, || 0u32, |a, b| a + b).unwrap();

    assert_eq!(pyramid[tree.root()], n as u32);
    // Every internal count is the sum of its children's counts
    for k in 0..tree.leaf_start() {
        let (left, right) = tree.children(k).unwrap();
        assert_eq!(pyramid[k], pyramid[left] + pyramid[right]);
    }
}

#[test]
fn sums_fold_each_leaf_once() {
    // Distinct powers of two make any re-added contribution visible in the
    // exact sum; duplicate codes give a tie-broken tree shape distinct
    // from the sequential-code case above.
    let ids: Vec<u32> = (0..5).collect();
    let codes = vec![MortonCode(9); 5];
    let tree = build_tree(&ids, &codes).unwrap();

    let weights = [1u64, 2, 4, 8, 16];
    let pyramid = build_pyramid(&tree, &weights, || 0u64, |a, b| a + b).unwrap();

    assert_eq!(pyramid[tree.root()], 31);
    for k in 0..tree.leaf_start() {
        let (left, right) = tree.children(k).unwrap();
        assert_eq!(pyramid[k], pyramid[left] + pyramid[right]);
    }
}
