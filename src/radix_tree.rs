use crate::{Error, MortonCode, Result};
#[cfg(feature = "multi-thread")]
use rayon::prelude::*;

/// One node of the binary radix tree, addressed by array index.
///
/// Internal nodes occupy positions `[0, N-2]`, leaves `[N-1, 2N-2)`; the
/// leaf at position `N-1+i` corresponds to sorted slot `i`. An internal
/// node's `[start, end]` range of sorted slots is partitioned by `split`
/// into `[start, split]` and `[split+1, end]`; a sub-range of length 1 is a
/// leaf child, anything longer is the internal node at `split` or
/// `split+1`. `split` is `None` exactly on leaves, `parent` is `None`
/// exactly on the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadixTreeNode {
    pub start: usize,
    pub end: usize,
    pub split: Option<usize>,
    pub parent: Option<usize>,
}

impl RadixTreeNode {
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }
}

/// Binary radix tree over a Morton-sorted primitive order: `N` leaves plus
/// `N-1` internal nodes in one flat array, linked by integer handles only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadixTree {
    nodes: Vec<RadixTreeNode>,
    leaf_start: usize,
}

impl RadixTree {
    pub(crate) fn from_parts(nodes: Vec<RadixTreeNode>, leaf_start: usize) -> Self {
        Self { nodes, leaf_start }
    }

    /// The root is always node 0 (the sole leaf when `N == 1`).
    #[inline(always)]
    pub fn root(&self) -> usize {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_start + 1
    }

    /// First leaf position in the node array (`N - 1`).
    #[inline(always)]
    pub fn leaf_start(&self) -> usize {
        self.leaf_start
    }

    /// Node index of the leaf holding sorted slot `slot`.
    #[inline(always)]
    pub fn leaf_node(&self, slot: usize) -> usize {
        self.leaf_start + slot
    }

    /// Sorted slot held by leaf node `k`.
    #[inline(always)]
    pub fn leaf_slot(&self, k: usize) -> usize {
        k - self.leaf_start
    }

    pub fn node(&self, k: usize) -> &RadixTreeNode {
        &self.nodes[k]
    }

    pub fn nodes(&self) -> &[RadixTreeNode] {
        &self.nodes
    }

    /// Node indices of the two children of internal node `k`, `None` for a
    /// leaf. A length-1 sub-range maps to the leaf at `leaf_start + slot`.
    pub fn children(&self, k: usize) -> Option<(usize, usize)> {
        let node = &self.nodes[k];
        let split = node.split?;
        let left = if split == node.start {
            self.leaf_start + split
        } else {
            split
        };
        let right = if split + 1 == node.end {
            self.leaf_start + node.end
        } else {
            split + 1
        };
        Some((left, right))
    }
}

/// Length of the common prefix between the sort keys at sorted positions
/// `i` and `j`, or `None` when `j` falls outside `[0, N)`.
///
/// For distinct codes this is the count of leading zero bits of their XOR.
/// Equal codes extend the prefix with the leading zeros of `i ^ j` plus 32,
/// so the sorted position acts as a tie-break key and the composite key is
/// strictly increasing. `Option`'s ordering (`None < Some(_)`) makes the
/// out-of-range sentinel compare below every real prefix length.
fn delta(i: i64, j: i64, ids: &[u32], codes: &[MortonCode]) -> Option<u32> {
    if j < 0 || j >= ids.len() as i64 {
        return None;
    }
    let code_i = codes[ids[i as usize] as usize].0;
    let code_j = codes[ids[j as usize] as usize].0;
    if code_i == code_j {
        Some(32 + ((i as u32) ^ (j as u32)).leading_zeros())
    } else {
        Some((code_i ^ code_j).leading_zeros())
    }
}

/// Inclusive range of sorted slots covered by internal node `i`.
///
/// Scans away from `i` in the direction of the longer neighbor prefix:
/// exponential doubling finds an upper bound `lmax` whose prefix has
/// dropped to `sig_min` (the prefix shared with the slot just outside the
/// range), then binary refinement finds the largest extent still above it.
pub fn find_range(i: usize, ids: &[u32], codes: &[MortonCode]) -> (usize, usize) {
    let i = i as i64;
    let dir: i64 = if delta(i, i + 1, ids, codes) > delta(i, i - 1, ids, codes) {
        1
    } else {
        -1
    };
    let sig_min = delta(i, i - dir, ids, codes);

    let mut lmax: i64 = 2;
    while delta(i, i + lmax * dir, ids, codes) > sig_min {
        lmax *= 2;
    }

    let mut l: i64 = 0;
    let mut t = lmax >> 1;
    while t >= 1 {
        if delta(i, i + (l + t) * dir, ids, codes) > sig_min {
            l += t;
        }
        t >>= 1;
    }

    let j = i + l * dir;
    (i.min(j) as usize, i.max(j) as usize)
}

/// Position of the last element of the left half of `[start, end]`: the
/// largest offset from `start` whose prefix with `start` still exceeds the
/// prefix shared by the whole range. Everything in `[start, split]` shares
/// a strictly longer prefix with each other than with `[split+1, end]`.
pub fn find_split(start: usize, end: usize, ids: &[u32], codes: &[MortonCode]) -> usize {
    let seed = delta(start as i64, end as i64, ids, codes);
    let mut split = start;
    let mut step = end - start;
    while step > 1 {
        step = (step + 1) >> 1;
        let probe = split + step;
        if probe < end && delta(start as i64, probe as i64, ids, codes) > seed {
            split = probe;
        }
    }
    split
}

/// Range and split for every internal node. Each entry reads only the
/// immutable `ids`/`codes` arrays, never another node's output, so the
/// parallel and sequential paths produce identical results.
fn internal_splits(ids: &[u32], codes: &[MortonCode]) -> Vec<(usize, usize, usize)> {
    let node = |i: usize| {
        let (start, end) = find_range(i, ids, codes);
        (start, end, find_split(start, end, ids, codes))
    };
    #[cfg(feature = "multi-thread")]
    {
        (0..ids.len() - 1).into_par_iter().map(node).collect()
    }
    #[cfg(not(feature = "multi-thread"))]
    {
        (0..ids.len() - 1).map(node).collect()
    }
}

/// Builds the radix tree over `N` sorted slots: `2N-1` nodes, root at
/// index 0. `ids` must be the sorted permutation from
/// [`sort_by_code`](crate::sort_by_code) and `codes` the per-primitive
/// Morton codes it was sorted by.
pub fn build_tree(ids: &[u32], codes: &[MortonCode]) -> Result<RadixTree> {
    if ids.is_empty() {
        return Err(Error::EmptyInput);
    }
    debug_assert_eq!(ids.len(), codes.len());

    let n = ids.len();
    let leaf_start = n - 1;
    let mut nodes = vec![
        RadixTreeNode {
            start: 0,
            end: 0,
            split: None,
            parent: None,
        };
        2 * n - 1
    ];
    for i in 0..n {
        nodes[leaf_start + i].start = leaf_start + i;
        nodes[leaf_start + i].end = leaf_start + i;
    }

    for (i, &(start, end, split)) in internal_splits(ids, codes).iter().enumerate() {
        nodes[i].start = start;
        nodes[i].end = end;
        nodes[i].split = Some(split);

        let left = if split == start {
            leaf_start + split
        } else {
            split
        };
        let right = if split + 1 == end {
            leaf_start + end
        } else {
            split + 1
        };
        nodes[left].parent = Some(i);
        nodes[right].parent = Some(i);
    }

    Ok(RadixTree::from_parts(nodes, leaf_start))
}

#[cfg(test)]
fn identity_input(n: usize) -> (Vec<u32>, Vec<MortonCode>) {
    let ids: Vec<u32> = (0..n as u32).collect();
    let codes: Vec<MortonCode> = (0..n as u32).map(MortonCode).collect();
    (ids, codes)
}

#[test]
fn twelve_leaf_tree_validates() {
    let (ids, codes) = identity_input(12);
    let tree = build_tree(&ids, &codes).unwrap();

    assert_eq!(tree.len(), 23);
    assert_eq!(tree.leaf_count(), 12);
    crate::validate(&tree).unwrap();

    // Exactly one root, at index 0
    let roots: Vec<usize> = (0..tree.len())
        .filter(|&k| tree.node(k).parent.is_none())
        .collect();
    assert_eq!(roots, vec![0]);
}

#[test]
fn build_is_deterministic() {
    let (ids, codes) = identity_input(12);
    let a = build_tree(&ids, &codes).unwrap();
    let b = build_tree(&ids, &codes).unwrap();
    assert_eq!(a, b);
}

#[test]
fn leaves_are_self_indexed() {
    let (ids, codes) = identity_input(8);
    let tree = build_tree(&ids, &codes).unwrap();
    for slot in 0..8 {
        let k = tree.leaf_node(slot);
        let leaf = tree.node(k);
        assert!(leaf.is_leaf());
        assert_eq!((leaf.start, leaf.end), (k, k));
        assert_eq!(tree.leaf_slot(k), slot);
    }
}

#[test]
fn ranges_nest_exactly() {
    let (ids, codes) = identity_input(12);
    let tree = build_tree(&ids, &codes).unwrap();
    for k in 0..tree.leaf_start() {
        let node = tree.node(k);
        let split = node.split.unwrap();
        let (left, right) = tree.children(k).unwrap();
        if left < tree.leaf_start() {
            assert_eq!(tree.node(left).start, node.start);
            assert_eq!(tree.node(left).end, split);
        }
        if right < tree.leaf_start() {
            assert_eq!(tree.node(right).start, split + 1);
            assert_eq!(tree.node(right).end, node.end);
        }
        assert_eq!(tree.node(left).parent, Some(k));
        assert_eq!(tree.node(right).parent, Some(k));
    }
}

#[test]
fn single_leaf_degenerate() {
    let tree = build_tree(&[0], &[MortonCode(7)]).unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.node(tree.root()).is_leaf());
    assert_eq!(tree.children(tree.root()), None);
    crate::validate(&tree).unwrap();
}

#[test]
fn empty_input_fails_fast() {
    assert!(matches!(build_tree(&[], &[]), Err(Error::EmptyInput)));
}

#[test]
fn duplicate_codes_build_a_valid_tree() {
    let ids: Vec<u32> = (0..8).collect();
    let codes = vec![MortonCode(42); 8];
    let tree = build_tree(&ids, &codes).unwrap();
    assert_eq!(tree.len(), 15);
    crate::validate(&tree).unwrap();
}
