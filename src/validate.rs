use crate::{Error, RadixTree, Result};

/// Checks the structural invariants of a built tree with an explicit-stack
/// walk from the root: every child's recorded `parent` points back at the
/// node that derived it, internal children's ranges partition their
/// parent's range exactly, and every leaf is reached exactly once.
///
/// This is the correctness contract for [`build_tree`](crate::build_tree);
/// it is a debugging aid, not something the builder runs per call.
pub fn validate(tree: &RadixTree) -> Result<()> {
    let n = tree.leaf_count();
    if n == 1 {
        if !tree.node(tree.root()).is_leaf() {
            return Err(Error::invariant("single-primitive tree must be one leaf"));
        }
        return Ok(());
    }

    if tree.len() != 2 * n - 1 {
        return Err(Error::invariant(format!(
            "expected {} nodes for {} leaves, found {}",
            2 * n - 1,
            n,
            tree.len()
        )));
    }
    if tree.node(tree.root()).parent.is_some() {
        return Err(Error::invariant("root has a parent"));
    }

    let mut visited = vec![false; n];
    let mut internal_seen = 0usize;
    let mut stack = vec![tree.root()];
    while let Some(k) = stack.pop() {
        let node = tree.node(k);
        let Some(split) = node.split else {
            return Err(Error::invariant(format!(
                "internal walk reached leaf node {k}"
            )));
        };
        internal_seen += 1;
        if !(node.start <= split && split < node.end) {
            return Err(Error::invariant(format!(
                "node {k}: split {split} outside range [{}, {})",
                node.start, node.end
            )));
        }

        let (left, right) = tree
            .children(k)
            .ok_or_else(|| Error::invariant(format!("node {k}: no children")))?;
        for (child, lo, hi) in [(left, node.start, split), (right, split + 1, node.end)] {
            if tree.node(child).parent != Some(k) {
                return Err(Error::invariant(format!(
                    "node {child}: parent {:?} does not point at deriving node {k}",
                    tree.node(child).parent
                )));
            }
            if child >= tree.leaf_start() {
                // Leaf child: a length-1 sub-range
                if lo != hi {
                    return Err(Error::invariant(format!(
                        "node {k}: leaf child {child} spans more than one slot"
                    )));
                }
                let slot = tree.leaf_slot(child);
                if slot != lo {
                    return Err(Error::invariant(format!(
                        "node {k}: leaf child {child} holds slot {slot}, expected {lo}"
                    )));
                }
                if visited[slot] {
                    return Err(Error::invariant(format!("leaf slot {slot} visited twice")));
                }
                visited[slot] = true;
            } else {
                let c = tree.node(child);
                if (c.start, c.end) != (lo, hi) {
                    return Err(Error::invariant(format!(
                        "node {child}: range [{}, {}] does not match derived [{lo}, {hi}]",
                        c.start, c.end
                    )));
                }
                stack.push(child);
            }
        }
    }

    if internal_seen != n - 1 {
        return Err(Error::invariant(format!(
            "reached {internal_seen} internal nodes, expected {}",
            n - 1
        )));
    }
    if let Some(slot) = visited.iter().position(|seen| !seen) {
        return Err(Error::invariant(format!("leaf slot {slot} never reached")));
    }

    Ok(())
}

#[cfg(test)]
use crate::RadixTreeNode;

#[cfg(test)]
fn two_leaf_nodes() -> Vec<RadixTreeNode> {
    vec![
        RadixTreeNode {
            start: 0,
            end: 1,
            split: Some(0),
            parent: None,
        },
        RadixTreeNode {
            start: 1,
            end: 1,
            split: None,
            parent: Some(0),
        },
        RadixTreeNode {
            start: 2,
            end: 2,
            split: None,
            parent: Some(0),
        },
    ]
}

#[test]
fn accepts_minimal_tree() {
    let tree = RadixTree::from_parts(two_leaf_nodes(), 1);
    validate(&tree).unwrap();
}

#[test]
fn rejects_broken_parent_link() {
    let mut nodes = two_leaf_nodes();
    nodes[2].parent = Some(2);
    let tree = RadixTree::from_parts(nodes, 1);
    let err = validate(&tree).unwrap_err();
    assert!(matches!(err, Error::Invariant(_)));
}

#[test]
fn rejects_split_outside_range() {
    let mut nodes = two_leaf_nodes();
    nodes[0].split = Some(1);
    let tree = RadixTree::from_parts(nodes, 1);
    assert!(validate(&tree).is_err());
}
