use crate::{
    build_pyramid, build_tree, calc_extents, sort_by_code, Error, Extents, MortonCode, RadixTree,
    Result,
};
use glam::Vec3;
use log::{debug, trace};

/// Linear BVH over an externally owned point/primitive soup.
///
/// Built from scratch on every call: primitive centroids are normalized
/// into the unit cube, Morton-encoded, sorted, a radix tree is linked over
/// the sorted order, and per-primitive boxes are reduced upward into a
/// box pyramid keyed like the node array. The caller keeps ownership of
/// `points` and `indices`; the result owns only its derived arrays and
/// carries no state between builds.
#[derive(Debug, Clone)]
pub struct Lbvh {
    order: Vec<u32>,
    codes: Vec<MortonCode>,
    tree: RadixTree,
    boxes: Vec<Extents>,
}

impl Lbvh {
    /// Builds the hierarchy over primitives of `STRIDE` vertex indices each
    /// (`STRIDE = 3` for triangles, `1` for bare points).
    pub fn build<const STRIDE: usize>(points: &[Vec3], indices: &[u32]) -> Result<Self> {
        if STRIDE == 0 || indices.len() % STRIDE != 0 {
            return Err(Error::IndexStride {
                len: indices.len(),
                stride: STRIDE,
            });
        }
        let n = indices.len() / STRIDE;
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        // Primitive centroids set the spatial ordering
        let cens: Vec<Vec3> = (0..n)
            .map(|i| {
                let mut cen = Vec3::ZERO;
                for k in 0..STRIDE {
                    cen += points[indices[STRIDE * i + k] as usize];
                }
                cen / STRIDE as f32
            })
            .collect();

        let mut bounds = Extents::EMPTY;
        for &cen in &cens {
            bounds.expand_point(cen);
        }
        // Clamp the span so coplanar inputs don't divide by zero; a flat
        // axis then quantizes to lattice cell 0 everywhere.
        let span = bounds.size().max(Vec3::splat(f32::EPSILON));
        let codes: Vec<MortonCode> = cens
            .iter()
            .map(|&cen| MortonCode::from_unit_point((cen - bounds.min) / span))
            .collect();
        debug!("encoded {n} primitive centroids over bounds {bounds:?}");

        let order = sort_by_code(&codes);
        let tree = build_tree(&order, &codes)?;
        trace!(
            "radix tree: {} nodes over {} leaves",
            tree.len(),
            tree.leaf_count()
        );

        // Per-primitive boxes in sorted (leaf) order, then the upward merge
        let prim_boxes: Vec<Extents> = order
            .iter()
            .map(|&id| calc_extents::<STRIDE>(id as usize, indices, points))
            .collect();
        let boxes = build_pyramid(&tree, &prim_boxes, || Extents::EMPTY, |a, b| a.merge(*b))?;
        debug!("built lbvh: {n} primitives, root box {:?}", boxes[0]);

        Ok(Self {
            order,
            codes,
            tree,
            boxes,
        })
    }

    /// Sorted permutation: `order()[slot]` is the primitive id at sorted
    /// slot `slot` (and at leaf node `tree().leaf_node(slot)`).
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Per-primitive Morton codes, indexed by primitive id.
    pub fn codes(&self) -> &[MortonCode] {
        &self.codes
    }

    pub fn tree(&self) -> &RadixTree {
        &self.tree
    }

    /// Box pyramid keyed like the node array: leaf slots hold primitive
    /// boxes, internal slots the merged box of all descendants.
    pub fn boxes(&self) -> &[Extents] {
        &self.boxes
    }

    /// Merged bounds of every primitive box.
    pub fn root_bounds(&self) -> Extents {
        self.boxes[self.tree.root()]
    }

    /// Ids of all primitives whose boxes overlap `probe`, found by a stack
    /// walk pruned with the pyramid boxes.
    pub fn query_overlaps(&self, probe: Extents) -> Vec<u32> {
        let mut hits = Vec::new();
        let mut stack = vec![self.tree.root()];
        while let Some(k) = stack.pop() {
            if !self.boxes[k].overlap(&probe) {
                continue;
            }
            match self.tree.children(k) {
                Some((left, right)) => {
                    stack.push(left);
                    stack.push(right);
                }
                None => hits.push(self.order[self.tree.leaf_slot(k)]),
            }
        }
        hits
    }
}

#[cfg(test)]
use crate::utils::PointSoup;
#[cfg(test)]
use crate::validate;
#[cfg(test)]
use glam::vec3;

#[test]
fn end_to_end_soup() {
    let soup = PointSoup::new(100, 3, 0x5EED);
    let bvh = Lbvh::build::<3>(&soup.points, &soup.indices).unwrap();

    assert_eq!(bvh.tree().leaf_count(), 100);
    assert_eq!(bvh.boxes().len(), 199);
    validate(bvh.tree()).unwrap();

    // Root box is the merge of every primitive box
    let mut expected = Extents::EMPTY;
    for i in 0..100 {
        expected = expected.merge(calc_extents::<3>(i, &soup.indices, &soup.points));
    }
    assert_eq!(bvh.root_bounds(), expected);

    // The sorted order is a permutation of the primitive ids
    let mut order = bvh.order().to_vec();
    order.sort_unstable();
    assert!(order.iter().copied().eq(0..100u32));
}

#[test]
fn query_finds_the_right_triangle() {
    // Two triangles far apart
    let points = vec![
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
        vec3(10.0, 10.0, 10.0),
        vec3(11.0, 10.0, 10.0),
        vec3(10.0, 11.0, 10.0),
    ];
    let indices: Vec<u32> = (0..6).collect();
    let bvh = Lbvh::build::<3>(&points, &indices).unwrap();

    let probe = Extents::from_point(vec3(10.5, 10.5, 10.0)).inflate(0.1);
    assert_eq!(bvh.query_overlaps(probe), vec![1]);

    let probe = Extents::from_point(vec3(0.2, 0.2, 0.0)).inflate(0.1);
    assert_eq!(bvh.query_overlaps(probe), vec![0]);

    let everything = bvh.root_bounds().inflate(1.0);
    let mut all = bvh.query_overlaps(everything);
    all.sort_unstable();
    assert_eq!(all, vec![0, 1]);

    let nowhere = Extents::from_point(vec3(-50.0, 0.0, 0.0)).inflate(0.1);
    assert!(bvh.query_overlaps(nowhere).is_empty());
}

#[test]
fn single_primitive_build() {
    let points = vec![vec3(1.0, 2.0, 3.0)];
    let bvh = Lbvh::build::<1>(&points, &[0]).unwrap();
    assert_eq!(bvh.tree().len(), 1);
    assert_eq!(bvh.root_bounds(), Extents::from_point(points[0]));
}

#[test]
fn bad_inputs_fail_fast() {
    let points = vec![Vec3::ZERO; 4];
    assert!(matches!(
        Lbvh::build::<3>(&points, &[0, 1, 2, 3]),
        Err(Error::IndexStride { len: 4, stride: 3 })
    ));
    assert!(matches!(
        Lbvh::build::<3>(&points, &[]),
        Err(Error::EmptyInput)
    ));
}

#[test]
fn coplanar_points_still_build() {
    // All centroids share z = 0; the flat axis must not poison the codes
    let soup = PointSoup::new(32, 1, 7);
    let points: Vec<Vec3> = soup.points.iter().map(|p| vec3(p.x, p.y, 0.0)).collect();
    let bvh = Lbvh::build::<1>(&points, &soup.indices).unwrap();
    validate(bvh.tree()).unwrap();
    assert_eq!(bvh.root_bounds().min.z, 0.0);
    assert_eq!(bvh.root_bounds().max.z, 0.0);
}
