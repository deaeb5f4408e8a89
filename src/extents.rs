use glam::{vec3, Vec3};

/// Axis-aligned bounding box, stored as a min/max corner pair.
///
/// The empty box is the merge identity: `(+inf, -inf)` on every axis, so
/// the first point expanded into it becomes both corners. Once non-empty,
/// `min <= max` holds componentwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Extents {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Corner index pairs forming the 12 edges of a box, matching the corner
/// ordering of [`Extents::corners`].
pub const CUBE_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [0, 2],
    [0, 4],
    [1, 3],
    [1, 5],
    [2, 3],
    [2, 6],
    [3, 7],
    [4, 5],
    [4, 6],
    [5, 7],
    [6, 7],
];

impl Extents {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Componentwise min-of-mins, max-of-maxes. Associative and commutative,
    /// which is what the pyramid reduction requires of its merge operator.
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Conventional AABB intersection test: the boxes are disjoint iff some
    /// axis separates them. Boxes sharing only a face or corner overlap.
    pub fn overlap(&self, other: &Self) -> bool {
        !(self.min.cmpgt(other.max).any() || self.max.cmplt(other.min).any())
    }

    /// Grows both corners by `eps`, for query tolerance.
    pub fn inflate(self, eps: f32) -> Self {
        let deps = Vec3::splat(eps);
        Self {
            min: self.min - deps,
            max: self.max + deps,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        (point - self.center()).length()
    }

    /// The 8 corners, indexed by binary offset (bit 0 = x, bit 1 = y,
    /// bit 2 = z). Pair with [`CUBE_EDGES`] to enumerate wireframe segments.
    pub fn corners(&self) -> [Vec3; 8] {
        let size = self.size();
        [
            vec3(0., 0., 0.),
            vec3(1., 0., 0.),
            vec3(0., 1., 0.),
            vec3(1., 1., 0.),
            vec3(0., 0., 1.),
            vec3(1., 0., 1.),
            vec3(0., 1., 1.),
            vec3(1., 1., 1.),
        ]
        .map(|offset| self.min + size * offset)
    }
}

/// Bounding box of primitive `i` in a flattened index array holding `STRIDE`
/// vertex indices per primitive (e.g. `STRIDE = 3` for triangles).
pub fn calc_extents<const STRIDE: usize>(i: usize, indices: &[u32], vertices: &[Vec3]) -> Extents {
    let mut extents = Extents::EMPTY;
    for k in 0..STRIDE {
        extents.expand_point(vertices[indices[STRIDE * i + k] as usize]);
    }
    extents
}

#[test]
fn empty_is_merge_identity() {
    let unit = Extents {
        min: Vec3::ZERO,
        max: Vec3::ONE,
    };
    assert!(Extents::EMPTY.is_empty());
    assert_eq!(Extents::EMPTY.merge(unit), unit);
    assert_eq!(unit.merge(Extents::EMPTY), unit);

    let mut e = Extents::EMPTY;
    e.expand_point(Vec3::splat(2.0));
    assert_eq!(e, Extents::from_point(Vec3::splat(2.0)));
    assert!(!e.is_empty());
}

#[test]
fn overlap_test() {
    let a = Extents {
        min: Vec3::ZERO,
        max: Vec3::ONE,
    };
    let b = Extents {
        min: Vec3::splat(2.0),
        max: Vec3::splat(3.0),
    };
    assert!(!a.overlap(&b));
    assert!(a.overlap(&b.inflate(1.5)));

    // Shared face counts as overlap
    let c = Extents {
        min: vec3(1.0, 0.0, 0.0),
        max: vec3(2.0, 1.0, 1.0),
    };
    assert!(a.overlap(&c));
    assert!(a.overlap(&a));
}

#[test]
fn corners_and_center() {
    let e = Extents {
        min: Vec3::ZERO,
        max: Vec3::splat(2.0),
    };
    let corners = e.corners();
    assert_eq!(corners[0], Vec3::ZERO);
    assert_eq!(corners[7], Vec3::splat(2.0));
    assert_eq!(corners[1], vec3(2.0, 0.0, 0.0));
    assert_eq!(e.center(), Vec3::ONE);
    assert_eq!(e.distance_to(Vec3::ONE), 0.0);

    for [v0, v1] in CUBE_EDGES {
        // Every edge is axis-aligned: exactly one coordinate differs
        let diff = (corners[v0] - corners[v1]).abs();
        let changed = [diff.x, diff.y, diff.z].iter().filter(|d| **d > 0.0).count();
        assert_eq!(changed, 1);
    }
}

#[test]
fn calc_extents_triangle() {
    let vertices = vec![
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 2.0, 0.0),
        vec3(-1.0, 0.5, 3.0),
    ];
    let indices = [0u32, 1, 2];
    let e = calc_extents::<3>(0, &indices, &vertices);
    assert_eq!(e.min, vec3(-1.0, 0.0, 0.0));
    assert_eq!(e.max, vec3(1.0, 2.0, 3.0));
}
