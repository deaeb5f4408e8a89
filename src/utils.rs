use glam::{vec3, Vec3};
use lerp::Lerp;

/// Tiny seeded xorshift generator, so test soups are reproducible without
/// dragging in an RNG dependency. Not for anything but test data.
#[derive(Debug, Clone)]
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        // xorshift sticks at zero; remap only that seed, to a constant no
        // small seed collides with
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

/// `n` points uniform in `[-1, 1]^3`.
pub fn random_points(n: usize, seed: u64) -> Vec<Vec3> {
    let mut rng = Rng::new(seed);
    let mut unit = move || (-1.0f32).lerp(1.0, rng.next_f32());
    (0..n).map(|_| vec3(unit(), unit(), unit())).collect()
}

/// Random point soup: `stride * n` vertices with identity indices, the
/// shape the builder consumes (`n` primitives of `stride` vertices each).
#[derive(Debug, Clone)]
pub struct PointSoup {
    pub points: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub stride: usize,
}

impl PointSoup {
    pub fn new(n: usize, stride: usize, seed: u64) -> Self {
        let points = random_points(stride * n, seed);
        let indices = (0..(stride * n) as u32).collect();
        Self {
            points,
            indices,
            stride,
        }
    }
}

#[test]
fn rng_is_deterministic() {
    let a = random_points(16, 99);
    let b = random_points(16, 99);
    assert_eq!(a, b);

    let c = random_points(16, 100);
    assert_ne!(a, c);
}

#[test]
fn zero_seed_gets_its_own_stream() {
    let zero = random_points(16, 0);
    assert_ne!(zero, random_points(16, 1));
    assert_eq!(zero, random_points(16, 0));
}

#[test]
fn points_stay_in_range() {
    for p in random_points(1000, 1) {
        assert!(p.min_element() >= -1.0 && p.max_element() <= 1.0, "{p}");
    }
}

#[test]
fn soup_shape() {
    let soup = PointSoup::new(10, 3, 42);
    assert_eq!(soup.points.len(), 30);
    assert_eq!(soup.indices.len(), 30);
    assert!(soup.indices.iter().copied().eq(0..30u32));
}
