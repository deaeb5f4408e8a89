use bitvec::prelude::*;
use glam::{uvec3, UVec3, Vec3};

/// 30-bit Morton (Z-order) code for a point in the unit cube.
///
/// Each axis is quantized to a 10-bit lattice index and the three indices
/// are bit-interleaved, so that codes numerically close tend to be spatially
/// close. Only the low 30 bits carry payload; the top 2 bits are always 0.
///
/// ```text
/// Bit 3k+2: x lattice bit k
/// Bit 3k+1: y lattice bit k
/// Bit 3k+0: z lattice bit k      for k in 0..10
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MortonCode(pub u32);

impl MortonCode {
    /// Lattice resolution per axis (2^10).
    pub const LATTICE: f32 = 1024.0;
    /// Number of payload bits.
    pub const BITS: usize = 30;
    /// The all-ones code: the lattice cell nearest `(1,1,1)`.
    pub const MAX: Self = Self(0x3FFF_FFFF);

    const X_OFFSET: usize = 2;
    const Y_OFFSET: usize = 1;
    const Z_OFFSET: usize = 0;

    /// Encodes a point that has already been normalized into `[0,1)`
    /// (typically `(p - global_min) / global_extent`). Out-of-range
    /// coordinates clamp to the boundary lattice cells, never reject.
    pub fn from_unit_point(point: Vec3) -> Self {
        let x = expand_bits(quantize(point.x, Self::LATTICE));
        let y = expand_bits(quantize(point.y, Self::LATTICE));
        let z = expand_bits(quantize(point.z, Self::LATTICE));
        Self(x * 4 + y * 2 + z)
    }

    /// Recovers the quantized lattice position by de-interleaving the
    /// payload bits. Mostly a test and debugging aid; the builder never
    /// needs to decode.
    pub fn position(&self) -> UVec3 {
        let bits = &self.0.view_bits::<LocalBits>()[..Self::BITS];
        let axis = |offset: usize| -> u32 {
            bits.iter()
                .by_vals()
                .skip(offset)
                .step_by(3)
                .enumerate()
                .fold(0u32, |acc, (k, bit)| acc | ((bit as u32) << k))
        };
        uvec3(
            axis(Self::X_OFFSET),
            axis(Self::Y_OFFSET),
            axis(Self::Z_OFFSET),
        )
    }
}

/// Maps a unit-interval coordinate onto a `c`-cell lattice, clamping
/// `x * c` into `[0, c-1]`.
#[inline]
pub fn quantize(x: f32, c: f32) -> u32 {
    (x * c).clamp(0.0, c - 1.0) as u32
}

/// Expands the low 10 bits of `v` by inserting two zero bits after each,
/// leaving the payload at bit positions 0, 3, 6, ..., 27.
#[inline]
pub fn expand_bits(v: u32) -> u32 {
    let v = v.wrapping_mul(0x0001_0001) & 0xFF00_00FF;
    let v = v.wrapping_mul(0x0000_0101) & 0x0F00_F00F;
    let v = v.wrapping_mul(0x0000_0011) & 0xC30C_30C3;
    v.wrapping_mul(0x0000_0005) & 0x4924_9249
}

/// Returns the permutation `ids` with `codes[ids[i]]` non-decreasing in `i`.
///
/// The sort is stable, so primitives with equal codes keep their original
/// index order; the radix tree relies on that as its duplicate-code
/// tie-break key.
pub fn sort_by_code(codes: &[MortonCode]) -> Vec<u32> {
    let mut ids: Vec<u32> = (0..codes.len() as u32).collect();
    ids.sort_by_key(|&id| codes[id as usize]);
    ids
}

#[test]
fn morton_boundaries() {
    assert_eq!(MortonCode::from_unit_point(Vec3::ZERO), MortonCode(0));
    let just_under_one = Vec3::splat(1.0 - f32::EPSILON);
    assert_eq!(MortonCode::from_unit_point(just_under_one), MortonCode::MAX);

    // Out-of-range input clamps to the boundary cells
    assert_eq!(MortonCode::from_unit_point(Vec3::splat(7.0)), MortonCode::MAX);
    assert_eq!(
        MortonCode::from_unit_point(Vec3::splat(-3.0)),
        MortonCode(0)
    );
}

#[test]
fn expand_bits_spread() {
    assert_eq!(expand_bits(0b1), 0b1);
    assert_eq!(expand_bits(0b10), 0b1000);
    assert_eq!(expand_bits(0b11), 0b1001);
    assert_eq!(expand_bits(0x3FF), 0x0924_9249);
}

#[test]
fn position_roundtrip() {
    use glam::vec3;

    let code = MortonCode::from_unit_point(vec3(0.5, 0.25, 0.75));
    assert_eq!(code.position(), uvec3(512, 256, 768));
    assert_eq!(MortonCode::MAX.position(), UVec3::splat(1023));
}

#[test]
fn sort_is_stable_on_ties() {
    let codes = [5u32, 1, 5, 0].map(MortonCode);
    assert_eq!(sort_by_code(&codes), vec![3, 1, 0, 2]);
}
