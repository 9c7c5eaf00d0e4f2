// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic 3D noise used by the noise effect.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A pure, deterministic scalar field `noise3(x, y, z)`.
///
/// Any `Fn(f64, f64, f64) -> f64` closure is a valid source, which keeps the
/// deformation pipeline testable with a constant or analytic field.
pub trait Noise3 {
    /// Sample the field
    fn noise3(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> Noise3 for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// Improved Perlin gradient noise with a seeded permutation table.
///
/// Output is roughly in `[-1, 1]` and exactly zero on integer lattice points.
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    /// Permutation repeated twice so lookups never wrap
    perm: [u8; 512],
}

impl PerlinNoise {
    /// Seed used by [`Default`]
    pub const DEFAULT_SEED: u64 = 0x5eed;

    /// Build a noise field from a seed
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    fn p(&self, i: usize) -> usize {
        usize::from(self.perm[i])
    }
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

/// Lattice cell index in `0..256`
fn cell(v: f64) -> usize {
    (v.floor() as i64 & 255) as usize
}

impl Noise3 for PerlinNoise {
    fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, yi, zi) = (cell(x), cell(y), cell(z));
        let (x, y, z) = (x - x.floor(), y - y.floor(), z - z.floor());
        let (u, v, w) = (fade(x), fade(y), fade(z));

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(self.p(aa), x, y, z), grad(self.p(ba), x - 1.0, y, z)),
                lerp(
                    u,
                    grad(self.p(ab), x, y - 1.0, z),
                    grad(self.p(bb), x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(self.p(aa + 1), x, y, z - 1.0),
                    grad(self.p(ba + 1), x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(self.p(ab + 1), x, y - 1.0, z - 1.0),
                    grad(self.p(bb + 1), x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}
