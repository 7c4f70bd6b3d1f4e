/// Seeded 2D gradient noise with a quintic fade.
///
/// The permutation table is shuffled once from the seed and doubled so
/// lattice lookups never need a wrap check. Same seed, same table, same
/// output for the same input.
#[derive(Clone)]
pub struct NoiseField {
    perm: [u8; 512],
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").finish_non_exhaustive()
    }
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            perm: Self::build_permutation(seed),
        }
    }

    /// Noise at (x, y). Continuous, approximately in [-1, 1]; zero on
    /// integer lattice points.
    pub fn noise(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = (x0 as i32 & 255) as usize;
        let yi = (y0 as i32 & 255) as usize;

        let fx = x - x0;
        let fy = y - y0;
        let u = fade(fx);
        let v = fade(fy);

        let p = &self.perm;
        let aa = p[p[xi] as usize + yi];
        let ab = p[p[xi] as usize + yi + 1];
        let ba = p[p[xi + 1] as usize + yi];
        let bb = p[p[xi + 1] as usize + yi + 1];

        let x1 = lerp(grad2d(aa, fx, fy), grad2d(ba, fx - 1.0, fy), u);
        let x2 = lerp(grad2d(ab, fx, fy - 1.0), grad2d(bb, fx - 1.0, fy - 1.0), u);
        lerp(x1, x2, v).clamp(-1.0, 1.0)
    }

    /// Sum of `octaves` calls at doubling frequency and `persistence`-scaled
    /// amplitude, normalized by the total amplitude.
    pub fn octave_noise(&self, x: f32, y: f32, octaves: u32, persistence: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.noise(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_value > 0.0 {
            total / max_value
        } else {
            0.0
        }
    }

    fn build_permutation(seed: u32) -> [u8; 512] {
        let mut p: [u8; 256] = [0; 256];
        for (i, val) in p.iter_mut().enumerate() {
            *val = i as u8;
        }

        // Fisher-Yates shuffle driven by a 64-bit LCG
        let mut rng = seed as u64;
        for i in (1..256).rev() {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let j = (rng >> 33) as usize % (i + 1);
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, val) in perm.iter_mut().enumerate() {
            *val = p[i & 255];
        }
        perm
    }
}

/// Quintic fade curve 6t⁵ - 15t⁴ + 10t³.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Dot product with one of eight lattice gradients selected by the hash.
#[inline]
fn grad2d(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}
