//! Deterministic hash-based PRNG.
//!
//! Every random draw in the pipeline (shape parameters, spawn placement,
//! per-fragment seeds) goes through `hash_u32`, so a fixed seed reproduces
//! the same scene on any thread and any platform.

/// Hash a seed and two lanes into a well-distributed u32 (PCG-style mixing).
pub fn hash_u32(seed: u32, a: u32, b: u32) -> u32 {
    let mut state = seed
        .wrapping_mul(0x9E3779B9)
        .wrapping_add(a.wrapping_mul(0x517CC1B7))
        .wrapping_add(b.wrapping_mul(0x2545F491));

    state = state ^ (state >> 16);
    state = state.wrapping_mul(0x45D9F3B);
    state = state ^ (state >> 16);
    state = state.wrapping_mul(0x45D9F3B);
    state = state ^ (state >> 16);

    state
}

/// Convert a hash value to a float in [0, 1).
pub fn hash_to_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0 // 2^24
}

/// Sequential generator over `hash_u32`: draw `n` is `hash_u32(seed, n, stream)`.
#[derive(Debug, Clone)]
pub struct HashRng {
    seed: u32,
    stream: u32,
    counter: u32,
}

impl HashRng {
    pub fn new(seed: u32) -> Self {
        Self::with_stream(seed, 0)
    }

    /// Independent sequence for the same seed (e.g. one stream per purpose).
    pub fn with_stream(seed: u32, stream: u32) -> Self {
        Self {
            seed,
            stream,
            counter: 0,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let h = hash_u32(self.seed, self.counter, self.stream);
        self.counter = self.counter.wrapping_add(1);
        h
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        hash_to_float(self.next_u32())
    }

    /// Uniform float in [min, max).
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform integer in [min, max] (inclusive).
    pub fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_u32() % (max - min + 1)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_u32(5, 10, 3), hash_u32(5, 10, 3));
        let mut a = HashRng::new(42);
        let mut b = HashRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = HashRng::with_stream(42, 0);
        let mut b = HashRng::with_stream(42, 1);
        let same = (0..32).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 2, "streams should be independent, {same} collisions");
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = HashRng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v), "out of range: {v}");
            let n = rng.range_u32(3, 6);
            assert!((3..=6).contains(&n), "out of range: {n}");
        }
        assert_eq!(rng.range_u32(4, 4), 4);
    }

    #[test]
    fn test_distribution() {
        let mut rng = HashRng::new(1);
        let low = (0..10_000).filter(|_| rng.next_f32() < 0.5).count();
        let frac = low as f32 / 10_000.0;
        assert!(frac > 0.45 && frac < 0.55, "poor distribution: {frac}");
    }
}
