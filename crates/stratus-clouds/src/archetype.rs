//! Per-archetype density and boundary fields over normalized cell
//! coordinates `(nx, ny) ∈ [-1, 1]²`, y pointing down.

use stratus_core::math::smoothstep;
use stratus_core::rng::HashRng;
use stratus_core::types::{Archetype, CloudFragmentSpec};

use crate::noise::NoiseField;

/// Circular density source used by puffy masses, dense bulges and
/// scattered patches.
#[derive(Debug, Clone, Copy)]
struct Mass {
    cx: f32,
    cy: f32,
    radius: f32,
}

impl Mass {
    fn distance(&self, nx: f32, ny: f32) -> f32 {
        let dx = nx - self.cx;
        let dy = ny - self.cy;
        (dx * dx + dy * dy).sqrt()
    }

    /// Smooth falloff: 1 at the center, 0 at the radius.
    fn soft(&self, nx: f32, ny: f32) -> f32 {
        smoothstep(0.0, 1.0, 1.0 - self.distance(nx, ny) / self.radius)
    }

    /// Hard cutoff at the radius with a mild inner gradient.
    fn hard(&self, nx: f32, ny: f32) -> f32 {
        let d = self.distance(nx, ny);
        if d <= self.radius {
            1.0 - 0.35 * (d / self.radius)
        } else {
            0.0
        }
    }
}

/// Horizontal tendril for wispy clouds.
#[derive(Debug, Clone, Copy)]
struct Band {
    cy: f32,
    thickness: f32,
    extent: f32,
    phase: f32,
}

#[derive(Debug, Clone)]
enum Features {
    Wispy { bands: Vec<Band> },
    Puffy { masses: Vec<Mass> },
    Dense { core: f32, bulges: Vec<Mass> },
    Scattered { patches: Vec<Mass> },
}

/// Shape parameters drawn once per fragment from its noise seed.
#[derive(Debug, Clone)]
pub struct ShapeParams {
    features: Features,
    turbulence: f32,
    detail_octaves: u32,
    /// Offsets noise lookups so feature, detail and boundary noise decorrelate.
    offset: f32,
    /// Boundary ellipse radii.
    rx: f32,
    ry: f32,
    /// Normalized y below which the ragged bottom starts.
    bottom_line: f32,
}

impl ShapeParams {
    pub fn generate(spec: &CloudFragmentSpec) -> Self {
        let mut rng = HashRng::with_stream(spec.noise_seed, 1);
        let offset = rng.range(0.0, 100.0);

        let features = match spec.archetype {
            Archetype::Wispy => {
                let count = rng.range_u32(3, 5);
                let bands = (0..count)
                    .map(|_| Band {
                        cy: rng.range(-0.45, 0.45),
                        thickness: rng.range(0.12, 0.28),
                        extent: rng.range(0.7, 1.0),
                        phase: rng.range(0.0, 50.0),
                    })
                    .collect();
                Features::Wispy { bands }
            }
            Archetype::Puffy => {
                let count = rng.range_u32(4, 7);
                let masses = (0..count)
                    .map(|_| Mass {
                        cx: rng.range(-0.55, 0.55),
                        cy: rng.range(-0.35, 0.25),
                        radius: rng.range(0.35, 0.6),
                    })
                    .collect();
                Features::Puffy { masses }
            }
            Archetype::Dense => {
                let count = rng.range_u32(3, 5);
                let bulges = (0..count)
                    .map(|_| Mass {
                        cx: rng.range(-0.5, 0.5),
                        cy: rng.range(-0.45, 0.15),
                        radius: rng.range(0.4, 0.65),
                    })
                    .collect();
                Features::Dense {
                    core: rng.range(0.75, 0.9),
                    bulges,
                }
            }
            Archetype::Scattered => {
                let count = rng.range_u32(8, 14);
                let patches = (0..count)
                    .map(|_| Mass {
                        cx: rng.range(-0.75, 0.75),
                        cy: rng.range(-0.6, 0.6),
                        radius: rng.range(0.12, 0.3),
                    })
                    .collect();
                Features::Scattered { patches }
            }
        };

        let (rx, ry) = match spec.archetype {
            Archetype::Wispy => (1.0, 0.65),
            Archetype::Puffy => (0.95, 0.85),
            Archetype::Dense => (0.92, 0.88),
            Archetype::Scattered => (1.0, 0.95),
        };

        let complexity = spec.shape_complexity.clamp(0.0, 1.0);
        Self {
            features,
            turbulence: spec.turbulence.clamp(0.0, 1.0),
            detail_octaves: (1.0 + (complexity * 2.0).round()) as u32,
            offset,
            rx,
            ry,
            bottom_line: rng.range(0.35, 0.55),
        }
    }

    pub fn detail_octaves(&self) -> u32 {
        self.detail_octaves
    }

    /// Archetype shape before detail noise and vertical treatment.
    fn base_density(&self, noise: &NoiseField, nx: f32, ny: f32) -> f32 {
        match &self.features {
            Features::Wispy { bands } => {
                let strength = 0.15 * (0.5 + self.turbulence);
                let strongest = bands
                    .iter()
                    .map(|band| {
                        let center =
                            band.cy + noise.noise(nx * 2.0 + band.phase, band.phase * 0.7) * strength;
                        let vertical = (1.0 - (ny - center).abs() / band.thickness).max(0.0);
                        let horizontal = (1.0 - (nx / band.extent).powi(2)).max(0.0);
                        vertical * horizontal.sqrt()
                    })
                    .fold(0.0, f32::max);
                strongest * (1.0 - 0.5 * ny * ny)
            }
            Features::Puffy { masses } => {
                masses.iter().map(|m| m.soft(nx, ny)).fold(0.0, f32::max)
            }
            Features::Dense { core, bulges } => {
                let r = (nx * nx + (ny * 1.15).powi(2)).sqrt();
                let radial = (1.0 - r / core).max(0.0).powf(0.7);
                bulges
                    .iter()
                    .map(|m| m.soft(nx, ny))
                    .fold(radial, f32::max)
            }
            Features::Scattered { patches } => {
                patches.iter().map(|m| m.hard(nx, ny)).fold(0.0, f32::max)
            }
        }
    }

    /// Full density in [0, 1] before the fragment's density multiplier.
    pub fn density(&self, noise: &NoiseField, nx: f32, ny: f32) -> f32 {
        let base = self.base_density(noise, nx, ny);
        if base <= 0.0 {
            return 0.0;
        }

        let mut detail = 0.0;
        let mut amplitude = 0.25 * (0.5 + self.turbulence);
        let mut frequency = 3.0;
        for octave in 0..self.detail_octaves {
            let shift = self.offset + octave as f32 * 17.0;
            detail += noise.noise(nx * frequency + shift, ny * frequency + shift) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        let mut d = base + detail * base.sqrt();

        // Ragged bottom, compressed top.
        if ny > 0.0 {
            let ragged = self.bottom_line
                + noise.noise(nx * 5.0 + self.offset, self.offset * 0.3) * 0.2 * (0.5 + self.turbulence);
            if ny > ragged {
                d *= (1.0 - (ny - ragged) * 2.5).max(0.0);
            }
        } else {
            d *= 1.0 - 0.25 * ny * ny;
        }

        d.clamp(0.0, 1.0)
    }

    /// Boundary radius at the angle of `(nx, ny)`. A cell is inside the
    /// silhouette when its distance from center is at most this value.
    pub fn boundary(&self, noise: &NoiseField, nx: f32, ny: f32) -> f32 {
        let theta = ny.atan2(nx);
        let (sin, cos) = theta.sin_cos();
        let ellipse =
            self.rx * self.ry / ((self.ry * cos).powi(2) + (self.rx * sin).powi(2)).sqrt();

        let lobes = noise.octave_noise(
            cos * 1.5 + self.offset + 31.0,
            sin * 1.5 + self.offset + 31.0,
            2,
            0.5,
        );
        let wobble = 1.0 + lobes * 0.25 * (0.5 + self.turbulence);
        (ellipse * wobble).clamp(0.2, 1.45)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::types::LayerId;

    fn spec(archetype: Archetype, seed: u32) -> CloudFragmentSpec {
        CloudFragmentSpec {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 200.0,
            speed: 10.0,
            alpha: 0.8,
            noise_seed: seed,
            density: 1.0,
            archetype,
            turbulence: 0.7,
            shape_complexity: 0.5,
            edge_softness: 0.6,
            depth: 0.5,
            depth_layer_id: LayerId(0),
            scale: 1.0,
            speed_multiplier: 1.0,
        }
    }

    #[test]
    fn test_density_bounds_all_archetypes() {
        for archetype in Archetype::ALL {
            for seed in [1u32, 42, 777] {
                let s = spec(archetype, seed);
                let params = ShapeParams::generate(&s);
                let noise = NoiseField::new(seed);
                let mut any_positive = false;
                for gy in 0..41 {
                    for gx in 0..41 {
                        let nx = gx as f32 / 20.0 - 1.0;
                        let ny = gy as f32 / 20.0 - 1.0;
                        let d = params.density(&noise, nx, ny);
                        assert!(
                            (0.0..=1.0).contains(&d),
                            "{archetype:?} seed {seed}: density {d} at ({nx}, {ny})"
                        );
                        any_positive |= d > 0.3;
                    }
                }
                assert!(any_positive, "{archetype:?} seed {seed} produced no body");
            }
        }
    }

    #[test]
    fn test_boundary_positive_and_bounded() {
        for archetype in Archetype::ALL {
            let s = spec(archetype, 9);
            let params = ShapeParams::generate(&s);
            let noise = NoiseField::new(9);
            for i in 0..72 {
                let theta = i as f32 * std::f32::consts::TAU / 72.0;
                let b = params.boundary(&noise, theta.cos(), theta.sin());
                assert!((0.2..=1.45).contains(&b), "{archetype:?}: boundary {b}");
            }
        }
    }

    #[test]
    fn test_detail_octaves_follow_complexity() {
        let mut s = spec(Archetype::Puffy, 3);
        s.shape_complexity = 0.0;
        assert_eq!(ShapeParams::generate(&s).detail_octaves(), 1);
        s.shape_complexity = 1.0;
        assert_eq!(ShapeParams::generate(&s).detail_octaves(), 3);
    }

    #[test]
    fn test_scattered_has_gaps() {
        let s = spec(Archetype::Scattered, 5);
        let params = ShapeParams::generate(&s);
        let noise = NoiseField::new(5);
        let mut empty_inside = 0;
        for gy in 0..21 {
            for gx in 0..21 {
                let nx = gx as f32 / 10.0 - 1.0;
                let ny = gy as f32 / 10.0 - 1.0;
                let inside = (nx * nx + ny * ny).sqrt() <= params.boundary(&noise, nx, ny);
                if inside && params.density(&noise, nx, ny) == 0.0 {
                    empty_inside += 1;
                }
            }
        }
        assert!(empty_inside > 0, "scattered clouds should have interior holes");
    }

    #[test]
    fn test_same_seed_same_params() {
        let a = ShapeParams::generate(&spec(Archetype::Dense, 123));
        let b = ShapeParams::generate(&spec(Archetype::Dense, 123));
        let noise = NoiseField::new(123);
        for i in 0..50 {
            let nx = i as f32 / 25.0 - 1.0;
            assert_eq!(
                a.density(&noise, nx, 0.1).to_bits(),
                b.density(&noise, nx, 0.1).to_bits()
            );
        }
    }
}
