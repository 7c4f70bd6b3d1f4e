//! Cloud shape synthesis: fragment spec creation and the per-cell
//! attribute pass over a capped grid.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stratus_core::config::{CloudConfig, LayerConfig};
use stratus_core::constants::{
    DEFAULT_PIXEL_SIZE, DENSITY_CACHE_SCALE, DENSITY_THRESHOLD, EDGE_DELTA_THRESHOLD,
    EDGE_LOW_DENSITY,
};
use stratus_core::math::smoothstep;
use stratus_core::rng::HashRng;
use stratus_core::types::{
    Archetype, CloudFragmentSpec, DepthLayerConfig, LayerId, LightingDescriptor, PixelAttributes,
    ValueRange,
};

use crate::archetype::ShapeParams;
use crate::depth::{partition_depth_layers, sample_vertical};
use crate::noise::NoiseField;
use crate::shading::{brightness, packed_color, shadow_factor, ShadeInput};

/// Seed mix separating texture noise from shape noise.
const TEXTURE_SEED_MIX: u32 = 0x5BD1_E995;

/// Synthesis knobs carried with each request so workers hold no config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    pub pixel_size: f32,
    pub max_grid: u32,
    pub density_threshold: f32,
    pub base_speed: f32,
    pub size_multiplier: f32,
    pub base_width: ValueRange,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self::from(&CloudConfig::default())
    }
}

impl From<&CloudConfig> for SynthesisSettings {
    fn from(config: &CloudConfig) -> Self {
        Self {
            pixel_size: config.pixel_size,
            max_grid: config.max_grid,
            density_threshold: config.density_threshold,
            base_speed: config.base_speed,
            size_multiplier: config.size_multiplier,
            base_width: config.base_width,
        }
    }
}

/// Everything needed to create one fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentRequest {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Target layer; `None` places the fragment in a single front layer.
    pub layer: Option<(LayerId, DepthLayerConfig)>,
    /// Spawn x in screen pixels; `None` draws a random on-screen x.
    pub spawn_x: Option<f32>,
    pub seed: u32,
    pub settings: SynthesisSettings,
}

/// A fragment spec with its synthesized cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudData {
    pub spec: CloudFragmentSpec,
    pub pixels: Vec<PixelAttributes>,
}

/// Grid resolution and effective cell size for a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub pixel_size: f32,
}

impl GridLayout {
    /// Natural grid is `ceil(size / pixel_size)`. When that exceeds `max_grid`
    /// the cell size grows until the cap holds.
    pub fn for_size(width: f32, height: f32, pixel_size: f32, max_grid: u32) -> Self {
        let max_grid = max_grid.max(1);
        let width = width.max(1.0);
        let height = height.max(1.0);
        let requested = if pixel_size > 0.0 {
            pixel_size
        } else {
            DEFAULT_PIXEL_SIZE
        };
        let cap = max_grid as f32;
        let pixel_size = requested.max(width / cap).max(height / cap);

        let dim = |extent: f32| ((extent / pixel_size).ceil() as u32).clamp(1, max_grid);
        Self {
            cols: dim(width),
            rows: dim(height),
            pixel_size,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Counters from one synthesis pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SynthesisStats {
    pub cells: usize,
    pub retained: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// Density lookups memoized per rounded coordinate for one synthesis call.
struct DensitySampler<'a> {
    params: &'a ShapeParams,
    noise: &'a NoiseField,
    scale: f32,
    cache: HashMap<(i32, i32), f32>,
    hits: usize,
    misses: usize,
}

impl<'a> DensitySampler<'a> {
    fn new(params: &'a ShapeParams, noise: &'a NoiseField, scale: f32, capacity: usize) -> Self {
        Self {
            params,
            noise,
            scale,
            cache: HashMap::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    fn sample(&mut self, nx: f32, ny: f32) -> f32 {
        let key = (
            (nx * DENSITY_CACHE_SCALE).round() as i32,
            (ny * DENSITY_CACHE_SCALE).round() as i32,
        );
        if let Some(&d) = self.cache.get(&key) {
            self.hits += 1;
            return d;
        }
        self.misses += 1;
        let d = self.params.density(self.noise, nx, ny) * self.scale;
        self.cache.insert(key, d);
        d
    }
}

/// Draw a fragment spec for `request`.
pub fn create_fragment_spec(request: &FragmentRequest) -> CloudFragmentSpec {
    let (layer_id, layer) = match &request.layer {
        Some((id, layer)) => (*id, layer.clone()),
        None => default_layer(),
    };
    let settings = &request.settings;
    let mut rng = HashRng::new(request.seed);

    let archetype = Archetype::ALL[rng.range_u32(0, Archetype::ALL.len() as u32 - 1) as usize];
    let scale = layer.scale_range.at(rng.next_f32());
    let width = settings.base_width.at(rng.next_f32()) * scale * settings.size_multiplier;
    let height = width * archetype.aspect() * rng.range(0.85, 1.15);

    let x = match request.spawn_x {
        Some(x) => x,
        None => rng.range(0.0, request.screen_width.max(1.0)),
    };
    let y = sample_vertical(&layer, &mut rng) * request.screen_height;

    let speed = settings.base_speed * layer.speed_multiplier * rng.range(0.8, 1.2);
    let alpha = layer.alpha_range.at(rng.next_f32());
    let density = match archetype {
        Archetype::Wispy => rng.range(0.55, 0.8),
        Archetype::Puffy => rng.range(0.75, 1.0),
        Archetype::Dense => rng.range(0.85, 1.0),
        Archetype::Scattered => rng.range(0.6, 0.9),
    };

    CloudFragmentSpec {
        x,
        y,
        width,
        height,
        speed,
        alpha,
        noise_seed: rng.next_u32(),
        density,
        archetype,
        turbulence: rng.range(0.3, 1.0),
        shape_complexity: rng.next_f32(),
        edge_softness: rng.range(0.3, 1.0),
        depth: layer.depth,
        depth_layer_id: layer_id,
        scale,
        speed_multiplier: layer.speed_multiplier,
    }
}

fn default_layer() -> (LayerId, DepthLayerConfig) {
    partition_depth_layers(1, &LayerConfig::default())
        .into_iter()
        .next()
        .unwrap_or_else(|| {
            (
                LayerId(0),
                DepthLayerConfig {
                    depth: 1.0,
                    speed_multiplier: 1.6,
                    scale_range: ValueRange::new(0.5, 0.7),
                    alpha_range: ValueRange::new(0.8, 1.0),
                    vertical_range: ValueRange::new(0.5, 1.0),
                    constrained_vertical_range: ValueRange::new(0.5, 1.0),
                    constrained_fraction: 1.0,
                },
            )
        })
}

/// Synthesize every retained cell of `spec`.
pub fn synthesize_pixels(
    spec: &CloudFragmentSpec,
    settings: &SynthesisSettings,
    descriptor: Option<&LightingDescriptor>,
) -> Vec<PixelAttributes> {
    synthesize_with_stats(spec, settings, descriptor).0
}

pub fn synthesize_with_stats(
    spec: &CloudFragmentSpec,
    settings: &SynthesisSettings,
    descriptor: Option<&LightingDescriptor>,
) -> (Vec<PixelAttributes>, SynthesisStats) {
    let grid = GridLayout::for_size(spec.width, spec.height, settings.pixel_size, settings.max_grid);
    let threshold = if settings.density_threshold.is_finite() {
        settings.density_threshold.clamp(0.0, 1.0)
    } else {
        DENSITY_THRESHOLD
    };

    let noise = NoiseField::new(spec.noise_seed);
    let texture_noise = NoiseField::new(spec.noise_seed ^ TEXTURE_SEED_MIX);
    let params = ShapeParams::generate(spec);
    let mut sampler =
        DensitySampler::new(&params, &noise, spec.density.clamp(0.0, 1.0), grid.cell_count() * 2);

    let light_direction = descriptor.map_or(Vec2::ZERO, |d| d.light_direction);
    let softness = (spec.edge_softness * 0.35).max(0.05);
    let step = 2.0 / grid.cols as f32;
    let half_w = spec.width * 0.5;
    let half_h = spec.height * 0.5;

    let mut pixels = Vec::new();
    let mut stats = SynthesisStats {
        cells: grid.cell_count(),
        ..SynthesisStats::default()
    };

    for gy in 0..grid.rows {
        let ny = (gy as f32 + 0.5) / grid.rows as f32 * 2.0 - 1.0;
        for gx in 0..grid.cols {
            let nx = (gx as f32 + 0.5) / grid.cols as f32 * 2.0 - 1.0;

            let dist = (nx * nx + ny * ny).sqrt();
            let boundary = params.boundary(&noise, nx, ny);
            if dist > boundary {
                continue;
            }

            let density = sampler.sample(nx, ny);
            if density <= threshold {
                continue;
            }

            let neighbors = (sampler.sample(nx + step, ny)
                + sampler.sample(nx - step, ny)
                + sampler.sample(nx, ny + step)
                + sampler.sample(nx, ny - step))
                * 0.25;
            let is_edge = (density - neighbors).abs() > EDGE_DELTA_THRESHOLD
                || density < EDGE_LOW_DENSITY;
            let edge_distance = (1.0 - dist / boundary).clamp(0.0, 1.0);

            let texture = texture_noise.octave_noise(nx * 4.0, ny * 4.0, 2, 0.5);
            let shadow = shadow_factor(nx, ny, density, is_edge, light_direction);
            let bright = brightness(density, texture, spec.depth, shadow);

            let edge_fade = if is_edge {
                0.4 + 0.6 * smoothstep(0.0, softness, edge_distance)
            } else {
                1.0
            };
            let alpha = (density.sqrt() * edge_fade * spec.alpha).clamp(0.0, 1.0);

            let color = packed_color(
                &ShadeInput {
                    density,
                    is_edge,
                    edge_distance,
                    shadow_factor: shadow,
                    brightness: bright,
                },
                descriptor,
            );

            pixels.push(PixelAttributes {
                normalized_x: nx,
                normalized_y: ny,
                density,
                is_edge,
                edge_distance,
                shadow_factor: shadow,
                brightness: bright,
                alpha,
                color,
                pixel_x: gx as f32 * grid.pixel_size - half_w,
                pixel_y: gy as f32 * grid.pixel_size - half_h,
                pixel_size: grid.pixel_size,
                depth: spec.depth,
                texture,
            });
        }
    }

    stats.retained = pixels.len();
    stats.cache_hits = sampler.hits;
    stats.cache_misses = sampler.misses;
    log::trace!(
        "Synthesized {:?} cloud {}x{} grid: {} of {} cells kept, cache {}/{}",
        spec.archetype,
        grid.cols,
        grid.rows,
        stats.retained,
        stats.cells,
        stats.cache_hits,
        stats.cache_hits + stats.cache_misses
    );
    (pixels, stats)
}

/// Create a fragment spec and synthesize its cells in one call.
pub fn generate_full_cloud_data(
    request: &FragmentRequest,
    descriptor: Option<&LightingDescriptor>,
) -> CloudData {
    let spec = create_fragment_spec(request);
    let pixels = synthesize_pixels(&spec, &request.settings, descriptor);
    CloudData { spec, pixels }
}

impl FragmentRequest {
    pub fn new(screen_width: f32, screen_height: f32, seed: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            layer: None,
            spawn_x: None,
            seed,
            settings: SynthesisSettings::default(),
        }
    }
}

/// Spec defaults for callers building fragments by hand.
pub fn fragment_spec(archetype: Archetype, seed: u32, width: f32, height: f32) -> CloudFragmentSpec {
    CloudFragmentSpec {
        x: 0.0,
        y: 0.0,
        width,
        height,
        speed: 0.0,
        alpha: 1.0,
        noise_seed: seed,
        density: 1.0,
        archetype,
        turbulence: 0.6,
        shape_complexity: 0.5,
        edge_softness: 0.6,
        depth: 1.0,
        depth_layer_id: LayerId(0),
        scale: 1.0,
        speed_multiplier: 1.0,
    }
}
