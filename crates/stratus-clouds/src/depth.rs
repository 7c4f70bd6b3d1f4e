//! Depth-layer partitioning.
//!
//! Divides the configured vertical band into one slice per layer. Layer 0
//! is furthest back and sits at the top of the band; the last layer is at
//! the front, nearest the bottom of the viewport.

use std::collections::BTreeMap;

use stratus_core::config::LayerConfig;
use stratus_core::rng::HashRng;
use stratus_core::types::{DepthLayerConfig, LayerId, ValueRange};

pub type DepthLayerMap = BTreeMap<LayerId, DepthLayerConfig>;

/// Slice multiples by which the full range extends past the constrained one.
const FULL_RANGE_SPILL: f32 = 1.5;

/// Relative spread of the scale range around its midpoint.
const SCALE_SPREAD: f32 = 0.15;

pub fn partition_depth_layers(layer_count: u32, settings: &LayerConfig) -> DepthLayerMap {
    let mut layers = DepthLayerMap::new();
    if layer_count == 0 {
        return layers;
    }

    let band_start = settings.band_start.min(settings.band_end);
    let band_end = settings.band_start.max(settings.band_end);
    let slice = (band_end - band_start) / layer_count as f32;
    let pad = slice * settings.overlap.max(0.0) * 0.5;

    for i in 0..layer_count {
        let depth = if layer_count == 1 {
            1.0
        } else {
            i as f32 / (layer_count - 1) as f32
        };

        let top = band_start + slice * i as f32;
        let bottom = top + slice;

        let constrained = ValueRange::new((top - pad).max(0.0), (bottom + pad).min(1.0));
        let spill = slice * FULL_RANGE_SPILL;
        let full = ValueRange::new((top - spill).max(0.0), (bottom + spill).min(1.0));

        let scale_mid = 1.4 - 0.8 * depth;
        let scale_range =
            ValueRange::new(scale_mid * (1.0 - SCALE_SPREAD), scale_mid * (1.0 + SCALE_SPREAD));
        let alpha_range = ValueRange::new(0.45 + 0.35 * depth, (0.65 + 0.35 * depth).min(1.0));

        layers.insert(
            LayerId(i),
            DepthLayerConfig {
                depth,
                speed_multiplier: 0.4 + 1.2 * depth,
                scale_range,
                alpha_range,
                vertical_range: full,
                constrained_vertical_range: constrained,
                constrained_fraction: settings.constrained_fraction.clamp(0.0, 1.0),
            },
        );
    }

    log::debug!(
        "Partitioned {} depth layers over band {:.2}..{:.2}",
        layer_count,
        band_start,
        band_end
    );
    layers
}

/// Draw a normalized vertical position for a new fragment in `layer`.
/// Most draws land in the constrained range; the rest use the full range.
pub fn sample_vertical(layer: &DepthLayerConfig, rng: &mut HashRng) -> f32 {
    let range = if rng.chance(layer.constrained_fraction) {
        layer.constrained_vertical_range
    } else {
        layer.vertical_range
    };
    range.at(rng.next_f32())
}
