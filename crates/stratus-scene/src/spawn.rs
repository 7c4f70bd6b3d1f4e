//! Spawn placement: how many fragments each layer wants and where new ones
//! enter. Fragments drift left, so off-screen placements sit to the right.

use stratus_clouds::depth::DepthLayerMap;
use stratus_core::config::CloudConfig;
use stratus_core::rng::HashRng;
use stratus_core::types::LayerId;

/// Share of the configured count kept by the furthest layer.
const BACK_LAYER_SHARE: f32 = 0.3;

/// Chance that an off-screen fragment clusters tightly with the previous one.
const CLUSTER_CHANCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub layer: LayerId,
    /// Fragment center x in screen pixels.
    pub spawn_x: f32,
}

/// Target population for a layer at `depth`: the full count at the front,
/// down to 30% at the back.
pub fn layer_target(cloud_count: u32, depth: f32) -> usize {
    if cloud_count == 0 {
        return 0;
    }
    let share = BACK_LAYER_SHARE + (1.0 - BACK_LAYER_SHARE) * depth.clamp(0.0, 1.0);
    ((cloud_count as f32 * share).round() as usize).max(1)
}

/// Initial placements for every layer: an on-screen share spread evenly
/// across the width, the rest staggered off the right edge.
pub fn initial_placements(
    layers: &DepthLayerMap,
    config: &CloudConfig,
    screen_width: f32,
    rng: &mut HashRng,
) -> Vec<Placement> {
    let screen_width = screen_width.max(1.0);
    let mut placements = Vec::new();

    for (&layer, layer_config) in layers {
        let target = layer_target(config.cloud_count, layer_config.depth);
        let on_screen = ((target as f32 * config.onscreen_fraction.clamp(0.0, 1.0)).round()
            as usize)
            .min(target);

        if on_screen > 0 {
            let spacing = screen_width / on_screen as f32;
            for i in 0..on_screen {
                let jitter = rng.range(-0.25, 0.25) * spacing;
                placements.push(Placement {
                    layer,
                    spawn_x: (i as f32 + 0.5) * spacing + jitter,
                });
            }
        }

        let off_screen = target - on_screen;
        let spacing = screen_width / target.max(1) as f32;
        let mut cursor = screen_width + config.offscreen_margin * 0.25;
        for _ in 0..off_screen {
            let mut gap = spacing * rng.range(0.5, 1.6);
            if rng.chance(CLUSTER_CHANCE) {
                gap *= 0.35;
            }
            cursor += gap;
            placements.push(Placement {
                layer,
                spawn_x: cursor,
            });
        }
    }

    placements
}

/// Entry x for a replacement fragment, just past the right edge.
pub fn replacement_x(screen_width: f32, margin: f32, rng: &mut HashRng) -> f32 {
    screen_width.max(1.0) + margin.max(0.0) * rng.range(0.2, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_clouds::depth::partition_depth_layers;
    use stratus_core::config::LayerConfig;

    #[test]
    fn test_layer_target_scales_with_depth() {
        assert_eq!(layer_target(10, 1.0), 10);
        assert_eq!(layer_target(10, 0.0), 3);
        assert_eq!(layer_target(10, 0.6), 7);
        assert_eq!(layer_target(1, 0.0), 1);
        assert_eq!(layer_target(0, 1.0), 0);
    }

    #[test]
    fn test_initial_placements_counts() {
        let layers = partition_depth_layers(4, &LayerConfig::default());
        let config = CloudConfig::default();
        let mut rng = HashRng::new(1);
        let placements = initial_placements(&layers, &config, 1280.0, &mut rng);

        for (&id, layer) in &layers {
            let count = placements.iter().filter(|p| p.layer == id).count();
            assert_eq!(count, layer_target(config.cloud_count, layer.depth));
        }
    }

    #[test]
    fn test_on_and_off_screen_mix() {
        let layers = partition_depth_layers(1, &LayerConfig::default());
        let config = CloudConfig {
            cloud_count: 10,
            onscreen_fraction: 0.6,
            ..CloudConfig::default()
        };
        let mut rng = HashRng::new(3);
        let placements = initial_placements(&layers, &config, 1000.0, &mut rng);
        let on: Vec<f32> = placements
            .iter()
            .map(|p| p.spawn_x)
            .filter(|&x| x < 1000.0)
            .collect();
        let off = placements.len() - on.len();
        assert_eq!(on.len(), 6);
        assert_eq!(off, 4);
        assert!(on.iter().all(|&x| x >= 0.0));

        let mut off_xs: Vec<f32> = placements
            .iter()
            .map(|p| p.spawn_x)
            .filter(|&x| x >= 1000.0)
            .collect();
        let sorted = {
            let mut s = off_xs.clone();
            s.sort_by(f32::total_cmp);
            s
        };
        assert_eq!(off_xs, sorted, "off-screen placements are staggered outward");
        off_xs.dedup();
        assert_eq!(off_xs.len(), 4);
    }

    #[test]
    fn test_replacement_enters_from_right() {
        let mut rng = HashRng::new(9);
        for _ in 0..50 {
            let x = replacement_x(800.0, 200.0, &mut rng);
            assert!((840.0..=1000.0).contains(&x), "x {x}");
        }
    }
}
