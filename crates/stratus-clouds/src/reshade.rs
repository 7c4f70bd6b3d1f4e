//! Re-shading over existing cell attributes. Geometry is never regenerated.
//!
//! Both operations keep output index-aligned with the input: an entry that
//! fails validation keeps its attributes untouched and gets the neutral gray
//! color, with one warning per batch.

use serde::{Deserialize, Serialize};
use stratus_core::types::{CloudFragmentSpec, LightingDescriptor, PixelAttributes};

use crate::shading::{brightness, neutral_color, packed_color, shadow_factor, ShadeInput};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReshadeOutput {
    pub colors: Vec<u32>,
    pub updated: Vec<PixelAttributes>,
}

/// Recolor using each cell's stored shadow factor and brightness.
pub fn recompute_colors(
    pixels: &[PixelAttributes],
    descriptor: Option<&LightingDescriptor>,
) -> Vec<u32> {
    let mut skipped = 0usize;
    let colors = pixels
        .iter()
        .map(|p| {
            if p.is_valid() {
                packed_color(&ShadeInput::from(p), descriptor)
            } else {
                skipped += 1;
                neutral_color().pack()
            }
        })
        .collect();

    if skipped > 0 {
        log::warn!(
            "Color recompute skipped {} of {} malformed cells",
            skipped,
            pixels.len()
        );
    }
    colors
}

/// Recompute shadow factor against the descriptor's light direction, then
/// brightness, then color.
pub fn recompute_colors_and_shadows(
    pixels: &[PixelAttributes],
    descriptor: Option<&LightingDescriptor>,
    spec: &CloudFragmentSpec,
) -> ReshadeOutput {
    if pixels.is_empty() {
        return ReshadeOutput::default();
    }

    let light_direction = descriptor.map_or(glam::Vec2::ZERO, |d| d.light_direction);
    let mut output = ReshadeOutput {
        colors: Vec::with_capacity(pixels.len()),
        updated: Vec::with_capacity(pixels.len()),
    };
    let mut skipped = 0usize;

    for p in pixels {
        if !p.is_valid() {
            skipped += 1;
            output.colors.push(neutral_color().pack());
            output.updated.push(p.clone());
            continue;
        }

        let mut cell = p.clone();
        cell.shadow_factor = shadow_factor(
            cell.normalized_x,
            cell.normalized_y,
            cell.density,
            cell.is_edge,
            light_direction,
        );
        cell.brightness = brightness(cell.density, cell.texture, spec.depth, cell.shadow_factor);
        cell.color = packed_color(&ShadeInput::from(&cell), descriptor);

        output.colors.push(cell.color);
        output.updated.push(cell);
    }

    if skipped > 0 {
        log::warn!(
            "Shadow recompute skipped {} of {} malformed cells",
            skipped,
            pixels.len()
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{fragment_spec, synthesize_pixels, SynthesisSettings};
    use glam::Vec2;
    use stratus_core::types::{Archetype, GradientKind, Rgb};

    fn daytime() -> LightingDescriptor {
        LightingDescriptor {
            gradient_colors: vec![Rgb::new(70, 130, 220), Rgb::new(160, 205, 245)],
            sun_color: Rgb::new(255, 250, 235),
            cloud_base_color: Rgb::new(240, 242, 248),
            cloud_highlight_color: Rgb::WHITE,
            cloud_shadow_color: Rgb::new(160, 170, 195),
            sun_viewport_position: Vec2::new(0.5, 1.5),
            light_direction: Vec2::new(0.0, -1.0),
            gradient_kind: GradientKind::Radial,
            radial_center: Some(Vec2::new(0.5, 1.5)),
            radial_radius: Some(2000.0),
        }
    }

    fn sunset() -> LightingDescriptor {
        LightingDescriptor {
            gradient_colors: vec![Rgb::new(60, 50, 110), Rgb::new(240, 120, 60)],
            sun_color: Rgb::new(255, 120, 40),
            cloud_base_color: Rgb::new(230, 150, 120),
            cloud_highlight_color: Rgb::new(255, 200, 140),
            cloud_shadow_color: Rgb::new(90, 60, 100),
            sun_viewport_position: Vec2::new(-0.5, 0.45),
            light_direction: Vec2::new(0.9, -0.2),
            gradient_kind: GradientKind::Radial,
            radial_center: Some(Vec2::new(-0.5, 0.45)),
            radial_radius: Some(2000.0),
        }
    }

    #[test]
    fn test_recompute_colors_reproduces_synthesis() {
        let desc = daytime();
        let spec = fragment_spec(Archetype::Puffy, 42, 600.0, 300.0);
        let pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), Some(&desc));
        assert!(!pixels.is_empty());

        let colors = recompute_colors(&pixels, Some(&desc));
        let original: Vec<u32> = pixels.iter().map(|p| p.color).collect();
        assert_eq!(colors, original);
    }

    #[test]
    fn test_shadow_recompute_reproduces_synthesis() {
        let desc = daytime();
        let spec = fragment_spec(Archetype::Dense, 12, 400.0, 240.0);
        let pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), Some(&desc));
        let out = recompute_colors_and_shadows(&pixels, Some(&desc), &spec);
        assert_eq!(out.updated, pixels);
    }

    #[test]
    fn test_light_direction_change_moves_shadows() {
        let a = daytime();
        let b = sunset();
        let spec = fragment_spec(Archetype::Puffy, 42, 600.0, 300.0);
        let pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), Some(&a));

        let first = recompute_colors_and_shadows(&pixels, Some(&a), &spec);
        let second = recompute_colors_and_shadows(&first.updated, Some(&b), &spec);
        let moved = first
            .updated
            .iter()
            .zip(&second.updated)
            .any(|(x, y)| (x.shadow_factor - y.shadow_factor).abs() > 1e-3);
        assert!(moved, "shadow factors should follow the light direction");
        assert_eq!(second.colors.len(), pixels.len());
    }

    #[test]
    fn test_empty_input_returns_empty() {
        assert!(recompute_colors(&[], Some(&daytime())).is_empty());
        let spec = fragment_spec(Archetype::Wispy, 1, 100.0, 50.0);
        let out = recompute_colors_and_shadows(&[], None, &spec);
        assert!(out.colors.is_empty() && out.updated.is_empty());
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let spec = fragment_spec(Archetype::Dense, 4, 200.0, 120.0);
        let mut pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), None);
        assert!(pixels.len() >= 2);
        pixels[0].brightness = f32::NAN;

        let colors = recompute_colors(&pixels, Some(&daytime()));
        assert_eq!(colors.len(), pixels.len());
        assert_eq!(colors[0], neutral_color().pack());

        let out = recompute_colors_and_shadows(&pixels, Some(&daytime()), &spec);
        assert_eq!(out.updated.len(), pixels.len());
        assert!(out.updated[0].brightness.is_nan());
        assert!(out.updated[1].is_valid());
    }
}
