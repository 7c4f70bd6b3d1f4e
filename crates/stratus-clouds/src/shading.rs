//! Per-cell shading shared by synthesis and re-shading: shadow factor,
//! brightness, and the descriptor-driven color mapping.

use glam::Vec2;
use stratus_core::constants::{
    BRIGHTNESS_GAIN, BRIGHTNESS_MAX, BRIGHTNESS_MIN, EDGE_HIGHLIGHT_BLEND, EDGE_SHADOW_FLOOR,
    LIT_SIDE_THRESHOLD, NEUTRAL_GRAY, SELF_SHADOW_STRENGTH, SHADOW_BLEND_STRENGTH,
};
use stratus_core::types::{LightingDescriptor, PixelAttributes, Rgb};

/// The subset of cell attributes color mapping reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeInput {
    pub density: f32,
    pub is_edge: bool,
    pub edge_distance: f32,
    pub shadow_factor: f32,
    pub brightness: f32,
}

impl From<&PixelAttributes> for ShadeInput {
    fn from(p: &PixelAttributes) -> Self {
        Self {
            density: p.density,
            is_edge: p.is_edge,
            edge_distance: p.edge_distance,
            shadow_factor: p.shadow_factor,
            brightness: p.brightness,
        }
    }
}

impl ShadeInput {
    fn is_finite(&self) -> bool {
        self.density.is_finite()
            && self.edge_distance.is_finite()
            && self.shadow_factor.is_finite()
            && self.brightness.is_finite()
    }
}

/// Lighting of a cell at normalized position `(nx, ny)`: 1 on the side
/// facing the sun, 0 on the far side.
///
/// The dot product is rescaled as `(1 - dot) / 2`, not `(dot + 1) / 2`:
/// `light_direction` points from the sun toward the scene, so the sun-facing
/// side is where the position opposes it.
pub fn shadow_factor(nx: f32, ny: f32, density: f32, is_edge: bool, light_direction: Vec2) -> f32 {
    let facing = Vec2::new(nx, ny).dot(light_direction).clamp(-1.0, 1.0);
    let lit = (1.0 - facing) * 0.5;
    let shadow = lit * (1.0 - density.clamp(0.0, 1.0) * SELF_SHADOW_STRENGTH);
    let shadow = if is_edge {
        shadow.max(EDGE_SHADOW_FLOOR)
    } else {
        shadow
    };
    shadow.clamp(0.0, 1.0)
}

/// Cell brightness in [BRIGHTNESS_MIN, BRIGHTNESS_MAX]. Denser, closer and
/// better-lit cells are brighter; `texture` adds up to ±10% grain.
pub fn brightness(density: f32, texture: f32, depth: f32, shadow: f32) -> f32 {
    let mut b = 0.55 + 0.35 * density.clamp(0.0, 1.0);
    b *= 1.0 + 0.1 * texture.clamp(-1.0, 1.0);
    b *= 0.85 + 0.15 * depth.clamp(0.0, 1.0);
    b *= 0.85 + 0.15 * shadow.clamp(0.0, 1.0);
    b.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX)
}

/// Grayscale used before lighting is available.
pub fn grayscale(brightness: f32) -> Rgb {
    Rgb::gray((brightness.clamp(0.0, 1.0) * 255.0).floor() as u8)
}

/// Map a cell to an RGB color. `None` when the inputs are not finite; callers
/// substitute [`neutral_color`].
pub fn map_color(input: &ShadeInput, descriptor: Option<&LightingDescriptor>) -> Option<Rgb> {
    if !input.is_finite() {
        return None;
    }
    let Some(desc) = descriptor else {
        return Some(grayscale(input.brightness));
    };

    let base = desc.cloud_base_color;
    let brightness = input.brightness.clamp(0.0, 1.0);
    let tinted = if input.is_edge {
        // Outermost edge cells take the full pull; inner edge cells less.
        let t = brightness * EDGE_HIGHLIGHT_BLEND * (1.0 - 0.5 * input.edge_distance.clamp(0.0, 1.0));
        base.lerp(desc.cloud_highlight_color, t)
    } else if input.shadow_factor > LIT_SIDE_THRESHOLD {
        let t = (input.shadow_factor - LIT_SIDE_THRESHOLD) / (1.0 - LIT_SIDE_THRESHOLD);
        base.lerp(desc.cloud_highlight_color, t)
    } else {
        let t = (LIT_SIDE_THRESHOLD - input.shadow_factor) / LIT_SIDE_THRESHOLD;
        base.lerp(desc.cloud_shadow_color, t * SHADOW_BLEND_STRENGTH)
    };

    let gain = brightness * BRIGHTNESS_GAIN;
    let [r, g, b] = tinted.to_unit();
    Some(Rgb::from_unit([
        (r * gain).min(1.0),
        (g * gain).min(1.0),
        (b * gain).min(1.0),
    ]))
}

pub fn neutral_color() -> Rgb {
    Rgb::gray(NEUTRAL_GRAY)
}

/// Packed color for a cell, falling back to neutral gray.
pub fn packed_color(input: &ShadeInput, descriptor: Option<&LightingDescriptor>) -> u32 {
    map_color(input, descriptor)
        .unwrap_or_else(neutral_color)
        .pack()
}
