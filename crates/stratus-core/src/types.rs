use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Pack into a 24-bit `0xRRGGBB` integer.
    pub fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Unpack from `0xRRGGBB`. Bits above 24 are ignored.
    pub fn unpack(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    /// Channel-wise interpolation. Rounded results stay within the
    /// per-channel [min, max] of the two inputs for `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let v = a as f32 + (b as f32 - a as f32) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    /// Channels as floats in [0, 1].
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Build from unit floats, clamping each channel to [0, 1].
    pub fn from_unit(c: [f32; 3]) -> Rgb {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb::new(q(c[0]), q(c[1]), q(c[2]))
    }
}

/// Colors for one time phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Sky gradient stops, top to bottom (3 to 6 entries).
    pub gradient: Vec<Rgb>,
    pub sun: Rgb,
    pub cloud_base: Rgb,
    pub cloud_highlight: Rgb,
    pub cloud_shadow: Rgb,
}

/// Sky gradient topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientKind {
    /// Top-to-bottom bands.
    Linear,
    /// Concentric bands around the sun's viewport position.
    Radial,
}

/// Immutable lighting snapshot produced by the sky model on each refresh.
/// Compared by value to detect a meaningful change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingDescriptor {
    pub gradient_colors: Vec<Rgb>,
    pub sun_color: Rgb,
    pub cloud_base_color: Rgb,
    pub cloud_highlight_color: Rgb,
    pub cloud_shadow_color: Rgb,
    /// Normalized viewport units; may lie outside [0, 1] (off-screen sun).
    pub sun_viewport_position: Vec2,
    /// Unit vector from the sun toward the viewport center, or zero.
    pub light_direction: Vec2,
    pub gradient_kind: GradientKind,
    /// Normalized radial center (only for `GradientKind::Radial`).
    pub radial_center: Option<Vec2>,
    /// Radial radius in screen pixels (only for `GradientKind::Radial`).
    pub radial_radius: Option<f32>,
}

/// Cloud shape archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Horizontally stretched tendrils.
    Wispy,
    /// Union of rounded masses.
    Puffy,
    /// Large radial body with bulges.
    Dense,
    /// Many small hard-edged patches with gaps.
    Scattered,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Wispy,
        Archetype::Puffy,
        Archetype::Dense,
        Archetype::Scattered,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Wispy => "wispy",
            Archetype::Puffy => "puffy",
            Archetype::Dense => "dense",
            Archetype::Scattered => "scattered",
        }
    }

    /// Height as a fraction of width.
    pub fn aspect(self) -> f32 {
        match self {
            Archetype::Wispy => 0.35,
            Archetype::Puffy => 0.55,
            Archetype::Dense => 0.6,
            Archetype::Scattered => 0.5,
        }
    }
}

/// Depth-layer key. Layer 0 is furthest back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct LayerId(pub u32);

/// Closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn mid(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Point at fraction `t` between min and max.
    pub fn at(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Parameters for one depth band. Back layers (depth ≈ 0) are larger,
/// slower and dimmer; front layers (depth ≈ 1) smaller, faster, more opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLayerConfig {
    pub depth: f32,
    pub speed_multiplier: f32,
    pub scale_range: ValueRange,
    pub alpha_range: ValueRange,
    /// Wide vertical range (normalized, top-down) a minority may use.
    pub vertical_range: ValueRange,
    /// Narrow vertical range most fragments are confined to.
    pub constrained_vertical_range: ValueRange,
    /// Probability that a fragment is placed in the constrained range.
    pub constrained_fraction: f32,
}

/// Per-fragment shape and motion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFragmentSpec {
    /// Center x in screen pixels.
    pub x: f32,
    /// Center y in screen pixels.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Drift speed in pixels per second (leftward).
    pub speed: f32,
    pub alpha: f32,
    pub noise_seed: u32,
    /// Overall density multiplier in [0, 1].
    pub density: f32,
    pub archetype: Archetype,
    pub turbulence: f32,
    pub shape_complexity: f32,
    pub edge_softness: f32,
    /// 0 = back, 1 = front.
    pub depth: f32,
    pub depth_layer_id: LayerId,
    pub scale: f32,
    pub speed_multiplier: f32,
}

/// Geometric and shading attributes for one retained grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelAttributes {
    /// Cell center in [-1, 1].
    pub normalized_x: f32,
    pub normalized_y: f32,
    pub density: f32,
    pub is_edge: bool,
    /// 0 at the silhouette, 1 at the center.
    pub edge_distance: f32,
    /// 1 = fully lit, 0 = fully shadowed.
    pub shadow_factor: f32,
    pub brightness: f32,
    pub alpha: f32,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    /// Cell offset from the fragment center, in screen pixels.
    pub pixel_x: f32,
    pub pixel_y: f32,
    pub pixel_size: f32,
    pub depth: f32,
    /// Texture-noise sample in [-1, 1] used for brightness modulation.
    pub texture: f32,
}

impl PixelAttributes {
    /// Structural sanity check for attributes that crossed the worker boundary.
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.normalized_x,
            self.normalized_y,
            self.density,
            self.edge_distance,
            self.shadow_factor,
            self.brightness,
            self.alpha,
            self.pixel_x,
            self.pixel_y,
            self.pixel_size,
            self.depth,
            self.texture,
        ]
        .iter()
        .all(|v| v.is_finite());

        finite && self.pixel_size > 0.0 && (0.0..=1.0).contains(&self.density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_pack_unpack() {
        let c = Rgb::new(0x12, 0xAB, 0xFE);
        assert_eq!(c.pack(), 0x12ABFE);
        assert_eq!(Rgb::unpack(0x12ABFE), c);
        assert_eq!(Rgb::unpack(0xFF12ABFE), c); // alpha byte ignored
    }

    #[test]
    fn test_rgb_lerp_stays_in_channel_bounds() {
        let a = Rgb::new(10, 200, 90);
        let b = Rgb::new(250, 20, 91);
        for i in 0..=20 {
            let c = a.lerp(b, i as f32 / 20.0);
            assert!(c.r >= 10 && c.r <= 250);
            assert!(c.g >= 20 && c.g <= 200);
            assert!(c.b >= 90 && c.b <= 91);
        }
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_value_range() {
        let r = ValueRange::new(0.5, 1.5);
        assert_eq!(r.mid(), 1.0);
        assert_eq!(r.at(0.25), 0.75);
        assert!(r.contains(1.5));
        assert!(!r.contains(1.6));
    }

    #[test]
    fn test_archetype_names_unique() {
        let names: std::collections::HashSet<_> = Archetype::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names.len(), 4);
    }
}
