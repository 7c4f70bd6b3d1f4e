//! Sky backdrop bands handed to the renderer.
//! Linear backdrops run top to bottom through the descriptor's stops.
//! Radial backdrops run outward from the sun, starting at the horizon-most
//! stop so the glow around the sun carries the warmest color.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stratus_core::types::{GradientKind, LightingDescriptor, Rgb};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position along the gradient in [0, 1].
    pub offset: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackdropShape {
    Linear,
    Radial { center_px: Vec2, radius_px: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyBackdrop {
    pub shape: BackdropShape,
    pub stops: Vec<ColorStop>,
}

impl SkyBackdrop {
    pub fn from_descriptor(
        desc: &LightingDescriptor,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Self {
        let viewport = Vec2::new(viewport_width, viewport_height);
        let (shape, colors): (BackdropShape, Vec<Rgb>) = match desc.gradient_kind {
            GradientKind::Linear => (BackdropShape::Linear, desc.gradient_colors.clone()),
            GradientKind::Radial => {
                let center = desc.radial_center.unwrap_or(desc.sun_viewport_position);
                let radius = desc
                    .radial_radius
                    .unwrap_or(2.5 * viewport_width.max(viewport_height));
                let shape = BackdropShape::Radial {
                    center_px: center * viewport,
                    radius_px: radius,
                };
                (shape, desc.gradient_colors.iter().rev().copied().collect())
            }
        };

        let n = colors.len();
        let stops = colors
            .into_iter()
            .enumerate()
            .map(|(i, color)| ColorStop {
                offset: if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 },
                color,
            })
            .collect();

        Self { shape, stops }
    }

    /// Color at a gradient offset, interpolating between neighboring stops.
    pub fn color_at(&self, offset: f32) -> Rgb {
        let Some(first) = self.stops.first() else {
            return Rgb::default();
        };
        let offset = offset.clamp(0.0, 1.0);
        let mut prev = *first;
        for stop in &self.stops {
            if offset <= stop.offset {
                let span = stop.offset - prev.offset;
                if span <= 0.0 {
                    return stop.color;
                }
                return prev.color.lerp(stop.color, (offset - prev.offset) / span);
            }
            prev = *stop;
        }
        prev.color
    }

    /// Gradient offset of a screen pixel.
    pub fn offset_at(&self, x: f32, y: f32, viewport_height: f32) -> f32 {
        match self.shape {
            BackdropShape::Linear => {
                if viewport_height <= 0.0 {
                    0.0
                } else {
                    (y / viewport_height).clamp(0.0, 1.0)
                }
            }
            BackdropShape::Radial {
                center_px,
                radius_px,
            } => {
                if radius_px <= 0.0 {
                    return 1.0;
                }
                (Vec2::new(x, y).distance(center_px) / radius_px).clamp(0.0, 1.0)
            }
        }
    }
}
