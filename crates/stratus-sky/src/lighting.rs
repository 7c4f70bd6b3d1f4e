use glam::Vec2;
use stratus_core::config::{SkyConfig, SunLayoutMode};
use stratus_core::constants::{RADIAL_RADIUS_FACTOR, TRANSITION_START};
use stratus_core::math::{direction_between, ease_in_out_cubic, lerp_vec2};
use stratus_core::types::{GradientKind, LightingDescriptor, Palette, Rgb};

use crate::layout::{phase_sun_position, projected_sun_position, VIEWPORT_CENTER};
use crate::palette::{PaletteTable, DEFAULT_DAYTIME_PHASE};
use crate::phase::TimePhase;
use crate::schedule::{build_sun_source, SimTime, SunPosition, SunSource};

/// Blend factor toward the next phase. Zero until the last quartile of the
/// phase, then eased from 0 to 1.
pub fn blend_factor(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < TRANSITION_START {
        return 0.0;
    }
    ease_in_out_cubic((p - TRANSITION_START) / (1.0 - TRANSITION_START))
}

/// Index-wise interpolation of two stop lists. The result has the longer
/// length; a missing index reuses the shorter list's last stop.
pub fn interpolate_stops(a: &[Rgb], b: &[Rgb], t: f32) -> Vec<Rgb> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let ca = a.get(i).or(a.last()).copied().unwrap_or_default();
            let cb = b.get(i).or(b.last()).copied().unwrap_or_default();
            ca.lerp(cb, t)
        })
        .collect()
}

/// Maps a (possibly simulated) time to a continuous `LightingDescriptor`.
pub struct SkyLightingModel {
    source: Box<dyn SunSource>,
    palettes: PaletteTable,
    layout: SunLayoutMode,
    viewport: Vec2,
}

impl SkyLightingModel {
    pub fn new(
        source: Box<dyn SunSource>,
        palettes: PaletteTable,
        layout: SunLayoutMode,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Self {
        Self {
            source,
            palettes,
            layout,
            viewport: Vec2::new(viewport_width, viewport_height),
        }
    }

    pub fn from_config(config: &SkyConfig, viewport_width: f32, viewport_height: f32) -> Self {
        let source = build_sun_source(&config.schedule);
        log::info!(
            "Sky lighting: {} schedule, {:?} sun layout",
            source.label(),
            config.sun_layout
        );
        Self::new(
            source,
            PaletteTable::with_overrides(&config.palette_overrides),
            config.sun_layout,
            viewport_width,
            viewport_height,
        )
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn sun_source(&self) -> &dyn SunSource {
        self.source.as_ref()
    }

    /// Descriptor for a point in time.
    pub fn descriptor_at(&self, time: SimTime) -> LightingDescriptor {
        let sun = self.source.sun_position(time);
        let progress = sun.current_phase.progress(time.seconds);
        let name = sun.current_phase.name.clone();
        self.descriptor_for_phase(&name, progress, Some(&sun))
    }

    /// Descriptor for a named phase at a given progress. An unknown name
    /// falls back to the default daytime palette.
    pub fn descriptor_for_phase(
        &self,
        phase_name: &str,
        progress: f32,
        sun: Option<&SunPosition>,
    ) -> LightingDescriptor {
        let Some(phase) = TimePhase::from_name(phase_name) else {
            log::warn!(
                "Unrecognized time phase '{phase_name}', using default daytime palette"
            );
            let pos = phase_sun_position(DEFAULT_DAYTIME_PHASE);
            return self.build(
                self.palettes.default_daytime(),
                DEFAULT_DAYTIME_PHASE.gradient_kind(),
                pos,
                direction_between(pos, VIEWPORT_CENTER),
            );
        };

        let t = blend_factor(progress);
        let next = phase.next();
        let current = self.palettes.get(phase);
        let upcoming = self.palettes.get(next);

        let projected = match (self.layout, sun) {
            (SunLayoutMode::Projected, Some(s)) => {
                Some(projected_sun_position(s.altitude, s.azimuth))
            }
            _ => None,
        };

        // Unmixed at either end, so the endpoints match the phase palettes exactly.
        if t <= 0.0 || t >= 1.0 {
            let (palette, p) = if t <= 0.0 { (current, phase) } else { (upcoming, next) };
            let pos = projected.unwrap_or_else(|| phase_sun_position(p));
            return self.build(
                palette,
                phase.gradient_kind(),
                pos,
                direction_between(pos, VIEWPORT_CENTER),
            );
        }

        let (pos, dir) = match projected {
            Some(pos) => (pos, direction_between(pos, VIEWPORT_CENTER)),
            None => {
                let pa = phase_sun_position(phase);
                let pb = phase_sun_position(next);
                let da = direction_between(pa, VIEWPORT_CENTER);
                let db = direction_between(pb, VIEWPORT_CENTER);
                (lerp_vec2(pa, pb, t), lerp_vec2(da, db, t).normalize_or_zero())
            }
        };

        let mixed = Palette {
            gradient: interpolate_stops(&current.gradient, &upcoming.gradient, t),
            sun: current.sun.lerp(upcoming.sun, t),
            cloud_base: current.cloud_base.lerp(upcoming.cloud_base, t),
            cloud_highlight: current.cloud_highlight.lerp(upcoming.cloud_highlight, t),
            cloud_shadow: current.cloud_shadow.lerp(upcoming.cloud_shadow, t),
        };
        self.build(&mixed, phase.gradient_kind(), pos, dir)
    }

    fn build(
        &self,
        palette: &Palette,
        kind: GradientKind,
        sun_position: Vec2,
        light_direction: Vec2,
    ) -> LightingDescriptor {
        let (radial_center, radial_radius) = match kind {
            GradientKind::Radial => (
                Some(sun_position),
                Some(RADIAL_RADIUS_FACTOR * self.viewport.x.max(self.viewport.y)),
            ),
            GradientKind::Linear => (None, None),
        };
        LightingDescriptor {
            gradient_colors: palette.gradient.clone(),
            sun_color: palette.sun,
            cloud_base_color: palette.cloud_base,
            cloud_highlight_color: palette.cloud_highlight,
            cloud_shadow_color: palette.cloud_shadow,
            sun_viewport_position: sun_position,
            light_direction,
            gradient_kind: kind,
            radial_center,
            radial_radius,
        }
    }
}
