use stratus_clouds::reshade::ReshadeOutput;
use stratus_clouds::shape::CloudData;
use stratus_clouds::worker::Ticket;
use stratus_core::types::{CloudFragmentSpec, LayerId, LightingDescriptor, PixelAttributes};

use crate::raster::{DrawRect, RasterTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub u64);

/// Fragment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentState {
    /// Shape synthesis in flight; nothing to draw yet.
    Spawning,
    /// On or near screen, drifting and receiving lighting refreshes.
    Active,
    /// Past the left margin; waiting to be recycled.
    DriftingOff,
    /// Destroyed. Terminal.
    Recycled,
}

/// One cloud instance owned by the manager.
#[derive(Debug)]
pub struct CloudFragment {
    pub id: FragmentId,
    pub layer: LayerId,
    pub state: FragmentState,
    spec: Option<CloudFragmentSpec>,
    /// Cleared to signal destruction to in-flight completions.
    pixels: Vec<PixelAttributes>,
    raster: Option<RasterTarget>,
    /// Descriptor the current colors were computed with.
    lit_by: Option<LightingDescriptor>,
    needs_redraw: bool,
    /// Single-slot busy guard for re-shading.
    reshade: Option<Ticket>,
}

impl CloudFragment {
    pub fn new_spawning(id: FragmentId, layer: LayerId) -> Self {
        Self {
            id,
            layer,
            state: FragmentState::Spawning,
            spec: None,
            pixels: Vec::new(),
            raster: None,
            lit_by: None,
            needs_redraw: false,
            reshade: None,
        }
    }

    /// Take ownership of synthesized data and become Active.
    pub fn activate(&mut self, data: CloudData, lit_by: Option<LightingDescriptor>) {
        let (w, h) = raster_size(&data.spec, &data.pixels);
        self.raster = Some(RasterTarget::new(w, h));
        self.spec = Some(data.spec);
        self.pixels = data.pixels;
        self.lit_by = lit_by;
        self.needs_redraw = true;
        self.state = FragmentState::Active;
    }

    /// Attributes present and not destroyed.
    pub fn is_live(&self) -> bool {
        self.state != FragmentState::Recycled && !self.pixels.is_empty()
    }

    pub fn spec(&self) -> Option<&CloudFragmentSpec> {
        self.spec.as_ref()
    }

    pub fn pixels(&self) -> &[PixelAttributes] {
        &self.pixels
    }

    pub fn raster(&self) -> Option<&RasterTarget> {
        self.raster.as_ref()
    }

    pub fn lit_by(&self) -> Option<&LightingDescriptor> {
        self.lit_by.as_ref()
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn depth(&self) -> f32 {
        self.spec.as_ref().map_or(0.0, |s| s.depth)
    }

    /// Move left by `speed * dt`. Returns true when the fragment has just
    /// passed `margin` pixels beyond the left edge.
    pub fn advance(&mut self, dt: f32, margin: f32) -> bool {
        if self.state != FragmentState::Active {
            return false;
        }
        let Some(spec) = self.spec.as_mut() else {
            return false;
        };
        spec.x -= spec.speed * dt;
        if spec.x + spec.width * 0.5 < -margin {
            self.state = FragmentState::DriftingOff;
            return true;
        }
        false
    }

    pub fn reshade_in_flight(&self) -> bool {
        self.reshade.is_some()
    }

    /// Claim the re-shade slot. False if a re-shade is already in flight.
    pub fn try_begin_reshade(&mut self, ticket: Ticket) -> bool {
        if self.reshade.is_some() || !self.is_live() {
            return false;
        }
        self.reshade = Some(ticket);
        true
    }

    pub fn end_reshade(&mut self) {
        self.reshade = None;
    }

    /// Release the slot if `ticket` holds it.
    pub fn finish_reshade(&mut self, ticket: Ticket) -> bool {
        if self.reshade == Some(ticket) {
            self.reshade = None;
            true
        } else {
            false
        }
    }

    /// Write recomputed colors over the overlapping prefix.
    pub fn apply_colors(&mut self, colors: &[u32], lit_by: LightingDescriptor) {
        if colors.len() != self.pixels.len() {
            log::warn!(
                "Fragment {}: color count {} does not match cell count {}",
                self.id.0,
                colors.len(),
                self.pixels.len()
            );
        }
        let mut changed = false;
        for (cell, &color) in self.pixels.iter_mut().zip(colors) {
            if cell.color != color {
                cell.color = color;
                changed = true;
            }
        }
        self.needs_redraw |= changed;
        self.lit_by = Some(lit_by);
    }

    /// Take recomputed shadows, brightness and colors over the overlapping prefix.
    pub fn apply_reshade(&mut self, output: ReshadeOutput, lit_by: LightingDescriptor) {
        if output.updated.len() != self.pixels.len() || output.colors.len() != output.updated.len()
        {
            log::warn!(
                "Fragment {}: reshade returned {} cells and {} colors for {} cells",
                self.id.0,
                output.updated.len(),
                output.colors.len(),
                self.pixels.len()
            );
        }
        let mut changed = false;
        for (cell, updated) in self.pixels.iter_mut().zip(output.updated) {
            if cell.color != updated.color {
                changed = true;
            }
            cell.shadow_factor = updated.shadow_factor;
            cell.brightness = updated.brightness;
            cell.color = updated.color;
        }
        self.needs_redraw |= changed;
        self.lit_by = Some(lit_by);
    }

    /// Scale size in place (settings change). Cell offsets scale with it.
    pub fn rescale(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) || (factor - 1.0).abs() < f32::EPSILON {
            return;
        }
        let Some(spec) = self.spec.as_mut() else {
            return;
        };
        spec.width *= factor;
        spec.height *= factor;
        spec.scale *= factor;
        for cell in &mut self.pixels {
            cell.pixel_x *= factor;
            cell.pixel_y *= factor;
            cell.pixel_size *= factor;
        }
        let (w, h) = raster_size(spec, &self.pixels);
        if self.is_live() {
            self.raster = Some(RasterTarget::new(w, h));
            self.needs_redraw = true;
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        if let Some(spec) = self.spec.as_mut() {
            spec.speed = speed;
        }
    }

    /// Cells as raster-local rects.
    pub fn draw_rects(&self) -> Vec<DrawRect> {
        let Some(spec) = self.spec.as_ref() else {
            return Vec::new();
        };
        let ox = spec.width * 0.5;
        let oy = spec.height * 0.5;
        self.pixels
            .iter()
            .map(|p| DrawRect {
                x: p.pixel_x + ox,
                y: p.pixel_y + oy,
                size: p.pixel_size,
                color: p.color,
                alpha: p.alpha,
            })
            .collect()
    }

    /// Re-rasterize if geometry or colors changed since the last draw.
    pub fn redraw_if_needed(&mut self) -> bool {
        if !self.needs_redraw || !self.is_live() {
            return false;
        }
        let rects = self.draw_rects();
        let Some(raster) = self.raster.as_mut() else {
            return false;
        };
        raster.rasterize(&rects);
        self.needs_redraw = false;
        true
    }

    /// Release everything. Returns false if already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.state == FragmentState::Recycled {
            return false;
        }
        self.pixels.clear();
        self.raster = None;
        self.reshade = None;
        self.needs_redraw = false;
        self.state = FragmentState::Recycled;
        true
    }
}

/// Bounding box of the cells, in whole pixels.
fn raster_size(spec: &CloudFragmentSpec, pixels: &[PixelAttributes]) -> (u32, u32) {
    let cell = pixels.iter().map(|p| p.pixel_size).fold(0.0f32, f32::max);
    (
        (spec.width + cell).ceil().max(1.0) as u32,
        (spec.height + cell).ceil().max(1.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use stratus_clouds::shape::{fragment_spec, synthesize_pixels, SynthesisSettings};
    use stratus_core::types::{Archetype, GradientKind, Rgb};

    fn data() -> CloudData {
        let mut spec = fragment_spec(Archetype::Puffy, 42, 240.0, 120.0);
        spec.x = 500.0;
        spec.speed = 20.0;
        let pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), None);
        CloudData { spec, pixels }
    }

    fn descriptor() -> LightingDescriptor {
        LightingDescriptor {
            gradient_colors: vec![Rgb::gray(40), Rgb::gray(90)],
            sun_color: Rgb::WHITE,
            cloud_base_color: Rgb::new(200, 180, 170),
            cloud_highlight_color: Rgb::WHITE,
            cloud_shadow_color: Rgb::new(90, 80, 100),
            sun_viewport_position: Vec2::new(1.5, 0.45),
            light_direction: Vec2::new(-1.0, 0.05).normalize(),
            gradient_kind: GradientKind::Radial,
            radial_center: Some(Vec2::new(1.5, 0.45)),
            radial_radius: Some(3000.0),
        }
    }

    fn active() -> CloudFragment {
        let mut f = CloudFragment::new_spawning(FragmentId(1), LayerId(0));
        f.activate(data(), None);
        f
    }

    #[test]
    fn test_spawning_not_live() {
        let f = CloudFragment::new_spawning(FragmentId(1), LayerId(2));
        assert_eq!(f.state, FragmentState::Spawning);
        assert!(!f.is_live());
        assert!(f.spec().is_none());
    }

    #[test]
    fn test_activate_sizes_raster() {
        let f = active();
        assert_eq!(f.state, FragmentState::Active);
        assert!(f.is_live());
        let raster = f.raster().unwrap();
        assert!(raster.width() >= 240 && raster.height() >= 120);
        for rect in f.draw_rects() {
            assert!(rect.x >= 0.0 && rect.x < raster.width() as f32);
            assert!(rect.y >= 0.0 && rect.y < raster.height() as f32);
        }
    }

    #[test]
    fn test_destroy_twice_is_noop() {
        let mut f = active();
        assert!(f.destroy());
        assert!(!f.destroy());
        assert_eq!(f.state, FragmentState::Recycled);
        assert!(f.pixels().is_empty());
        assert!(f.raster().is_none());
    }

    #[test]
    fn test_redraw_only_on_change() {
        let mut f = active();
        assert!(f.redraw_if_needed());
        assert!(!f.redraw_if_needed());
        assert_eq!(f.raster().unwrap().redraw_count(), 1);

        // Same colors: no redraw.
        let same: Vec<u32> = f.pixels().iter().map(|p| p.color).collect();
        f.apply_colors(&same, descriptor());
        assert!(!f.redraw_if_needed());

        let changed = vec![0x123456; f.pixels().len()];
        f.apply_colors(&changed, descriptor());
        assert!(f.redraw_if_needed());
        assert_eq!(f.raster().unwrap().redraw_count(), 2);
    }

    #[test]
    fn test_busy_guard_single_slot() {
        let mut f = active();
        assert!(f.try_begin_reshade(Ticket(1)));
        assert!(!f.try_begin_reshade(Ticket(2)));
        f.end_reshade();
        assert!(f.try_begin_reshade(Ticket(3)));
        f.destroy();
        assert!(!f.reshade_in_flight());
        assert!(!f.try_begin_reshade(Ticket(4)));
    }

    #[test]
    fn test_short_colors_apply_prefix() {
        let mut f = active();
        let n = f.pixels().len();
        assert!(n > 2);
        let last = f.pixels()[n - 1].color;
        f.apply_colors(&[0xABCDEF, 0xABCDEF], descriptor());
        assert_eq!(f.pixels()[0].color, 0xABCDEF);
        assert_eq!(f.pixels()[1].color, 0xABCDEF);
        assert_eq!(f.pixels()[n - 1].color, last);
        assert!(f.lit_by().is_some());
    }

    #[test]
    fn test_advance_until_drifting_off() {
        let mut f = active();
        assert!(!f.advance(1.0, 100.0));
        assert_eq!(f.spec().unwrap().x, 480.0);
        // 480 + 120 must fall below -100: 700 px at 20 px/s
        assert!(f.advance(35.5, 100.0));
        assert_eq!(f.state, FragmentState::DriftingOff);
        assert!(!f.advance(1.0, 100.0), "only active fragments move");
    }

    #[test]
    fn test_rescale_moves_cells() {
        let mut f = active();
        f.redraw_if_needed();
        let before = f.pixels()[0].pixel_x;
        f.rescale(1.5);
        assert_eq!(f.spec().unwrap().width, 360.0);
        assert_eq!(f.pixels()[0].pixel_x, before * 1.5);
        assert!(f.needs_redraw());
        assert!(f.raster().unwrap().width() >= 360);
    }
}
