use std::collections::{BTreeMap, HashMap};

use stratus_core::types::{Palette, Rgb};

use crate::phase::TimePhase;

/// Phase used when a phase name cannot be resolved.
pub const DEFAULT_DAYTIME_PHASE: TimePhase = TimePhase::SolarNoon;

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

/// Built-in palette for a phase.
pub fn builtin_palette(phase: TimePhase) -> Palette {
    let (gradient, sun, base, highlight, shadow): (Vec<Rgb>, Rgb, Rgb, Rgb, Rgb) = match phase {
        TimePhase::Night => (
            vec![rgb(4, 6, 20), rgb(10, 14, 38), rgb(20, 26, 58)],
            rgb(200, 210, 235),
            rgb(48, 54, 78),
            rgb(82, 90, 120),
            rgb(18, 20, 36),
        ),
        TimePhase::AstronomicalDawn => (
            vec![rgb(8, 10, 32), rgb(22, 26, 62), rgb(44, 44, 88), rgb(70, 60, 100)],
            rgb(210, 190, 210),
            rgb(70, 68, 100),
            rgb(110, 100, 140),
            rgb(28, 28, 52),
        ),
        TimePhase::NauticalDawn => (
            vec![rgb(18, 24, 64), rgb(48, 52, 110), rgb(108, 84, 130), rgb(168, 112, 128)],
            rgb(240, 180, 160),
            rgb(112, 98, 132),
            rgb(176, 140, 160),
            rgb(44, 40, 72),
        ),
        TimePhase::Dawn => (
            vec![
                rgb(40, 58, 120),
                rgb(102, 102, 160),
                rgb(196, 136, 150),
                rgb(246, 176, 140),
            ],
            rgb(255, 190, 140),
            rgb(176, 148, 160),
            rgb(244, 196, 176),
            rgb(82, 70, 104),
        ),
        TimePhase::Sunrise => (
            vec![
                rgb(70, 110, 180),
                rgb(150, 160, 200),
                rgb(246, 180, 140),
                rgb(255, 150, 90),
                rgb(255, 200, 130),
            ],
            rgb(255, 170, 80),
            rgb(230, 196, 180),
            rgb(255, 226, 196),
            rgb(120, 100, 120),
        ),
        TimePhase::Morning => (
            vec![rgb(70, 130, 210), rgb(120, 170, 230), rgb(176, 208, 240), rgb(214, 230, 246)],
            rgb(255, 240, 200),
            rgb(238, 240, 246),
            rgb(255, 255, 255),
            rgb(160, 170, 190),
        ),
        TimePhase::SolarNoon => (
            vec![rgb(40, 110, 210), rgb(90, 155, 230), rgb(150, 195, 240), rgb(200, 225, 250)],
            rgb(255, 252, 230),
            rgb(245, 246, 250),
            rgb(255, 255, 255),
            rgb(172, 182, 200),
        ),
        TimePhase::Afternoon => (
            vec![rgb(50, 115, 200), rgb(100, 160, 225), rgb(160, 200, 235), rgb(214, 226, 236)],
            rgb(255, 244, 210),
            rgb(240, 238, 240),
            rgb(255, 252, 246),
            rgb(164, 168, 186),
        ),
        TimePhase::GoldenHour => (
            vec![
                rgb(70, 110, 180),
                rgb(140, 150, 190),
                rgb(230, 184, 140),
                rgb(255, 196, 120),
            ],
            rgb(255, 200, 110),
            rgb(244, 214, 180),
            rgb(255, 232, 190),
            rgb(140, 120, 130),
        ),
        TimePhase::Sunset => (
            vec![
                rgb(50, 60, 130),
                rgb(120, 90, 150),
                rgb(220, 110, 110),
                rgb(255, 140, 70),
                rgb(255, 180, 90),
                rgb(255, 210, 140),
            ],
            rgb(255, 130, 60),
            rgb(232, 160, 150),
            rgb(255, 196, 150),
            rgb(110, 70, 100),
        ),
        TimePhase::Dusk => (
            vec![rgb(28, 34, 84), rgb(70, 60, 120), rgb(150, 90, 120), rgb(210, 120, 110)],
            rgb(240, 140, 100),
            rgb(130, 100, 130),
            rgb(190, 140, 150),
            rgb(50, 40, 70),
        ),
        TimePhase::NauticalDusk => (
            vec![rgb(12, 16, 48), rgb(32, 34, 80), rgb(70, 56, 100)],
            rgb(210, 170, 180),
            rgb(80, 74, 106),
            rgb(120, 108, 140),
            rgb(30, 28, 52),
        ),
    };

    Palette {
        gradient,
        sun,
        cloud_base: base,
        cloud_highlight: highlight,
        cloud_shadow: shadow,
    }
}

/// Palette lookup per phase, with optional named overrides.
#[derive(Debug, Clone)]
pub struct PaletteTable {
    palettes: HashMap<TimePhase, Palette>,
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PaletteTable {
    pub fn builtin() -> Self {
        let palettes = TimePhase::ALL
            .iter()
            .map(|&phase| (phase, builtin_palette(phase)))
            .collect();
        Self { palettes }
    }

    /// Built-in palettes with overrides keyed by phase name. Unknown names
    /// and palettes without gradient stops are skipped with a warning.
    pub fn with_overrides(overrides: &BTreeMap<String, Palette>) -> Self {
        let mut table = Self::builtin();
        for (name, palette) in overrides {
            let Some(phase) = TimePhase::from_name(name) else {
                log::warn!("Palette override for unknown phase '{name}' ignored");
                continue;
            };
            if palette.gradient.is_empty() {
                log::warn!("Palette override for '{name}' has no gradient stops, ignored");
                continue;
            }
            if palette.gradient.len() > 6 {
                log::warn!(
                    "Palette override for '{name}' has {} gradient stops (expected 3-6)",
                    palette.gradient.len()
                );
            }
            table.palettes.insert(phase, palette.clone());
        }
        table
    }

    pub fn get(&self, phase: TimePhase) -> &Palette {
        // Every phase is populated at construction.
        &self.palettes[&phase]
    }

    pub fn default_daytime(&self) -> &Palette {
        self.get(DEFAULT_DAYTIME_PHASE)
    }
}
