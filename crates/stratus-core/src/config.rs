use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PIXEL_SIZE, DENSITY_THRESHOLD, MAX_GRID_DIM};
use crate::error::ConfigError;
use crate::types::{Palette, ValueRange};

/// Where phase start times come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ScheduleConfig {
    /// Fixed local clock times, identical every day.
    #[default]
    Fixed,
    /// Solar-position derived times for a location.
    Astronomical {
        latitude: f64,
        longitude: f64,
        utc_offset_hours: f64,
    },
}

/// How the sun's viewport position is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SunLayoutMode {
    /// Fixed symmetric layout per phase.
    #[default]
    PhaseLayout,
    /// Projection of the sun's altitude/azimuth.
    Projected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub schedule: ScheduleConfig,
    pub sun_layout: SunLayoutMode,
    /// Seconds of scene time between lighting refreshes.
    pub refresh_interval_secs: f32,
    /// Phase name -> palette replacing the built-in one.
    pub palette_overrides: BTreeMap<String, Palette>,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::Fixed,
            sun_layout: SunLayoutMode::PhaseLayout,
            refresh_interval_secs: 5.0,
            palette_overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Target fragment count for the front-most layer.
    pub cloud_count: u32,
    pub layer_count: u32,
    /// Base drift speed in pixels per second.
    pub base_speed: f32,
    /// Global size multiplier applied on top of per-layer scale.
    pub size_multiplier: f32,
    /// Unscaled fragment width in pixels.
    pub base_width: ValueRange,
    pub pixel_size: f32,
    pub max_grid: u32,
    pub density_threshold: f32,
    /// Distance past the left edge before a fragment is recycled.
    pub offscreen_margin: f32,
    /// Share of the initial population placed on screen.
    pub onscreen_fraction: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            cloud_count: 10,
            layer_count: 4,
            base_speed: 14.0,
            size_multiplier: 1.0,
            base_width: ValueRange::new(260.0, 560.0),
            pixel_size: DEFAULT_PIXEL_SIZE,
            max_grid: MAX_GRID_DIM,
            density_threshold: DENSITY_THRESHOLD,
            offscreen_margin: 200.0,
            onscreen_fraction: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Top of the cloud band (normalized, top-down).
    pub band_start: f32,
    /// Bottom of the cloud band.
    pub band_end: f32,
    /// Slice widening factor; 0.5 grows each slice by half its height.
    pub overlap: f32,
    pub constrained_fraction: f32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            band_start: 0.5,
            band_end: 1.0,
            overlap: 0.5,
            constrained_fraction: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub threads: u32,
    /// Requests submitted per batch.
    pub batch_size: u32,
    /// Cap on outstanding worker requests.
    pub max_in_flight: u32,
    /// Scene-time pause between batches.
    pub batch_interval_secs: f32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            batch_size: 4,
            max_in_flight: 8,
            batch_interval_secs: 0.05,
        }
    }
}

/// Top-level configuration, loaded from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StratusConfig {
    pub sky: SkyConfig,
    pub clouds: CloudConfig,
    pub layers: LayerConfig,
    pub worker: WorkerConfig,
}

impl StratusConfig {
    /// Reject values that would make the pipeline degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.clouds.layer_count == 0 {
            return Err(invalid("clouds.layer_count", "must be at least 1"));
        }
        if self.clouds.pixel_size <= 0.0 || !self.clouds.pixel_size.is_finite() {
            return Err(invalid("clouds.pixel_size", "must be positive"));
        }
        if self.clouds.max_grid == 0 {
            return Err(invalid("clouds.max_grid", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.clouds.density_threshold) {
            return Err(invalid("clouds.density_threshold", "must be in [0, 1)"));
        }
        if self.clouds.base_width.min <= 0.0 || self.clouds.base_width.max < self.clouds.base_width.min
        {
            return Err(invalid("clouds.base_width", "must be a positive, ordered range"));
        }
        if !(0.0..=1.0).contains(&self.clouds.onscreen_fraction) {
            return Err(invalid("clouds.onscreen_fraction", "must be in [0, 1]"));
        }
        if self.layers.band_end <= self.layers.band_start {
            return Err(invalid("layers.band_end", "must be below band_start"));
        }
        if !(0.0..=1.0).contains(&self.layers.constrained_fraction) {
            return Err(invalid("layers.constrained_fraction", "must be in [0, 1]"));
        }
        if self.sky.refresh_interval_secs <= 0.0 {
            return Err(invalid("sky.refresh_interval_secs", "must be positive"));
        }
        if self.worker.batch_size == 0 || self.worker.max_in_flight == 0 {
            return Err(invalid("worker", "batch_size and max_in_flight must be at least 1"));
        }
        Ok(())
    }
}

/// Parse and validate a configuration from RON text.
pub fn load_config_from_str(ron_str: &str) -> Result<StratusConfig, ConfigError> {
    let options = ron::Options::default();
    let config: StratusConfig = options
        .from_str(ron_str)
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    log::debug!(
        "Loaded config: {} layers, {} clouds per front layer",
        config.clouds.layer_count,
        config.clouds.cloud_count
    );
    Ok(config)
}
