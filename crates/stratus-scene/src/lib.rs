pub mod batch;
pub mod fragment;
pub mod fragment_map;
pub mod manager;
pub mod raster;
pub mod spawn;

use stratus_clouds::worker::CloudWorker;
use stratus_core::config::StratusConfig;
use stratus_core::error::ConfigError;
use stratus_core::types::LightingDescriptor;
use stratus_sky::backdrop::SkyBackdrop;
use stratus_sky::lighting::SkyLightingModel;
use stratus_sky::schedule::SimTime;

pub use fragment::{CloudFragment, FragmentId, FragmentState};
pub use manager::{
    classify_lighting_change, CloudManager, DrawItem, FrameReport, LightingChange,
    ManagerStats, SettingsChange,
};
pub use raster::{DrawRect, RasterTarget, Rgba8};

/// Primary public struct for the stratus-scene crate.
/// Owns the sky lighting model and the cloud manager, advances simulated
/// time, and refreshes lighting on a fixed scene-time interval.
pub struct SkyScene {
    sky: SkyLightingModel,
    clouds: CloudManager,
    time: SimTime,
    /// Simulated seconds per scene second.
    time_scale: f64,
    refresh_interval: f32,
    since_refresh: f32,
    descriptor: LightingDescriptor,
    backdrop: SkyBackdrop,
    viewport: (f32, f32),
}

impl SkyScene {
    /// Build a scene, compute the initial lighting and queue the first
    /// cloud population.
    pub fn new(
        config: &StratusConfig,
        worker: Box<dyn CloudWorker>,
        width: f32,
        height: f32,
        start: SimTime,
        seed: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let sky = SkyLightingModel::from_config(&config.sky, width, height);
        let descriptor = sky.descriptor_at(start);
        let backdrop = SkyBackdrop::from_descriptor(&descriptor, width, height);

        let mut clouds = CloudManager::new(config, worker, width, height, seed);
        clouds.set_lighting(descriptor.clone());
        clouds.populate();

        Ok(Self {
            sky,
            clouds,
            time: start,
            time_scale: 1.0,
            refresh_interval: config.sky.refresh_interval_secs,
            since_refresh: 0.0,
            descriptor,
            backdrop,
            viewport: (width, height),
        })
    }

    /// Advance by `dt` scene seconds: move clouds every call, refresh
    /// lighting once the interval has elapsed.
    pub fn update(&mut self, dt: f32) -> FrameReport {
        self.time.advance(dt as f64 * self.time_scale);
        self.since_refresh += dt;
        if self.since_refresh >= self.refresh_interval {
            // Keep the overshoot so the cadence does not drift.
            self.since_refresh %= self.refresh_interval;
            self.refresh_lighting();
        }
        self.clouds.update(dt)
    }

    /// Recompute the descriptor for the current time. Returns true when it
    /// changed.
    pub fn refresh_lighting(&mut self) -> bool {
        let descriptor = self.sky.descriptor_at(self.time);
        if descriptor == self.descriptor {
            return false;
        }
        let (w, h) = self.viewport;
        self.backdrop = SkyBackdrop::from_descriptor(&descriptor, w, h);
        self.clouds.set_lighting(descriptor.clone());
        self.descriptor = descriptor;
        true
    }

    /// Jump to a time (user override or scrubbing) and refresh immediately.
    pub fn set_time(&mut self, time: SimTime) {
        self.time = time;
        self.since_refresh = 0.0;
        self.refresh_lighting();
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
        self.sky.set_viewport(width, height);
        self.clouds.resize(width, height);
        if !self.refresh_lighting() {
            // Backdrop geometry depends on the viewport even when colors hold.
            self.backdrop = SkyBackdrop::from_descriptor(&self.descriptor, width, height);
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn descriptor(&self) -> &LightingDescriptor {
        &self.descriptor
    }

    pub fn backdrop(&self) -> &SkyBackdrop {
        &self.backdrop
    }

    pub fn sky(&self) -> &SkyLightingModel {
        &self.sky
    }

    pub fn clouds(&self) -> &CloudManager {
        &self.clouds
    }

    pub fn clouds_mut(&mut self) -> &mut CloudManager {
        &mut self.clouds
    }
}
