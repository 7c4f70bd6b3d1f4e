pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod rng;
pub mod types;

pub use config::{
    CloudConfig, LayerConfig, ScheduleConfig, SkyConfig, StratusConfig, SunLayoutMode,
    WorkerConfig,
};
pub use error::{ConfigError, WorkerError};
pub use types::{
    Archetype, CloudFragmentSpec, DepthLayerConfig, GradientKind, LayerId, LightingDescriptor,
    Palette, PixelAttributes, Rgb, ValueRange,
};
