pub mod backdrop;
pub mod layout;
pub mod lighting;
pub mod palette;
pub mod phase;
pub mod schedule;
pub mod solar;

pub use backdrop::{BackdropShape, ColorStop, SkyBackdrop};
pub use lighting::{blend_factor, SkyLightingModel};
pub use palette::PaletteTable;
pub use phase::TimePhase;
pub use schedule::{
    build_sun_source, AstronomicalSchedule, FixedSchedule, PhaseWindow, SimTime, SunPosition,
    SunSource,
};
