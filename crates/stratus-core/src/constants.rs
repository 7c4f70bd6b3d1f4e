//! Single source of truth for shared tuning constants.
//! Synthesis, re-shading and the lighting model all read from here so the
//! worker side and the main-thread side never disagree on a threshold.

/// Hard cap on the synthesis grid, per axis.
pub const MAX_GRID_DIM: u32 = 80;

/// Default size of one cloud "pixel" in screen pixels.
pub const DEFAULT_PIXEL_SIZE: f32 = 4.0;

/// Cells at or below this final density are dropped from the output.
pub const DENSITY_THRESHOLD: f32 = 0.1;

/// Density difference to the 4-neighbour average that marks an edge cell.
pub const EDGE_DELTA_THRESHOLD: f32 = 0.15;

/// Cells below this density are always edge cells.
pub const EDGE_LOW_DENSITY: f32 = 0.3;

/// Minimum shadow factor for edge cells (keeps silhouettes readable).
pub const EDGE_SHADOW_FLOOR: f32 = 0.6;

/// How strongly dense cells darken themselves (0 = no self-shadowing).
pub const SELF_SHADOW_STRENGTH: f32 = 0.3;

/// Lower bound of per-pixel brightness.
pub const BRIGHTNESS_MIN: f32 = 0.4;

/// Upper bound of per-pixel brightness.
pub const BRIGHTNESS_MAX: f32 = 1.0;

/// Shadow factor above which interior cells take the lit-side blend.
pub const LIT_SIDE_THRESHOLD: f32 = 0.7;

/// Maximum pull toward the shadow color on the shaded side.
pub const SHADOW_BLEND_STRENGTH: f32 = 0.6;

/// Maximum pull toward the highlight color for edge cells.
pub const EDGE_HIGHLIGHT_BLEND: f32 = 0.7;

/// Gain applied with brightness before the per-channel clamp. Values above
/// one let bright midday clouds saturate to white.
pub const BRIGHTNESS_GAIN: f32 = 1.3;

/// Phase progress at which blending toward the next phase begins.
pub const TRANSITION_START: f32 = 0.75;

/// Radial sky gradient radius as a multiple of the larger viewport side.
pub const RADIAL_RADIUS_FACTOR: f32 = 2.5;

/// Density memo key precision: coordinates are rounded to 1/DENSITY_CACHE_SCALE.
pub const DENSITY_CACHE_SCALE: f32 = 1000.0;

/// Light-direction delta (euclidean) above which shadows are recomputed.
pub const LIGHT_DIRECTION_TOLERANCE: f32 = 0.05;

/// Seconds in a calendar day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fallback gray used when a single pixel cannot be colored.
pub const NEUTRAL_GRAY: u8 = 128;
