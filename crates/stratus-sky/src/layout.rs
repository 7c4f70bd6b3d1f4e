//! Sun placement in normalized viewport units (x right, y down, may lie
//! outside [0, 1] for an off-screen sun).

use glam::Vec2;

use crate::phase::TimePhase;

pub const VIEWPORT_CENTER: Vec2 = Vec2::new(0.5, 0.5);

/// Fixed symmetric layout: rising side far right just above center, noon
/// far above top-center, setting side far left, night far below.
pub fn phase_sun_position(phase: TimePhase) -> Vec2 {
    match phase {
        TimePhase::Night => Vec2::new(0.5, 2.5),
        TimePhase::AstronomicalDawn => Vec2::new(1.6, 0.9),
        TimePhase::NauticalDawn => Vec2::new(1.6, 0.7),
        TimePhase::Dawn => Vec2::new(1.55, 0.55),
        TimePhase::Sunrise => Vec2::new(1.5, 0.45),
        TimePhase::Morning => Vec2::new(1.2, -0.4),
        TimePhase::SolarNoon => Vec2::new(0.5, -1.5),
        TimePhase::Afternoon => Vec2::new(-0.2, -0.4),
        TimePhase::GoldenHour => Vec2::new(-0.5, 0.3),
        TimePhase::Sunset => Vec2::new(-0.5, 0.45),
        TimePhase::Dusk => Vec2::new(-0.55, 0.55),
        TimePhase::NauticalDusk => Vec2::new(-0.6, 0.8),
    }
}

/// Project true solar angles onto the viewport. Azimuth 90° (east) lands
/// right of the screen and 270° (west) left of it; altitude 0° sits just
/// above center and 90° far above the top edge. Below the horizon the sun
/// sinks toward and past the bottom edge.
pub fn projected_sun_position(altitude: f64, azimuth: f64) -> Vec2 {
    let az = azimuth.rem_euclid(360.0) as f32;
    let x = (0.5 + (180.0 - az) / 90.0 * 0.75).clamp(-1.0, 2.0);

    let alt = altitude.clamp(-90.0, 90.0) as f32;
    let y = if alt >= 0.0 {
        0.45 - alt / 90.0 * 1.45
    } else {
        (0.45 + -alt / 18.0 * 1.05).min(2.5)
    };
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_layout_sides() {
        assert!(phase_sun_position(TimePhase::Sunrise).x > 1.0);
        assert!(phase_sun_position(TimePhase::Sunset).x < 0.0);
        assert!(phase_sun_position(TimePhase::SolarNoon).y < 0.0);
        assert!(phase_sun_position(TimePhase::Night).y > 1.0);
    }

    #[test]
    fn test_projection_extremes() {
        let east = projected_sun_position(0.0, 90.0);
        assert!(east.x > 1.0, "east should be right of screen: {east}");
        assert!((east.y - 0.45).abs() < 1e-6);

        let west = projected_sun_position(0.0, 270.0);
        assert!(west.x < 0.0, "west should be left of screen: {west}");

        let zenith = projected_sun_position(90.0, 180.0);
        assert!((zenith.x - 0.5).abs() < 1e-6);
        assert!(zenith.y < -0.9);

        let below = projected_sun_position(-30.0, 0.0);
        assert!(below.y > 1.0);
    }

    #[test]
    fn test_projection_altitude_monotonic() {
        let mut prev = f32::INFINITY;
        for alt in (-18..=90).step_by(6) {
            let y = projected_sun_position(alt as f64, 180.0).y;
            assert!(y < prev, "y must decrease as altitude rises (alt {alt})");
            prev = y;
        }
    }
}
