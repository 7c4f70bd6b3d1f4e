//! Approximate solar position (NOAA general solar position equations).
//!
//! Accurate to a few minutes for event times, which is far below what is
//! visible in a sky gradient. Angles are in degrees, times in minutes after
//! local midnight.

use std::f64::consts::PI;

/// Altitude of the sun's center at apparent sunrise/sunset (refraction + disc).
pub const SUNRISE_ALTITUDE: f64 = -0.833;
pub const CIVIL_TWILIGHT_ALTITUDE: f64 = -6.0;
pub const NAUTICAL_TWILIGHT_ALTITUDE: f64 = -12.0;
pub const ASTRONOMICAL_TWILIGHT_ALTITUDE: f64 = -18.0;
pub const GOLDEN_HOUR_ALTITUDE: f64 = 6.0;

/// Sun altitude above the horizon and azimuth clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarAngles {
    pub altitude: f64,
    pub azimuth: f64,
}

/// Observer location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_hours: f64,
}

fn fractional_year(day_of_year: u32, local_hour: f64, utc_offset_hours: f64) -> f64 {
    let utc_hour = local_hour - utc_offset_hours;
    2.0 * PI / 365.0 * (day_of_year as f64 - 1.0 + (utc_hour - 12.0) / 24.0)
}

fn equation_of_time_minutes(gamma: f64) -> f64 {
    229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin())
}

fn declination(gamma: f64) -> f64 {
    0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin() - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin()
}

/// Sun angles at a local clock time.
pub fn solar_position(observer: &Observer, day_of_year: u32, local_seconds: f64) -> SolarAngles {
    let local_hour = local_seconds / 3600.0;
    let gamma = fractional_year(day_of_year, local_hour, observer.utc_offset_hours);
    let eqtime = equation_of_time_minutes(gamma);
    let decl = declination(gamma);

    let time_offset = eqtime + 4.0 * observer.longitude - 60.0 * observer.utc_offset_hours;
    let true_solar_minutes = local_hour * 60.0 + time_offset;
    let hour_angle = (true_solar_minutes / 4.0 - 180.0).to_radians();

    let lat = observer.latitude.to_radians();
    let cos_zenith =
        (lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos()).clamp(-1.0, 1.0);
    let altitude = 90.0 - cos_zenith.acos().to_degrees();

    // Azimuth from south, westward positive; shifted to clockwise-from-north.
    let az_south = hour_angle
        .sin()
        .atan2(hour_angle.cos() * lat.sin() - decl.tan() * lat.cos());
    let azimuth = (az_south.to_degrees() + 180.0).rem_euclid(360.0);

    SolarAngles { altitude, azimuth }
}

/// Local clock time of solar noon, in minutes after midnight.
pub fn solar_noon_minutes(observer: &Observer, day_of_year: u32) -> f64 {
    let gamma = fractional_year(day_of_year, 12.0, observer.utc_offset_hours);
    720.0 - 4.0 * observer.longitude - equation_of_time_minutes(gamma)
        + 60.0 * observer.utc_offset_hours
}

/// Local time (minutes) at which the sun crosses `altitude` in the morning
/// (`rising`) or evening. None when it never reaches that altitude that day.
pub fn crossing_minutes(
    observer: &Observer,
    day_of_year: u32,
    altitude: f64,
    rising: bool,
) -> Option<f64> {
    let gamma = fractional_year(day_of_year, 12.0, observer.utc_offset_hours);
    let decl = declination(gamma);
    let lat = observer.latitude.to_radians();

    let denom = lat.cos() * decl.cos();
    if denom.abs() < 1e-9 {
        return None;
    }
    let cos_h0 = (altitude.to_radians().sin() - lat.sin() * decl.sin()) / denom;
    if !(-1.0..=1.0).contains(&cos_h0) {
        return None;
    }

    let half_arc_minutes = 4.0 * cos_h0.acos().to_degrees();
    let noon = solar_noon_minutes(observer, day_of_year);
    Some(if rising {
        noon - half_arc_minutes
    } else {
        noon + half_arc_minutes
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Observer = Observer {
        latitude: 51.5,
        longitude: -0.12,
        utc_offset_hours: 1.0,
    };

    #[test]
    fn test_london_midsummer_sunrise() {
        // Around 04:43 BST on June 21st.
        let rise = crossing_minutes(&LONDON, 172, SUNRISE_ALTITUDE, true).expect("sun rises");
        assert!((rise - 283.0).abs() < 10.0, "sunrise at {rise} minutes");
        let set = crossing_minutes(&LONDON, 172, SUNRISE_ALTITUDE, false).expect("sun sets");
        assert!((set - 1281.0).abs() < 10.0, "sunset at {set} minutes");
    }

    #[test]
    fn test_noon_altitude_and_azimuth() {
        let noon = solar_noon_minutes(&LONDON, 172);
        let angles = solar_position(&LONDON, 172, noon * 60.0);
        assert!((angles.altitude - 62.0).abs() < 1.5, "altitude {}", angles.altitude);
        assert!((angles.azimuth - 180.0).abs() < 2.0, "azimuth {}", angles.azimuth);
    }

    #[test]
    fn test_morning_sun_is_east() {
        let angles = solar_position(&LONDON, 172, 7.0 * 3600.0);
        assert!(angles.azimuth > 45.0 && angles.azimuth < 135.0, "azimuth {}", angles.azimuth);
        let evening = solar_position(&LONDON, 172, 19.0 * 3600.0);
        assert!(evening.azimuth > 225.0 && evening.azimuth < 315.0);
    }

    #[test]
    fn test_polar_day_has_no_sunset() {
        let tromso = Observer {
            latitude: 69.65,
            longitude: 18.96,
            utc_offset_hours: 2.0,
        };
        assert!(crossing_minutes(&tromso, 172, SUNRISE_ALTITUDE, false).is_none());
        assert!(crossing_minutes(&tromso, 355, SUNRISE_ALTITUDE, true).is_none());
    }
}
