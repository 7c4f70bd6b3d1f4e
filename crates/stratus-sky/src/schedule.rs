//! Phase schedules: where the current time-of-day phase comes from.
//!
//! Both strategies implement `SunSource`, so the lighting model never knows
//! whether it runs on a fixed clock table or on real solar geometry.

use std::f64::consts::PI;

use stratus_core::config::ScheduleConfig;
use stratus_core::constants::SECONDS_PER_DAY;

use crate::phase::TimePhase;
use crate::solar::{self, Observer};

/// Day of year plus local clock seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTime {
    /// 1..=365
    pub day_of_year: u32,
    /// [0, 86400)
    pub seconds: f64,
}

impl SimTime {
    /// Build a time, carrying seconds outside [0, 86400) into the day count.
    pub fn new(day_of_year: u32, seconds: f64) -> Self {
        let mut t = Self {
            day_of_year: day_of_year.clamp(1, 365),
            seconds: 0.0,
        };
        t.advance(seconds);
        t
    }

    pub fn from_hours(day_of_year: u32, hours: f64) -> Self {
        Self::new(day_of_year, hours * 3600.0)
    }

    pub fn hours(&self) -> f64 {
        self.seconds / 3600.0
    }

    /// Move forward (or backward) by `delta` seconds, wrapping days and years.
    pub fn advance(&mut self, delta: f64) {
        let total = self.seconds + delta;
        let days = (total / SECONDS_PER_DAY).floor();
        self.seconds = total - days * SECONDS_PER_DAY;
        if self.seconds >= SECONDS_PER_DAY {
            self.seconds = 0.0;
        }
        let day0 = self.day_of_year as i64 - 1 + days as i64;
        self.day_of_year = (day0.rem_euclid(365) + 1) as u32;
    }
}

/// The phase active at a given time and its bounds, in seconds relative to
/// the same local midnight. `start` may be negative and `end` may exceed one
/// day when the phase wraps midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseWindow {
    pub name: String,
    pub start: f64,
    pub end: f64,
}

impl PhaseWindow {
    /// Fraction of the phase elapsed at `seconds`, clamped to [0, 1].
    pub fn progress(&self, seconds: f64) -> f32 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return 0.0;
        }
        ((seconds - self.start) / span).clamp(0.0, 1.0) as f32
    }
}

/// Sun state reported by a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SunPosition {
    /// Degrees above the horizon (negative below).
    pub altitude: f64,
    /// Degrees clockwise from north.
    pub azimuth: f64,
    pub is_day: bool,
    pub is_dawn: bool,
    pub is_dusk: bool,
    pub is_night: bool,
    pub current_phase: PhaseWindow,
}

/// Source of sun position and phase timing.
pub trait SunSource: Send {
    /// Sorted `(phase, start_seconds)` table for a day.
    fn phase_starts(&self, day_of_year: u32) -> Vec<(TimePhase, f64)>;

    /// Sun angles at a time, in degrees.
    fn angles(&self, time: SimTime) -> (f64, f64);

    fn label(&self) -> &'static str;

    fn sun_position(&self, time: SimTime) -> SunPosition {
        let starts = self.phase_starts(time.day_of_year);
        let (phase, start, end) = resolve_phase(&starts, time.seconds);
        let (altitude, azimuth) = self.angles(time);
        SunPosition {
            altitude,
            azimuth,
            is_day: altitude > solar::SUNRISE_ALTITUDE,
            is_dawn: phase.is_dawn(),
            is_dusk: phase.is_dusk(),
            is_night: phase == TimePhase::Night,
            current_phase: PhaseWindow {
                name: phase.name().to_string(),
                start,
                end,
            },
        }
    }
}

/// Find the phase containing `now` in a sorted start table. Before the first
/// start, the last phase of the table is still running from the previous day.
pub fn resolve_phase(starts: &[(TimePhase, f64)], now: f64) -> (TimePhase, f64, f64) {
    let Some(&(_, first_start)) = starts.first() else {
        return (TimePhase::SolarNoon, 0.0, SECONDS_PER_DAY);
    };

    match starts.iter().rposition(|&(_, s)| s <= now) {
        Some(i) => {
            let (phase, start) = starts[i];
            let end = starts
                .get(i + 1)
                .map(|&(_, s)| s)
                .unwrap_or(first_start + SECONDS_PER_DAY);
            (phase, start, end)
        }
        None => {
            let (last_phase, last_start) = starts[starts.len() - 1];
            (last_phase, last_start - SECONDS_PER_DAY, first_start)
        }
    }
}

/// Fixed local clock times, the same every day.
#[derive(Debug, Clone)]
pub struct FixedSchedule {
    starts: Vec<(TimePhase, f64)>,
    sunrise: f64,
    sunset: f64,
}

impl Default for FixedSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedSchedule {
    const MAX_ALTITUDE: f64 = 60.0;
    const MIN_ALTITUDE: f64 = -30.0;

    pub fn new() -> Self {
        let h = |hours: f64| hours * 3600.0;
        let starts = vec![
            (TimePhase::AstronomicalDawn, h(4.5)),
            (TimePhase::NauticalDawn, h(5.0)),
            (TimePhase::Dawn, h(5.5)),
            (TimePhase::Sunrise, h(6.0)),
            (TimePhase::Morning, h(7.0)),
            (TimePhase::SolarNoon, h(11.25)),
            (TimePhase::Afternoon, h(13.25)),
            (TimePhase::GoldenHour, h(17.5)),
            (TimePhase::Sunset, h(18.5)),
            (TimePhase::Dusk, h(19.0)),
            (TimePhase::NauticalDusk, h(19.5)),
            (TimePhase::Night, h(20.0)),
        ];
        Self {
            starts,
            sunrise: h(6.0),
            sunset: h(18.5),
        }
    }
}

impl SunSource for FixedSchedule {
    fn phase_starts(&self, _day_of_year: u32) -> Vec<(TimePhase, f64)> {
        self.starts.clone()
    }

    /// Sinusoidal arc east to west over the day, and a shallow dip below
    /// the horizon over the night continuing west to east.
    fn angles(&self, time: SimTime) -> (f64, f64) {
        let t = time.seconds;
        let day_len = self.sunset - self.sunrise;
        if (self.sunrise..self.sunset).contains(&t) {
            let frac = (t - self.sunrise) / day_len;
            let altitude = Self::MAX_ALTITUDE * (PI * frac).sin();
            let azimuth = 90.0 + 180.0 * frac;
            (altitude, azimuth)
        } else {
            let night_len = SECONDS_PER_DAY - day_len;
            let since_set = (t - self.sunset).rem_euclid(SECONDS_PER_DAY);
            let frac = since_set / night_len;
            let altitude = Self::MIN_ALTITUDE * (PI * frac).sin();
            let azimuth = (270.0 + 180.0 * frac).rem_euclid(360.0);
            (altitude, azimuth)
        }
    }

    fn label(&self) -> &'static str {
        "fixed"
    }
}

/// Phase times from solar geometry at a location.
#[derive(Debug, Clone)]
pub struct AstronomicalSchedule {
    observer: Observer,
}

impl AstronomicalSchedule {
    /// Minutes either side of solar noon covered by the noon phase.
    const NOON_HALF_WIDTH_MINUTES: f64 = 60.0;

    pub fn new(latitude: f64, longitude: f64, utc_offset_hours: f64) -> Self {
        Self {
            observer: Observer {
                latitude: latitude.clamp(-90.0, 90.0),
                longitude,
                utc_offset_hours,
            },
        }
    }
}

impl SunSource for AstronomicalSchedule {
    fn phase_starts(&self, day_of_year: u32) -> Vec<(TimePhase, f64)> {
        let obs = &self.observer;
        let rise = |alt: f64| solar::crossing_minutes(obs, day_of_year, alt, true);
        let set = |alt: f64| solar::crossing_minutes(obs, day_of_year, alt, false);
        let noon = solar::solar_noon_minutes(obs, day_of_year);

        let candidates = [
            (TimePhase::AstronomicalDawn, rise(solar::ASTRONOMICAL_TWILIGHT_ALTITUDE)),
            (TimePhase::NauticalDawn, rise(solar::NAUTICAL_TWILIGHT_ALTITUDE)),
            (TimePhase::Dawn, rise(solar::CIVIL_TWILIGHT_ALTITUDE)),
            (TimePhase::Sunrise, rise(solar::SUNRISE_ALTITUDE)),
            (TimePhase::Morning, rise(solar::GOLDEN_HOUR_ALTITUDE)),
            (TimePhase::SolarNoon, Some(noon - Self::NOON_HALF_WIDTH_MINUTES)),
            (TimePhase::Afternoon, Some(noon + Self::NOON_HALF_WIDTH_MINUTES)),
            (TimePhase::GoldenHour, set(solar::GOLDEN_HOUR_ALTITUDE)),
            (TimePhase::Sunset, set(solar::SUNRISE_ALTITUDE)),
            (TimePhase::Dusk, set(solar::CIVIL_TWILIGHT_ALTITUDE)),
            (TimePhase::NauticalDusk, set(solar::NAUTICAL_TWILIGHT_ALTITUDE)),
            (TimePhase::Night, set(solar::ASTRONOMICAL_TWILIGHT_ALTITUDE)),
        ];

        // Keep only crossings that happen, in strictly increasing order.
        let mut starts: Vec<(TimePhase, f64)> = Vec::with_capacity(candidates.len());
        for (phase, minutes) in candidates {
            let Some(minutes) = minutes else { continue };
            let seconds = minutes * 60.0;
            if starts.last().map_or(true, |&(_, prev)| seconds > prev) {
                starts.push((phase, seconds));
            }
        }

        // The noon pair is always present, so only a bare noon window means
        // the sun never crossed any threshold: polar day or night.
        let noon_altitude = solar::solar_position(obs, day_of_year, noon * 60.0).altitude;
        let has_crossings = starts.len() > 2;
        if !has_crossings && noon_altitude <= solar::SUNRISE_ALTITUDE {
            return vec![(TimePhase::Night, 0.0)];
        }
        starts
    }

    fn angles(&self, time: SimTime) -> (f64, f64) {
        let a = solar::solar_position(&self.observer, time.day_of_year, time.seconds);
        (a.altitude, a.azimuth)
    }

    fn label(&self) -> &'static str {
        "astronomical"
    }
}

/// Build the configured schedule strategy.
pub fn build_sun_source(config: &ScheduleConfig) -> Box<dyn SunSource> {
    match *config {
        ScheduleConfig::Fixed => Box::new(FixedSchedule::new()),
        ScheduleConfig::Astronomical {
            latitude,
            longitude,
            utc_offset_hours,
        } => Box::new(AstronomicalSchedule::new(latitude, longitude, utc_offset_hours)),
    }
}
