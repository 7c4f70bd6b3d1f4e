use serde::{Deserialize, Serialize};
use stratus_core::types::GradientKind;

/// Solar period of the day. Declaration order is the cyclical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimePhase {
    Night,
    AstronomicalDawn,
    NauticalDawn,
    Dawn,
    Sunrise,
    Morning,
    SolarNoon,
    Afternoon,
    GoldenHour,
    Sunset,
    Dusk,
    NauticalDusk,
}

impl TimePhase {
    pub const ALL: [TimePhase; 12] = [
        TimePhase::Night,
        TimePhase::AstronomicalDawn,
        TimePhase::NauticalDawn,
        TimePhase::Dawn,
        TimePhase::Sunrise,
        TimePhase::Morning,
        TimePhase::SolarNoon,
        TimePhase::Afternoon,
        TimePhase::GoldenHour,
        TimePhase::Sunset,
        TimePhase::Dusk,
        TimePhase::NauticalDusk,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Following phase, wrapping from the last back to `Night`.
    pub fn next(self) -> TimePhase {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            TimePhase::Night => "night",
            TimePhase::AstronomicalDawn => "astronomical-dawn",
            TimePhase::NauticalDawn => "nautical-dawn",
            TimePhase::Dawn => "dawn",
            TimePhase::Sunrise => "sunrise",
            TimePhase::Morning => "morning",
            TimePhase::SolarNoon => "solar-noon",
            TimePhase::Afternoon => "afternoon",
            TimePhase::GoldenHour => "golden-hour",
            TimePhase::Sunset => "sunset",
            TimePhase::Dusk => "dusk",
            TimePhase::NauticalDusk => "nautical-dusk",
        }
    }

    /// Parse a phase name. Case, dashes, underscores and spaces are ignored,
    /// so "solar-noon", "solar_noon" and "solarNoon" all match.
    pub fn from_name(name: &str) -> Option<TimePhase> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let phase = match key.as_str() {
            "night" | "deepnight" => TimePhase::Night,
            "astronomicaldawn" => TimePhase::AstronomicalDawn,
            "nauticaldawn" => TimePhase::NauticalDawn,
            "dawn" | "civildawn" => TimePhase::Dawn,
            "sunrise" => TimePhase::Sunrise,
            "morning" => TimePhase::Morning,
            "solarnoon" | "noon" => TimePhase::SolarNoon,
            "afternoon" => TimePhase::Afternoon,
            "goldenhour" => TimePhase::GoldenHour,
            "sunset" => TimePhase::Sunset,
            "dusk" | "civildusk" => TimePhase::Dusk,
            "nauticaldusk" => TimePhase::NauticalDusk,
            _ => return None,
        };
        Some(phase)
    }

    /// Daytime phases get a radial gradient centered on the sun;
    /// night and twilight phases a top-to-bottom linear one.
    pub fn gradient_kind(self) -> GradientKind {
        match self {
            TimePhase::Sunrise
            | TimePhase::Morning
            | TimePhase::SolarNoon
            | TimePhase::Afternoon
            | TimePhase::GoldenHour
            | TimePhase::Sunset => GradientKind::Radial,
            _ => GradientKind::Linear,
        }
    }

    pub fn is_dawn(self) -> bool {
        matches!(
            self,
            TimePhase::AstronomicalDawn | TimePhase::NauticalDawn | TimePhase::Dawn | TimePhase::Sunrise
        )
    }

    pub fn is_dusk(self) -> bool {
        matches!(self, TimePhase::Sunset | TimePhase::Dusk | TimePhase::NauticalDusk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_covers_all_phases() {
        let mut phase = TimePhase::Night;
        let mut seen = Vec::new();
        for _ in 0..TimePhase::ALL.len() {
            seen.push(phase);
            phase = phase.next();
        }
        assert_eq!(phase, TimePhase::Night, "cycle must wrap back to night");
        assert_eq!(seen, TimePhase::ALL.to_vec());
    }

    #[test]
    fn test_name_roundtrip_and_aliases() {
        for phase in TimePhase::ALL {
            assert_eq!(TimePhase::from_name(phase.name()), Some(phase));
        }
        assert_eq!(TimePhase::from_name("solarNoon"), Some(TimePhase::SolarNoon));
        assert_eq!(TimePhase::from_name("GOLDEN_HOUR"), Some(TimePhase::GoldenHour));
        assert_eq!(TimePhase::from_name("deep night"), Some(TimePhase::Night));
        assert_eq!(TimePhase::from_name("teatime"), None);
    }

    #[test]
    fn test_gradient_topology() {
        assert_eq!(TimePhase::SolarNoon.gradient_kind(), GradientKind::Radial);
        assert_eq!(TimePhase::Night.gradient_kind(), GradientKind::Linear);
        assert_eq!(TimePhase::Dusk.gradient_kind(), GradientKind::Linear);
        assert_eq!(TimePhase::NauticalDusk.gradient_kind(), GradientKind::Linear);
    }
}
