use std::fmt;

use chrono::{DateTime, FixedOffset};

/// Closed set of weather categories reported by OpenWeather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherType {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Clear,
    Fog,
    Clouds,
}

impl WeatherType {
    /// Canonical display string; this exact value is also persisted in
    /// `responses.weather_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "Гроза",
            Self::Drizzle => "Изморозь",
            Self::Rain => "Дождь",
            Self::Snow => "Снег",
            Self::Clear => "Ясно",
            Self::Fog => "Туман",
            Self::Clouds => "Облачно",
        }
    }

    /// Map an OpenWeather condition code to a category.
    ///
    /// Exact code 800 (clear sky) is checked before the prefix table so it
    /// is not swallowed by the `80x` cloud group. After that the first
    /// matching prefix wins.
    pub fn from_code(code: i64) -> Option<Self> {
        if code == 800 {
            return Some(Self::Clear);
        }
        const GROUPS: [(&str, WeatherType); 6] = [
            ("2", WeatherType::Thunderstorm),
            ("3", WeatherType::Drizzle),
            ("5", WeatherType::Rain),
            ("6", WeatherType::Snow),
            ("7", WeatherType::Fog),
            ("80", WeatherType::Clouds),
        ];
        let code = code.to_string();
        GROUPS
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix))
            .map(|(_, weather_type)| *weather_type)
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed observation. Built once per successful fetch, never mutated.
///
/// Sunrise and sunset are absolute instants re-expressed in the city-local
/// UTC offset reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    /// Degrees Celsius, rounded half away from zero (`f64::round`).
    pub temperature: i32,
    pub weather_type: WeatherType,
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
    pub city: String,
}

/// A latitude/longitude pair; both values are always present together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_800_is_clear_not_clouds() {
        assert_eq!(WeatherType::from_code(800), Some(WeatherType::Clear));
        assert_eq!(WeatherType::from_code(801), Some(WeatherType::Clouds));
        assert_eq!(WeatherType::from_code(804), Some(WeatherType::Clouds));
    }

    #[test]
    fn prefix_groups_match() {
        assert_eq!(WeatherType::from_code(200), Some(WeatherType::Thunderstorm));
        assert_eq!(WeatherType::from_code(232), Some(WeatherType::Thunderstorm));
        assert_eq!(WeatherType::from_code(301), Some(WeatherType::Drizzle));
        assert_eq!(WeatherType::from_code(521), Some(WeatherType::Rain));
        assert_eq!(WeatherType::from_code(616), Some(WeatherType::Snow));
        assert_eq!(WeatherType::from_code(741), Some(WeatherType::Fog));
    }

    #[test]
    fn unknown_codes_do_not_match() {
        assert_eq!(WeatherType::from_code(100), None);
        assert_eq!(WeatherType::from_code(900), None);
        assert_eq!(WeatherType::from_code(0), None);
    }

    #[test]
    fn display_matches_persisted_value() {
        assert_eq!(WeatherType::Clear.to_string(), "Ясно");
        assert_eq!(WeatherType::Rain.as_str(), "Дождь");
    }
}
