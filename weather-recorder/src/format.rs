use common::models::Weather;

/// Render the one-line-per-fact message printed after a successful cycle.
/// Sun times are shown in the city-local offset.
pub fn format_weather(weather: &Weather) -> String {
    format!(
        "{}, температура {}°C, {}\nВосход: {}\nЗакат: {}",
        weather.city,
        weather.temperature,
        weather.weather_type,
        weather.sunrise.format("%H:%M"),
        weather.sunset.format("%H:%M"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};
    use common::models::WeatherType;

    fn at_offset(timestamp: i64, offset_seconds: i32) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(offset_seconds).unwrap())
    }

    #[test]
    fn renders_city_temperature_and_local_sun_times() {
        let weather = Weather {
            temperature: 21,
            weather_type: WeatherType::Clear,
            sunrise: at_offset(1_700_000_000, 10800),
            sunset: at_offset(1_700_040_000, 10800),
            city: "Kirov".to_string(),
        };
        let rendered = format_weather(&weather);
        assert!(rendered.starts_with("Kirov, температура 21°C, Ясно"));
        assert!(rendered.contains("Восход: "));
        assert!(rendered.contains("Закат: "));
    }
}
