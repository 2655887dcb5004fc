use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use common::errors::WeatherError;
use common::models::{Coordinates, Weather, WeatherType};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::instrument;

use crate::config::Config;

/// Client for the OpenWeather "current weather" endpoint.
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.request_timeout(),
        )
    }

    /// Endpoint string recorded with every request row.
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse the current weather. Returns the parsed record plus
    /// the raw payload, which is archived alongside the parsed fields.
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn fetch(&self, coordinates: Coordinates) -> Result<(Weather, Value), WeatherError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", "ru".to_string()),
            ])
            .send()
            .await
            .map_err(WeatherError::from_transport)?;

        if response.status() != StatusCode::OK {
            return Err(WeatherError::service(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(WeatherError::from_transport)?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|err| WeatherError::service(format!("body is not valid JSON: {err}")))?;

        let weather = parse_weather(&payload)?;
        Ok((weather, payload))
    }
}

/// Extract a [`Weather`] from the raw payload. Each field is extracted
/// independently; the first failure wins and no partial record escapes.
pub fn parse_weather(payload: &Value) -> Result<Weather, WeatherError> {
    Ok(Weather {
        temperature: parse_temperature(payload)?,
        weather_type: parse_weather_type(payload)?,
        sunrise: parse_suntime(payload, "sunrise")?,
        sunset: parse_suntime(payload, "sunset")?,
        city: parse_city(payload)?,
    })
}

fn parse_temperature(payload: &Value) -> Result<i32, WeatherError> {
    let temp = payload["main"]["temp"]
        .as_f64()
        .ok_or_else(|| WeatherError::service("missing or non-numeric main.temp"))?;
    // round half away from zero: 20.5 -> 21, -20.5 -> -21
    Ok(temp.round() as i32)
}

fn parse_weather_type(payload: &Value) -> Result<WeatherType, WeatherError> {
    let code = payload["weather"][0]["id"]
        .as_i64()
        .ok_or_else(|| WeatherError::service("missing or non-numeric weather[0].id"))?;
    WeatherType::from_code(code)
        .ok_or_else(|| WeatherError::service(format!("unknown weather code {code}")))
}

fn parse_city_offset(payload: &Value) -> Result<FixedOffset, WeatherError> {
    let seconds = payload["timezone"]
        .as_i64()
        .ok_or_else(|| WeatherError::service("missing or non-integer timezone"))?;
    let seconds = i32::try_from(seconds)
        .map_err(|_| WeatherError::service(format!("timezone offset {seconds} out of range")))?;
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| WeatherError::service(format!("timezone offset {seconds} out of range")))
}

fn parse_suntime(payload: &Value, key: &str) -> Result<DateTime<FixedOffset>, WeatherError> {
    let offset = parse_city_offset(payload)?;
    let timestamp = payload["sys"][key]
        .as_i64()
        .ok_or_else(|| WeatherError::service(format!("missing or non-integer sys.{key}")))?;
    let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or_else(|| WeatherError::service(format!("sys.{key} timestamp out of range")))?;
    Ok(utc.with_timezone(&offset))
}

fn parse_city(payload: &Value) -> Result<String, WeatherError> {
    match payload["name"].as_str() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(WeatherError::service("missing or empty city name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "main": {"temp": 20.6},
            "weather": [{"id": 800}],
            "timezone": 10800,
            "sys": {"sunrise": 1_700_000_000, "sunset": 1_700_040_000},
            "name": "Kirov"
        })
    }

    #[test]
    fn parses_a_complete_payload() {
        let weather = parse_weather(&sample_payload()).unwrap();
        assert_eq!(weather.temperature, 21);
        assert_eq!(weather.weather_type, WeatherType::Clear);
        assert_eq!(weather.city, "Kirov");
        // instants are preserved, re-expressed at +03:00
        assert_eq!(weather.sunrise.timestamp(), 1_700_000_000);
        assert_eq!(weather.sunset.timestamp(), 1_700_040_000);
        assert_eq!(weather.sunrise.offset().local_minus_utc(), 10800);
        assert_eq!(weather.sunset.offset().local_minus_utc(), 10800);
    }

    #[test]
    fn temperature_rounds_half_away_from_zero() {
        let mut payload = sample_payload();
        payload["main"]["temp"] = json!(20.5);
        assert_eq!(parse_weather(&payload).unwrap().temperature, 21);
        payload["main"]["temp"] = json!(-20.5);
        assert_eq!(parse_weather(&payload).unwrap().temperature, -21);
        payload["main"]["temp"] = json!(20.4);
        assert_eq!(parse_weather(&payload).unwrap().temperature, 20);
    }

    #[test]
    fn code_521_is_rain() {
        let mut payload = sample_payload();
        payload["weather"][0]["id"] = json!(521);
        assert_eq!(parse_weather(&payload).unwrap().weather_type, WeatherType::Rain);
    }

    #[test]
    fn each_missing_field_fails_without_a_partial_record() {
        let removals: [(&str, fn(&mut Value)); 6] = [
            ("main.temp", |p| {
                p["main"].as_object_mut().unwrap().remove("temp");
            }),
            ("weather[0].id", |p| {
                p["weather"][0].as_object_mut().unwrap().remove("id");
            }),
            ("timezone", |p| {
                p.as_object_mut().unwrap().remove("timezone");
            }),
            ("sys.sunrise", |p| {
                p["sys"].as_object_mut().unwrap().remove("sunrise");
            }),
            ("sys.sunset", |p| {
                p["sys"].as_object_mut().unwrap().remove("sunset");
            }),
            ("name", |p| {
                p.as_object_mut().unwrap().remove("name");
            }),
        ];

        for (field, remove) in removals {
            let mut payload = sample_payload();
            remove(&mut payload);
            let err = parse_weather(&payload).unwrap_err();
            assert!(
                matches!(err, WeatherError::Service(_)),
                "removing {field} should be a service error, got {err:?}"
            );
        }
    }

    #[test]
    fn malformed_fields_fail() {
        let mut payload = sample_payload();
        payload["main"]["temp"] = json!("warm");
        assert!(matches!(
            parse_weather(&payload).unwrap_err(),
            WeatherError::Service(_)
        ));

        let mut payload = sample_payload();
        payload["weather"][0]["id"] = json!(999);
        assert!(matches!(
            parse_weather(&payload).unwrap_err(),
            WeatherError::Service(_)
        ));

        let mut payload = sample_payload();
        payload["name"] = json!("");
        assert!(matches!(
            parse_weather(&payload).unwrap_err(),
            WeatherError::Service(_)
        ));
    }

    #[test]
    fn out_of_range_timezone_offset_fails() {
        let mut payload = sample_payload();
        payload["timezone"] = json!(100_000);
        assert!(matches!(
            parse_weather(&payload).unwrap_err(),
            WeatherError::Service(_)
        ));

        let mut payload = sample_payload();
        payload["timezone"] = json!(-14 * 3600);
        let weather = parse_weather(&payload).unwrap();
        assert_eq!(weather.sunrise.offset().local_minus_utc(), -14 * 3600);
    }
}
