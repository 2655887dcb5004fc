use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub interval_minutes: u64,
    /// Static coordinate override; kept as raw strings and parsed at
    /// resolve time so a malformed value surfaces as a coordinate failure.
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub database_url: String,
    pub error_log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("OPENWEATHER_API_KEY").expect("OPENWEATHER_API_KEY must be set"),
            base_url: env::var("OPENWEATHER_BASE_URL").unwrap_or_else(|_| {
                "https://api.openweathermap.org/data/2.5/weather".to_string()
            }),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            interval_minutes: env::var("WEATHER_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            latitude: env::var("LATITUDE").ok(),
            longitude: env::var("LONGITUDE").ok(),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            error_log_file: env::var("ERROR_LOG_FILE")
                .unwrap_or_else(|_| "errors.log".to_string())
                .into(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Inter-cycle delay; never shorter than one minute.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minutes(minutes: u64) -> Config {
        Config {
            api_key: "key".into(),
            base_url: "http://example.invalid".into(),
            request_timeout_seconds: 5,
            interval_minutes: minutes,
            latitude: None,
            longitude: None,
            database_url: "postgres://localhost/weather".into(),
            error_log_file: "errors.log".into(),
        }
    }

    #[test]
    fn poll_interval_has_a_one_minute_floor() {
        assert_eq!(config_with_minutes(0).poll_interval(), Duration::from_secs(60));
        assert_eq!(config_with_minutes(10).poll_interval(), Duration::from_secs(600));
    }
}
