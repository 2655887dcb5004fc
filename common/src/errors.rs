use thiserror::Error;

/// Closed failure taxonomy for one weather cycle.
///
/// Every failure the cycle can survive maps to exactly one variant; each
/// variant carries fixed machine codes for persistence and a fixed
/// user-facing message. Anything else (notably persistence failures, see
/// [`RecordError`]) is outside the taxonomy and terminates the cycle.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("failed to resolve coordinates")]
    Coordinates,

    #[error("weather request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("failed to connect to the weather service")]
    Connection(#[source] reqwest::Error),

    #[error("weather service returned unusable data: {0}")]
    Service(String),
}

impl WeatherError {
    /// Classify a transport-level failure from the HTTP client.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Connection(err)
        }
    }

    pub fn service(reason: impl Into<String>) -> Self {
        Self::Service(reason.into())
    }

    /// Machine code stored in `requests.error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Coordinates => "coordinates",
            Self::Timeout(_) => "timeout",
            Self::Connection(_) => "connection",
            Self::Service(_) => "api",
        }
    }

    /// Machine code stored in `requests.error_message`.
    pub fn error_message(&self) -> &'static str {
        match self {
            Self::Coordinates => "cant_get_coordinates",
            Self::Timeout(_) => "openweather_timeout",
            Self::Connection(_) => "openweather_connection_error",
            Self::Service(_) => "openweather_error",
        }
    }

    /// Human-readable message printed once per cycle.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Coordinates => "Не удалось получить координаты",
            Self::Timeout(_) => "Таймаут запроса погоды",
            Self::Connection(_) => "Ошибка подключения к сервису погоды",
            Self::Service(_) => "Не удалось получить погоду по координатам",
        }
    }

    /// Coordinate failures are recorded but kept out of the error log.
    pub fn is_api_failure(&self) -> bool {
        !matches!(self, Self::Coordinates)
    }
}

/// Persistence-layer failure. Not part of the cycle taxonomy: recording
/// failures propagate and terminate the process instead of being swallowed.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("database error: {0}")]
    Database(String),
}

impl RecordError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_codes_are_fixed() {
        let service = WeatherError::service("boom");
        assert_eq!(service.error_type(), "api");
        assert_eq!(service.error_message(), "openweather_error");
        assert_eq!(
            service.user_message(),
            "Не удалось получить погоду по координатам"
        );

        let coords = WeatherError::Coordinates;
        assert_eq!(coords.error_type(), "coordinates");
        assert_eq!(coords.error_message(), "cant_get_coordinates");
        assert_eq!(coords.user_message(), "Не удалось получить координаты");
    }

    #[test]
    fn coordinate_failures_skip_the_error_log() {
        assert!(!WeatherError::Coordinates.is_api_failure());
        assert!(WeatherError::service("boom").is_api_failure());
    }
}
