use std::time::Instant;

use chrono::Utc;
use common::errors::RecordError;
use tracing::error;

use crate::api_client::OpenWeatherClient;
use crate::db::repository::UnitOfWorkFactory;
use crate::format::format_weather;
use crate::geo::CoordinatesSource;
use crate::record::RecordService;

/// One full fetch-parse-record iteration.
///
/// Taxonomy failures are recorded and turned into the user-facing message;
/// only persistence failures escape as errors.
pub async fn run_once<S, F>(
    geo: &S,
    client: &OpenWeatherClient,
    records: &RecordService<F>,
) -> Result<String, RecordError>
where
    S: CoordinatesSource + ?Sized,
    F: UnitOfWorkFactory,
{
    let requested_at = Utc::now();
    let endpoint = client.endpoint();

    let coordinates = match geo.resolve().await {
        Ok(coordinates) => coordinates,
        Err(err) => {
            records
                .record_error(requested_at, None, endpoint, &err, None)
                .await?;
            return Ok(err.user_message().to_string());
        }
    };

    let started = Instant::now();
    match client.fetch(coordinates).await {
        Ok((weather, payload)) => {
            let duration_ms = elapsed_ms(started);
            records
                .record_success(
                    requested_at,
                    coordinates,
                    endpoint,
                    duration_ms,
                    &weather,
                    &payload,
                )
                .await?;
            Ok(format_weather(&weather))
        }
        Err(err) => {
            let duration_ms = elapsed_ms(started);
            if err.is_api_failure() {
                error!(
                    error = %err,
                    error_type = err.error_type(),
                    "OpenWeather request failed"
                );
            }
            records
                .record_error(requested_at, Some(coordinates), endpoint, &err, Some(duration_ms))
                .await?;
            Ok(err.user_message().to_string())
        }
    }
}

fn elapsed_ms(started: Instant) -> i32 {
    i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX)
}
