use common::tracing::init_tracing;
use tracing::info;
use weather_recorder::api_client::OpenWeatherClient;
use weather_recorder::config::Config;
use weather_recorder::cycle::run_once;
use weather_recorder::db::{self, PgUnitOfWorkFactory};
use weather_recorder::geo::CoordinatesResolver;
use weather_recorder::record::RecordService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_tracing(Some(&config.error_log_file))?;

    let pool = db::create_pool(&config.database_url).await?;
    let records = RecordService::new(PgUnitOfWorkFactory::new(pool));
    let client = OpenWeatherClient::from_config(&config);
    let geo = CoordinatesResolver::from_config(&config);

    info!(
        endpoint = %config.base_url,
        interval_minutes = config.interval_minutes.max(1),
        "Weather recorder starting"
    );

    // One cycle completes fully, persistence included, before the next
    // tick. A recording failure is fatal and stops the loop.
    let mut ticker = tokio::time::interval(config.poll_interval());
    loop {
        ticker.tick().await;
        let message = run_once(&geo, &client, &records).await?;
        println!("{message}");
    }
}
