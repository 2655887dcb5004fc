pub mod memory;
pub mod migrations;
pub mod postgres;
pub mod repository;

use sqlx::PgPool;

pub use postgres::PgUnitOfWorkFactory;
pub use repository::{RequestRow, RequestStatus, ResponseRow, UnitOfWork, UnitOfWorkFactory, WeatherRepository};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}
