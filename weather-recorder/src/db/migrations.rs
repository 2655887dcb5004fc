use sqlx::PgPool;
use tracing::info;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            id BIGSERIAL PRIMARY KEY,
            requested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            endpoint TEXT NOT NULL,
            status TEXT NOT NULL,
            error_type TEXT,
            error_message TEXT,
            duration_ms INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responses (
            id BIGSERIAL PRIMARY KEY,
            request_id BIGINT NOT NULL REFERENCES requests(id) ON DELETE CASCADE,
            received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            city TEXT,
            temperature INTEGER,
            weather_type TEXT,
            sunrise TIMESTAMPTZ,
            sunset TIMESTAMPTZ,
            payload JSONB
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
