use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

pub type DbPool = Pool<Postgres>;

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
}

fn connect_options(database_url: &str) -> Result<PgConnectOptions, sqlx::Error> {
    Ok(PgConnectOptions::from_str(database_url)?.log_statements(LevelFilter::Debug))
}

pub async fn connect_to_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = pool_options()
        .min_connections(1)
        .connect_with(connect_options(database_url)?)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Pool that opens connections on first use.
#[cfg(test)]
pub fn lazy_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    Ok(pool_options().connect_lazy_with(connect_options(database_url)?))
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
