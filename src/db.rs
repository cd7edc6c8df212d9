use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::AppError;

pub type DbPool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let options: SqliteConnectOptions = database_url.parse::<SqliteConnectOptions>()?;
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options.create_if_missing(true))
        .await?;
    Ok(pool)
}
