use logtrail_core::AppError;
use logtrail_infrastructure::connect_sqlite;
use sqlx::SqlitePool;

const MAX_CONNECTIONS: u32 = 5;

pub async fn connect_and_migrate(database_url: &str) -> Result<SqlitePool, AppError> {
    connect_sqlite(database_url, MAX_CONNECTIONS).await
}
