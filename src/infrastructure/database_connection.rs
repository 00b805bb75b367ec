// Database connection and pool management for the saved-products store.

use std::path::Path;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Opens (and creates, if necessary) the SQLite database at
    /// `database_url` and builds the connection pool.
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = if database_url.starts_with("sqlite://") {
            database_url.trim_start_matches("sqlite://")
        } else if database_url.starts_with("sqlite:") {
            database_url.trim_start_matches("sqlite:")
        } else {
            database_url
        };

        if let Some(parent) = Path::new(db_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if !Path::new(db_path).exists() {
            std::fs::File::create(db_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the saved-products schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let create_saved_products_sql = r#"
            CREATE TABLE IF NOT EXISTS saved_products (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                product TEXT NOT NULL
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_saved_products_owner
            ON saved_products (owner_id, saved_at DESC)
        "#;

        sqlx::query(create_saved_products_sql)
            .execute(&self.pool)
            .await?;
        sqlx::query(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection_and_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let connection = DatabaseConnection::new(&database_url).await?;
        connection.migrate().await?;

        // Migration is idempotent.
        connection.migrate().await?;

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM saved_products")
            .fetch_one(connection.pool())
            .await?;
        assert_eq!(count.0, 0);

        Ok(())
    }
}
