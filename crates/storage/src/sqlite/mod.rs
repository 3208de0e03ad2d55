use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{CooldownStore, Storage};

mod cooldown_repo;
mod mapping;
mod migrate;

/// Lockout table in a `SQLite` file.
///
/// One lesson's lockout is read or written at a time, so the pool keeps a
/// single long-lived connection. That connection also keeps a shared-cache
/// in-memory database alive for as long as the repository exists.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the lockout database at `database_url`.
    ///
    /// A second process (e.g. `status` while a session runs) may hold the
    /// file; writers wait up to five seconds for it.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in ["PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"] {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        tracing::debug!(database_url, "opened lockout database");
        Ok(Self { pool })
    }

    /// Create or upgrade the `cooldown_locks` table.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Lockouts kept in `SQLite`, migrated and ready to use.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let cooldowns: Arc<dyn CooldownStore> = Arc::new(repo);
        Ok(Self { cooldowns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
