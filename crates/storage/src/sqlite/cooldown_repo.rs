use async_trait::async_trait;
use lesson_core::model::{CooldownRecord, LessonId};

use super::SqliteRepository;
use super::mapping::{lesson_id_to_i64, map_cooldown_row};
use crate::repository::{CooldownStore, StorageError};

#[async_trait]
impl CooldownStore for SqliteRepository {
    async fn get(&self, lesson_id: LessonId) -> Result<Option<CooldownRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT lesson_id, locked_until_ms
            FROM cooldown_locks
            WHERE lesson_id = ?1
            ",
        )
        .bind(lesson_id_to_i64(lesson_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_cooldown_row).transpose()
    }

    async fn set(&self, record: &CooldownRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cooldown_locks (lesson_id, locked_until_ms)
            VALUES (?1, ?2)
            ON CONFLICT(lesson_id) DO UPDATE SET
                locked_until_ms = excluded.locked_until_ms
            ",
        )
        .bind(lesson_id_to_i64(record.lesson_id)?)
        .bind(record.locked_until_ms())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        tracing::debug!(
            lesson_id = %record.lesson_id,
            locked_until_ms = record.locked_until_ms(),
            "stored cooldown lock"
        );
        Ok(())
    }

    async fn delete(&self, lesson_id: LessonId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM cooldown_locks WHERE lesson_id = ?1")
            .bind(lesson_id_to_i64(lesson_id)?)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(res.rows_affected() > 0)
    }
}
