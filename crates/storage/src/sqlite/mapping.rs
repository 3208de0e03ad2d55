use lesson_core::model::{CooldownRecord, LessonId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("lesson_id overflow".into()))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    u64::try_from(v)
        .map(LessonId::new)
        .map_err(|_| StorageError::Serialization("lesson_id sign overflow".into()))
}

pub(crate) fn map_cooldown_row(row: &sqlx::sqlite::SqliteRow) -> Result<CooldownRecord, StorageError> {
    let lesson_id = lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?;
    let locked_until_ms: i64 = row.try_get("locked_until_ms").map_err(ser)?;
    CooldownRecord::from_millis(lesson_id, locked_until_ms).ok_or_else(|| {
        StorageError::Serialization(format!("invalid locked_until_ms: {locked_until_ms}"))
    })
}
