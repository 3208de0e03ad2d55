use async_trait::async_trait;
use lesson_core::model::{CooldownRecord, LessonId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable key-value port for per-lesson lockouts.
///
/// One record per lesson id. Reads and writes for a single lesson are never
/// concurrent within one process, so adapters only need single-key atomicity.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Fetch the lockout for a lesson, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, lesson_id: LessonId) -> Result<Option<CooldownRecord>, StorageError>;

    /// Insert or replace the lockout for `record.lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn set(&self, record: &CooldownRecord) -> Result<(), StorageError>;

    /// Remove the lockout for a lesson. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, lesson_id: LessonId) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cooldowns: Arc<Mutex<HashMap<LessonId, CooldownRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cooldowns: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CooldownStore for InMemoryRepository {
    async fn get(&self, lesson_id: LessonId) -> Result<Option<CooldownRecord>, StorageError> {
        let guard = self
            .cooldowns
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&lesson_id).copied())
    }

    async fn set(&self, record: &CooldownRecord) -> Result<(), StorageError> {
        let mut guard = self
            .cooldowns
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.lesson_id, *record);
        Ok(())
    }

    async fn delete(&self, lesson_id: LessonId) -> Result<bool, StorageError> {
        let mut guard = self
            .cooldowns
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(&lesson_id).is_some())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub cooldowns: Arc<dyn CooldownStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let cooldowns: Arc<dyn CooldownStore> = Arc::new(InMemoryRepository::new());
        Self { cooldowns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lesson_core::time::fixed_now;

    #[tokio::test]
    async fn stores_one_record_per_lesson() {
        let repo = InMemoryRepository::new();
        let lesson = LessonId::new(5);

        let first = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(1));
        let second = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(24));
        repo.set(&first).await.unwrap();
        repo.set(&second).await.unwrap();

        assert_eq!(repo.get(lesson).await.unwrap(), Some(second));
        assert_eq!(repo.get(LessonId::new(6)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let repo = InMemoryRepository::new();
        let lesson = LessonId::new(5);
        repo.set(&CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(1)))
            .await
            .unwrap();

        assert!(repo.delete(lesson).await.unwrap());
        assert!(!repo.delete(lesson).await.unwrap());
        assert_eq!(repo.get(lesson).await.unwrap(), None);
    }
}
