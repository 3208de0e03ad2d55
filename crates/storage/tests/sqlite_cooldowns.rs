use chrono::Duration;
use lesson_core::model::{CooldownRecord, LessonId};
use lesson_core::time::fixed_now;
use storage::repository::{CooldownStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_round_trips_cooldown_lock() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_cooldown_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let lesson = LessonId::new(41);
    let record = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(24));
    repo.set(&record).await.unwrap();

    let fetched = repo.get(lesson).await.unwrap().expect("record stored");
    assert_eq!(fetched, record);
    assert_eq!(fetched.locked_until_ms(), record.locked_until_ms());
}

#[tokio::test]
async fn sqlite_overwrites_and_deletes_lock() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_cooldown_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // A second migrate must be a no-op.
    repo.migrate().await.expect("migrate twice");

    let lesson = LessonId::new(7);
    let short = CooldownRecord::starting_at(lesson, fixed_now(), Duration::minutes(5));
    let long = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(24));
    repo.set(&short).await.unwrap();
    repo.set(&long).await.unwrap();

    assert_eq!(repo.get(lesson).await.unwrap(), Some(long));
    assert!(repo.delete(lesson).await.unwrap());
    assert!(!repo.delete(lesson).await.unwrap());
    assert_eq!(repo.get(lesson).await.unwrap(), None);
}

#[tokio::test]
async fn storage_facade_uses_sqlite_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_cooldown_facade?mode=memory&cache=shared")
        .await
        .expect("storage");
    let lesson = LessonId::new(3);
    let record = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(1));
    storage.cooldowns.set(&record).await.unwrap();
    assert_eq!(storage.cooldowns.get(lesson).await.unwrap(), Some(record));
}

#[tokio::test]
async fn private_memory_database_survives_between_calls() {
    let storage = Storage::sqlite("sqlite::memory:").await.expect("open");

    let lesson = LessonId::new(12);
    let record = CooldownRecord::starting_at(lesson, fixed_now(), Duration::hours(24));
    storage.cooldowns.set(&record).await.unwrap();

    assert_eq!(storage.cooldowns.get(lesson).await.unwrap(), Some(record));
}
