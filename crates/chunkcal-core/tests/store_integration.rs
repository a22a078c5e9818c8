//! Integration tests for the chunk store together with the scheduler.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chunkcal_core::scheduler::SchedulingSession;
use chunkcal_core::{Chunk, ChunkStore, Energy, Project, StoreError, Task, UserPreferences};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

/// Store with one user, one project and one task; returns the task id.
fn seeded(store: &ChunkStore, user_id: &str) -> String {
    store.ensure_user(user_id, user_id).unwrap();
    let project = Project::new(user_id, "Launch");
    store.create_project(&project).unwrap();
    let task = Task::new(&project.id, "Write announcement");
    store.create_task(&task).unwrap();
    task.id
}

fn add_chunk(store: &ChunkStore, task_id: &str, title: &str, energy: Energy, order: i32) -> Chunk {
    let chunk = Chunk::new(task_id, title, 10)
        .with_energy(energy)
        .with_order_index(order);
    store.create_chunk(&chunk).unwrap();
    chunk
}

#[test]
fn read_schedule_persist_roundtrip() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    add_chunk(&store, &task_id, "Draft", Energy::High, 0);
    add_chunk(&store, &task_id, "Edit", Energy::Med, 1);
    add_chunk(&store, &task_id, "Post", Energy::Low, 2);

    let chunks = store.list_unscheduled("u1").unwrap();
    let prefs = store.get_preferences("u1").unwrap();
    let outcome = SchedulingSession::new(&prefs).run(&chunks, day()).unwrap();
    let applied = store.apply_placements("u1", &outcome.placements).unwrap();

    assert_eq!(applied, 3);
    assert!(store.list_unscheduled("u1").unwrap().is_empty());

    let scheduled = store.list_scheduled_on("u1", day(), chrono_tz::Tz::UTC).unwrap();
    assert_eq!(scheduled.len(), 3);
    for chunk in &scheduled {
        let placement = outcome.placement_for(&chunk.id).unwrap();
        assert_eq!(chunk.scheduled_start(), Some(placement.scheduled_start));
        assert_eq!(chunk.scheduled_end(), Some(placement.scheduled_end));
    }
}

#[test]
fn stored_preferences_drive_the_session() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    let chunk = add_chunk(&store, &task_id, "Deep work", Energy::High, 0);

    let prefs = UserPreferences {
        timezone: Some("Asia/Kolkata".into()),
        ..Default::default()
    };
    store.set_preferences("u1", &prefs).unwrap();

    let chunks = store.get_owned_chunks("u1", &[chunk.id.clone()]).unwrap();
    let outcome = SchedulingSession::new(&store.get_preferences("u1").unwrap())
        .run(&chunks, day())
        .unwrap();
    // 09:00 IST
    assert_eq!(
        outcome.placements[0].scheduled_start,
        Utc.with_ymd_and_hms(2025, 3, 3, 3, 30, 0).unwrap()
    );
}

#[test]
fn manual_placement_can_double_book() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    let a = add_chunk(&store, &task_id, "A", Energy::High, 0);
    let b = add_chunk(&store, &task_id, "B", Energy::High, 1);

    let nine = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
    store.schedule_manually("u1", &a.id, nine, nine + Duration::minutes(10)).unwrap();
    store.schedule_manually("u1", &b.id, nine, nine + Duration::minutes(10)).unwrap();

    let scheduled = store.list_scheduled_on("u1", day(), chrono_tz::Tz::UTC).unwrap();
    assert_eq!(scheduled.len(), 2);
    assert!(scheduled.iter().all(|c| c.scheduled_start() == Some(nine)));
}

#[test]
fn two_sessions_for_the_same_day_can_double_book() {
    // Nothing serializes "read, schedule, apply" across calls.
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    let a = add_chunk(&store, &task_id, "A", Energy::High, 0);
    let b = add_chunk(&store, &task_id, "B", Energy::High, 1);

    let session = SchedulingSession::new(&UserPreferences::default());
    let first = session.run(&store.get_chunks(&[a.id.clone()]).unwrap(), day()).unwrap();
    let second = session.run(&store.get_chunks(&[b.id.clone()]).unwrap(), day()).unwrap();
    store.apply_placements("u1", &first.placements).unwrap();
    store.apply_placements("u1", &second.placements).unwrap();

    let a = store.get_chunk(&a.id).unwrap().unwrap();
    let b = store.get_chunk(&b.id).unwrap().unwrap();
    assert_eq!(a.scheduled_start(), b.scheduled_start());
}

#[test]
fn foreign_chunks_are_rejected_everywhere() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "owner");
    store.ensure_user("other", "other").unwrap();
    let chunk = add_chunk(&store, &task_id, "Private", Energy::Med, 0);

    let outcome = SchedulingSession::new(&UserPreferences::default())
        .run(&[chunk.clone()], day())
        .unwrap();

    assert!(matches!(
        store.apply_placements("other", &outcome.placements),
        Err(StoreError::NotOwned { .. })
    ));
    assert!(matches!(
        store.unschedule("other", &chunk.id),
        Err(StoreError::NotOwned { .. })
    ));
    assert!(matches!(
        store.get_owned_chunks("other", &[chunk.id.clone()]),
        Err(StoreError::NotOwned { .. })
    ));
    assert!(store.list_unscheduled("other").unwrap().is_empty());
    assert!(!store.get_chunk(&chunk.id).unwrap().unwrap().is_scheduled());
}

#[test]
fn unschedule_returns_chunk_to_the_pool() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    let chunk = add_chunk(&store, &task_id, "Retry", Energy::Low, 0);

    let outcome = SchedulingSession::new(&UserPreferences::default())
        .run(&[chunk.clone()], day())
        .unwrap();
    store.apply_placements("u1", &outcome.placements).unwrap();
    assert!(store.list_unscheduled("u1").unwrap().is_empty());

    store.unschedule("u1", &chunk.id).unwrap();
    let pool = store.list_unscheduled("u1").unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].id, chunk.id);
}

#[test]
fn missing_ids_are_reported() {
    let store = ChunkStore::open_memory().unwrap();
    seeded(&store, "u1");
    assert!(matches!(
        store.get_chunks(&["nope".to_string()]),
        Err(StoreError::ChunkNotFound(id)) if id == "nope"
    ));
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunkcal.db");

    let chunk_id = {
        let store = ChunkStore::open_at(&path).unwrap();
        let task_id = seeded(&store, "u1");
        add_chunk(&store, &task_id, "Persist me", Energy::High, 0).id
    };

    let store = ChunkStore::open_at(&path).unwrap();
    let chunk = store.get_chunk(&chunk_id).unwrap().unwrap();
    assert_eq!(chunk.title, "Persist me");
    assert_eq!(chunk.energy, Energy::High);
    assert_eq!(store.chunk_owner(&chunk_id).unwrap().as_deref(), Some("u1"));
}

#[test]
fn repeated_chunk_id_is_placed_once() {
    let store = ChunkStore::open_memory().unwrap();
    let task_id = seeded(&store, "u1");
    let chunk = add_chunk(&store, &task_id, "Once", Energy::High, 0);

    let ids = vec![chunk.id.clone(), chunk.id.clone()];
    let chunks = store.get_owned_chunks("u1", &ids).unwrap();
    assert_eq!(chunks.len(), 1);

    let outcome = SchedulingSession::new(&UserPreferences::default())
        .run(&chunks, day())
        .unwrap();
    assert_eq!(outcome.placed_count(), 1);
    assert_eq!(store.apply_placements("u1", &outcome.placements).unwrap(), 1);
}
