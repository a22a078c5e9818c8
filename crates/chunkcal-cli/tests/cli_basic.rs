//! Basic CLI E2E tests.
//!
//! Tests invoke the built `chunkcal` binary and verify outputs.

mod common;

use common::*;

#[test]
fn test_config_defaults_and_set() {
    let home = home();
    assert_eq!(run_cli_success(home.path(), &["config", "get", "user.name"]).trim(), "me");

    run_cli_success(home.path(), &["config", "set", "scheduler.dependency_aware", "true"]);
    let listed = parse_json(&run_cli_success(home.path(), &["config", "list"]));
    assert_eq!(listed["scheduler"]["dependency_aware"], true);

    let stderr = run_cli_failure(home.path(), &["config", "get", "display.nope"]);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_user_id_is_created_once() {
    let home = home();
    run_cli_success(home.path(), &["project", "list"]);
    let first = run_cli_success(home.path(), &["config", "get", "user.id"]);
    run_cli_success(home.path(), &["project", "list"]);
    let second = run_cli_success(home.path(), &["config", "get", "user.id"]);
    assert!(!first.trim().is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_prefs_set_and_show() {
    let home = home();
    run_cli_success(
        home.path(),
        &["prefs", "set", "--timezone", "Europe/Berlin", "--work-start", "08:00", "--evening", "20"],
    );
    let shown = parse_json(&run_cli_success(home.path(), &["prefs", "show"]));
    assert_eq!(shown["effective"]["timezone"], "Europe/Berlin");
    assert_eq!(shown["effective"]["workStartHour"], 8);
    assert_eq!(shown["effective"]["workEndHour"], 17);
    assert_eq!(shown["effective"]["energyProfile"]["evening"], 20);
    assert_eq!(shown["effective"]["energyProfile"]["morning"], 80);
}

#[test]
fn test_prefs_reject_bad_values() {
    let home = home();
    let stderr = run_cli_failure(home.path(), &["prefs", "set", "--timezone", "Mars/Base"]);
    assert!(stderr.contains("unknown timezone"));
    run_cli_failure(home.path(), &["prefs", "set", "--work-end", "noon"]);
    run_cli_failure(home.path(), &["prefs", "set", "--morning", "150"]);
}

#[test]
fn test_auto_schedule_reference_day() {
    let home = home();
    run_cli_success(home.path(), &["prefs", "set", "--evening", "20"]);
    let task = seed_task(home.path());
    let a = add_chunk(home.path(), &task, "A", "high", 0);
    let b = add_chunk(home.path(), &task, "B", "med", 1);
    let c = add_chunk(home.path(), &task, "C", "low", 2);

    let out = parse_json(&run_cli_success(
        home.path(),
        &["schedule", "auto", "--date", "2025-03-03", "--json"],
    ));
    let placements = out["placements"].as_array().unwrap();
    let start_of = |id: &str| {
        placements
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["scheduledStart"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(start_of(&a), "2025-03-03T09:00:00Z");
    assert_eq!(start_of(&b), "2025-03-03T11:00:00Z");
    assert_eq!(start_of(&c), "2025-03-03T16:00:00Z");
    assert_eq!(out["unplaced"].as_array().unwrap().len(), 0);

    let day = parse_json(&run_cli_success(
        home.path(),
        &["schedule", "show", "--date", "2025-03-03", "--json"],
    ));
    assert_eq!(day.as_array().unwrap().len(), 3);

    let pool = parse_json(&run_cli_success(home.path(), &["chunk", "list", "--unscheduled", "--json"]));
    assert!(pool.as_array().unwrap().is_empty());
}

#[test]
fn test_dry_run_saves_nothing() {
    let home = home();
    let task = seed_task(home.path());
    add_chunk(home.path(), &task, "Only", "med", 0);

    let stdout = run_cli_success(
        home.path(),
        &["schedule", "auto", "--date", "2025-03-03", "--dry-run"],
    );
    assert!(stdout.contains("1 placed, 0 unplaced"));

    let pool = parse_json(&run_cli_success(home.path(), &["chunk", "list", "--unscheduled", "--json"]));
    assert_eq!(pool.as_array().unwrap().len(), 1);
}

#[test]
fn test_auto_schedule_without_chunks_fails() {
    let home = home();
    let stderr = run_cli_failure(home.path(), &["schedule", "auto", "--date", "2025-03-03"]);
    assert!(stderr.contains("No chunks to schedule"));
}

#[test]
fn test_inverted_work_window_fails() {
    let home = home();
    run_cli_success(home.path(), &["prefs", "set", "--work-start", "18:00", "--work-end", "08:00"]);
    let task = seed_task(home.path());
    add_chunk(home.path(), &task, "Late", "low", 0);

    let stderr = run_cli_failure(home.path(), &["schedule", "auto", "--date", "2025-03-03"]);
    assert!(stderr.contains("Invalid work window"));
}

#[test]
fn test_bad_date_fails() {
    let home = home();
    let stderr = run_cli_failure(home.path(), &["schedule", "show", "--date", "03/03/2025"]);
    assert!(stderr.contains("expected YYYY-MM-DD"));
}

#[test]
fn test_manual_schedule_can_double_book() {
    let home = home();
    let task = seed_task(home.path());
    let first = add_chunk(home.path(), &task, "First", "med", 0);
    let second = add_chunk(home.path(), &task, "Second", "med", 1);

    for id in [&first, &second] {
        run_cli_success(
            home.path(),
            &["chunk", "schedule", id, "2025-03-03T09:00:00Z", "2025-03-03T09:10:00Z"],
        );
    }

    let day = parse_json(&run_cli_success(
        home.path(),
        &["schedule", "show", "--date", "2025-03-03", "--json"],
    ));
    let starts: Vec<_> = day
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["schedule"]["start"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(starts, vec!["2025-03-03T09:00:00Z", "2025-03-03T09:00:00Z"]);
}

#[test]
fn test_unschedule_and_status() {
    let home = home();
    let task = seed_task(home.path());
    let id = add_chunk(home.path(), &task, "Flip", "high", 0);

    run_cli_success(home.path(), &["schedule", "auto", "--date", "2025-03-03", "--chunk", &id]);
    let shown = parse_json(&run_cli_success(home.path(), &["chunk", "show", &id]));
    assert_eq!(shown["schedule"]["start"], "2025-03-03T09:00:00Z");

    run_cli_success(home.path(), &["chunk", "unschedule", &id]);
    let shown = parse_json(&run_cli_success(home.path(), &["chunk", "show", &id]));
    assert!(shown["schedule"].is_null());

    run_cli_success(home.path(), &["chunk", "status", &id, "done"]);
    let pool = parse_json(&run_cli_success(home.path(), &["chunk", "list", "--unscheduled", "--json"]));
    assert!(pool.as_array().unwrap().is_empty());
}

#[test]
fn test_unknown_ids_fail() {
    let home = home();
    run_cli_failure(home.path(), &["task", "create", "no-such-project", "Orphan"]);
    run_cli_failure(home.path(), &["chunk", "add", "no-such-task", "Orphan"]);
    let stderr = run_cli_failure(home.path(), &["chunk", "unschedule", "no-such-chunk"]);
    assert!(stderr.contains("Chunk not found"));
}

#[test]
fn test_dependency_aware_starts_dependents_later() {
    let home = home();
    let task = seed_task(home.path());
    let research = add_chunk(home.path(), &task, "Research", "low", 0);
    let write = created_id(&run_cli_success(
        home.path(),
        &["chunk", "add", &task, "Write", "--energy", "high", "--order", "1", "--dep", &research],
    ));

    let out = parse_json(&run_cli_success(
        home.path(),
        &["schedule", "auto", "--date", "2025-03-03", "--dependency-aware", "--dry-run", "--json"],
    ));
    let placements = out["placements"].as_array().unwrap();
    let start_of = |id: &str| {
        placements
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["scheduledStart"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(start_of(&research), "2025-03-03T15:00:00Z");
    assert_eq!(start_of(&write), "2025-03-03T15:30:00Z");
}

#[test]
fn test_repeated_chunk_flag_places_once() {
    let home = home();
    let task = seed_task(home.path());
    let id = add_chunk(home.path(), &task, "Once", "med", 0);

    let stdout = run_cli_success(
        home.path(),
        &["schedule", "auto", "--date", "2025-03-03", "--chunk", &id, "--chunk", &id],
    );
    assert!(stdout.contains("1 placed, 0 unplaced"));
}
