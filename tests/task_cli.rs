mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestData;

fn task_ids(list: &Value) -> Vec<String> {
    list["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn fresh_directory_seeds_default_tasks() {
    let data = TestData::new();

    let list = data.json(&["task", "list"]);
    assert_eq!(
        task_ids(&list),
        ["immersion", "toeic_shadowing", "toeic_vocabulary", "toeic_reading"]
    );
    assert!(data.path().join("tasks.json").exists());
    assert!(data.path().join("tasks").join("toeic_reading.jsonl").exists());
}

#[test]
fn seeding_can_be_disabled() {
    let data = TestData::new();
    data.write_config("[catalog]\nseed_defaults = false\n")
        .expect("write config");

    let list = data.json(&["task", "list", "--all"]);
    assert!(task_ids(&list).is_empty());
}

#[test]
fn add_assigns_unique_ids() {
    let data = TestData::new();

    let first = data.json(&["task", "add", "Grammar Drills", "--unit", "pages", "--target", "300"]);
    assert_eq!(first["task"]["id"], "grammar_drills");
    assert_eq!(first["task"]["unit"], "pages");
    assert_eq!(first["task"]["enabled"], true);

    let second = data.json(&["task", "add", "Grammar Drills", "--unit", "ページ", "--target", "10"]);
    assert_eq!(second["task"]["id"], "grammar_drills_1");
    assert_eq!(second["task"]["unit"], "pages");
}

#[test]
fn add_rejects_invalid_definitions() {
    let data = TestData::new();

    data.json_error(&["task", "add", "   ", "--unit", "pages", "--target", "10"], 2);
    data.json_error(&["task", "add", "Drills", "--unit", "lightyears", "--target", "10"], 2);
    data.json_error(&["task", "add", "Drills", "--unit", "pages", "--target", "0"], 2);
    data.json_error(
        &["task", "add", "Drills", "--unit", "pages", "--target", "1000001"],
        2,
    );
    let long_name = "x".repeat(51);
    data.json_error(&["task", "add", &long_name, "--unit", "pages", "--target", "10"], 2);

    let list = data.json(&["task", "list", "--all"]);
    assert_eq!(task_ids(&list).len(), 4);
}

#[test]
fn log_and_stats_for_custom_task() {
    let data = TestData::new();
    data.json(&["task", "add", "Novel", "--unit", "pages", "--target", "480"]);

    data.json(&["task", "log", "novel", "--value", "20", "--date", "2024-06-08"]);
    data.json(&["task", "log", "novel", "--value", "40", "--date", "2024-06-09"]);
    data.json(&["task", "log", "novel", "--value", "60"]);

    let stats = data.json(&["task", "stats", "novel"]);
    assert_eq!(stats["task"]["id"], "novel");
    assert_eq!(stats["total"], 120.0);
    assert_eq!(stats["average_daily"], 40.0);
    assert_eq!(stats["progress_percentage"], 25.0);
    assert_eq!(stats["milestone"], "momentum");
    assert_eq!(stats["current_streak"], 3);
    assert_eq!(stats["best_day"]["value"], 60.0);
    assert_eq!(stats["worst_day"]["date"], "2024-06-08");
    assert_eq!(stats["estimated_completion"], "2024-06-19");
}

#[test]
fn zero_values_do_not_extend_streaks() {
    let data = TestData::new();
    data.json(&["task", "add", "Flashcards", "--unit", "count", "--target", "100"]);

    data.json(&["task", "log", "flashcards", "--value", "5", "--date", "2024-06-08"]);
    data.json(&["task", "log", "flashcards", "--value", "0", "--date", "2024-06-09"]);
    data.json(&["task", "log", "flashcards", "--value", "5", "--date", "2024-06-10"]);

    let stats = data.json(&["task", "stats", "flashcards"]);
    assert_eq!(stats["days_logged"], 3);
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["longest_streak"], 1);
}

#[test]
fn log_rejects_negative_values() {
    let data = TestData::new();

    data.json_error(&["task", "log", "toeic_reading", "--value=-3"], 2);
    let entries = data.json(&["task", "entries", "toeic_reading"]);
    assert!(entries["entries"].as_array().expect("entries").is_empty());
}

#[test]
fn unknown_task_is_not_found() {
    let data = TestData::new();

    let err = data.json_error(&["task", "log", "ghost", "--value", "1"], 2);
    assert_eq!(err["error"]["details"]["task_id"], "ghost");
    assert_eq!(err["next_steps"][0], "studylog task list --all");

    data.json_error(&["task", "stats", "ghost"], 2);
    data.json_error(&["task", "rm", "ghost"], 2);
    data.json_error(&["task", "update", "ghost", "--target", "5"], 2);
    assert!(!data.path().join("tasks").join("ghost.jsonl").exists());
}

#[test]
fn update_changes_fields_and_enabled_state() {
    let data = TestData::new();

    let updated = data.json(&[
        "task",
        "update",
        "toeic_reading",
        "--name",
        "Reading sets",
        "--target",
        "500",
        "--disable",
    ]);
    assert_eq!(updated["task"]["name"], "Reading sets");
    assert_eq!(updated["task"]["target"], 500.0);
    assert_eq!(updated["task"]["enabled"], false);
    assert!(updated["task"]["updated_at"].is_string());

    let enabled = data.json(&["task", "list"]);
    assert!(!task_ids(&enabled).contains(&"toeic_reading".to_string()));

    let all = data.json(&["task", "list", "--all"]);
    assert!(task_ids(&all).contains(&"toeic_reading".to_string()));

    data.json(&["task", "update", "toeic_reading", "--enable"]);
    let enabled = data.json(&["task", "list"]);
    assert!(task_ids(&enabled).contains(&"toeic_reading".to_string()));
}

#[test]
fn update_without_changes_is_rejected() {
    let data = TestData::new();
    data.json_error(&["task", "update", "toeic_reading"], 2);
}

#[test]
fn rm_purges_logged_values() {
    let data = TestData::new();
    data.json(&["task", "add", "Novel", "--unit", "pages", "--target", "400"]);
    data.json(&["task", "log", "novel", "--value", "20"]);
    assert!(data.path().join("tasks").join("novel.jsonl").exists());

    let removed = data.json(&["task", "rm", "novel"]);
    assert_eq!(removed["task"]["id"], "novel");
    assert!(!data.path().join("tasks").join("novel.jsonl").exists());

    data.json_error(&["task", "entries", "novel"], 2);

    data.json(&["task", "add", "Novel", "--unit", "pages", "--target", "400"]);
    let entries = data.json(&["task", "entries", "novel"]);
    assert!(entries["entries"].as_array().expect("entries").is_empty());
}

#[test]
fn unlog_removes_single_day() {
    let data = TestData::new();
    data.json(&["task", "log", "toeic_shadowing", "--value", "1", "--date", "2024-06-09"]);
    data.json(&["task", "log", "toeic_shadowing", "--value", "1", "--date", "2024-06-10"]);

    let removed = data.json(&["task", "unlog", "toeic_shadowing", "2024-06-09"]);
    assert_eq!(removed["removed"], true);
    let again = data.json(&["task", "unlog", "toeic_shadowing", "2024-06-09"]);
    assert_eq!(again["removed"], false);

    let entries = data.json(&["task", "entries", "toeic_shadowing"]);
    assert_eq!(entries["total"], 1.0);
}

#[test]
fn human_list_shows_disabled_marker() {
    let data = TestData::new();
    data.json(&["task", "update", "toeic_vocabulary", "--disable"]);

    data.cmd()
        .args(["task", "list", "--all"])
        .assert()
        .success()
        .stdout(contains("toeic_vocabulary  Vocabulary test  target 73000 questions  (disabled)"));
}
