mod support;

use support::TestData;

#[test]
fn export_immersion_to_stdout() {
    let data = TestData::new();
    data.json(&["immersion", "add", "--date", "2024-06-02", "--minutes", "45"]);
    data.json(&[
        "immersion", "add", "--date", "2024-06-01", "--minutes", "30", "--notes", "podcast, ep 3",
    ]);

    data.cmd()
        .args(["export", "immersion"])
        .assert()
        .success()
        .stdout("date,minutes,notes\n2024-06-01,30,\"podcast, ep 3\"\n2024-06-02,45,\n");
}

#[test]
fn export_task_to_file() {
    let data = TestData::new();
    data.json(&["task", "log", "toeic_reading", "--value", "12", "--date", "2024-06-01"]);

    let out = data.path().join("out").join("reading.csv");
    let report = data.json(&[
        "export",
        "task:toeic_reading",
        "--output",
        out.to_str().expect("utf8 path"),
    ]);
    assert_eq!(report["rows"], 1);
    assert_eq!(report["store"], "task:toeic_reading");

    let written = std::fs::read_to_string(&out).expect("read export");
    assert_eq!(written, "date,value,notes\n2024-06-01,12,\n");
}

#[test]
fn export_json_embeds_csv() {
    let data = TestData::new();
    data.json(&["checklist", "add", "--date", "2024-06-01", "--shadowing"]);

    let report = data.json(&["export", "checklist"]);
    assert_eq!(report["rows"], 1);
    assert_eq!(
        report["csv"],
        "date,shadowing,vocabulary,reading,total_completed,notes\n2024-06-01,true,false,false,1,\n"
    );
}

#[test]
fn export_rejects_unknown_store() {
    let data = TestData::new();

    data.json_error(&["export", "journal"], 2);
    data.json_error(&["export", "task:ghost"], 2);
}
