#![forbid(unsafe_code)]
use creneaux::{
    io, Availability, ClockTime, DaySelector, JsonStorage, MealPeriod, Planning, Rule, RunOutcome,
    SchedError, Scheduler, Storage, Worker,
};
use std::fs;
use tempfile::tempdir;

fn t(s: &str) -> ClockTime {
    s.parse().unwrap()
}

fn sample() -> Scheduler {
    let mut s = Scheduler::new(10, 2025).unwrap();
    s.create_slots(&DaySelector::days([1, 2, 6]), MealPeriod::Lunch, &[t("11:00")])
        .unwrap();
    s.create_slots(&DaySelector::days([1]), MealPeriod::Dinner, &[t("19:00")])
        .unwrap();
    s.add_worker(
        Worker::new("alice", 1)
            .with_rule(Availability::every_day(t("10:00")).into())
            .unwrap()
            .with_rule(Rule::weekly_cap(2))
            .unwrap(),
    )
    .unwrap();
    s.add_worker(
        Worker::new("bob", 2)
            .with_rule(
                Availability::by_weekday([0, 2, 3], None, t("18:00"))
                    .unwrap()
                    .for_meal(MealPeriod::Dinner)
                    .into(),
            )
            .unwrap(),
    )
    .unwrap();
    assert_eq!(s.run(None).unwrap().outcome, RunOutcome::Complete);
    s
}

#[test]
fn planning_round_trips_through_json_storage() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("planning.json")).unwrap();
    assert!(!storage.exists());

    let s = sample();
    storage.save(&s.to_planning()).unwrap();
    assert!(storage.exists());

    let loaded = Scheduler::from_planning(storage.load().unwrap()).unwrap();
    assert_eq!(loaded.calendar(), s.calendar());
    assert_eq!(loaded.roster(), s.roster());
}

#[test]
fn counters_are_rebuilt_from_the_calendar() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("planning.json");
    let storage = JsonStorage::open(&path).unwrap();
    let s = sample();
    storage.save(&s.to_planning()).unwrap();

    let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    raw["roster"][0]["shifts_this_month"] = 42.into();
    raw["roster"][0]["shifts_per_week"] = serde_json::json!([9, 9, 9, 9, 9]);
    fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let loaded = Scheduler::from_planning(storage.load().unwrap()).unwrap();
    let alice = loaded.worker("alice").unwrap();
    assert_eq!(alice.shifts_this_month(), s.worker("alice").unwrap().shifts_this_month());
    assert_eq!(alice.shifts_per_week(), s.worker("alice").unwrap().shifts_per_week());
}

#[test]
fn rule_json_shape_is_tagged() {
    let rule: Rule = Availability::by_weekday([0, 1], None, t("10:00"))
        .unwrap()
        .for_meal(MealPeriod::Lunch)
        .into();
    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "kind": "availability",
            "meal": "lunch",
            "not_before": "10:00",
            "selector": {"by": "weekday", "weekdays": [0, 1], "weeks": null}
        })
    );
    let cap = serde_json::to_value(Rule::monthly_cap(3)).unwrap();
    assert_eq!(cap, serde_json::json!({"kind": "monthly_cap", "max": 3}));
}

#[test]
fn loading_rejects_inconsistent_state() {
    let planning = sample().to_planning();

    let mut raw = serde_json::to_value(&planning).unwrap();
    raw["calendar"]["first_weekday"] = 0.into();
    let bad: Planning = serde_json::from_value(raw).unwrap();
    assert!(matches!(
        Scheduler::from_planning(bad),
        Err(SchedError::CorruptState(_))
    ));

    let mut raw = serde_json::to_value(&planning).unwrap();
    raw["roster"][1]["name"] = "alice".into();
    let bad: Planning = serde_json::from_value(raw).unwrap();
    assert!(matches!(
        Scheduler::from_planning(bad),
        Err(SchedError::DuplicateWorker(_))
    ));

    let mut raw = serde_json::to_value(&planning).unwrap();
    raw["calendar"]["days"][0]["lunch"]["11:00"] = "ghost".into();
    let bad: Planning = serde_json::from_value(raw).unwrap();
    assert!(matches!(
        Scheduler::from_planning(bad),
        Err(SchedError::UnknownWorker(_))
    ));

    let mut raw = serde_json::to_value(&planning).unwrap();
    raw["roster"][0]["rules"] = serde_json::json!([
        {"kind": "weekly_cap", "max": 1},
        {"kind": "weekly_cap", "max": 2}
    ]);
    let bad: Planning = serde_json::from_value(raw).unwrap();
    assert!(matches!(
        Scheduler::from_planning(bad),
        Err(SchedError::DuplicateCap { kind: "weekly", .. })
    ));
}

#[test]
fn schedule_csv_lists_every_slot_in_calendar_order() {
    let s = sample();
    let mut out = Vec::new();
    io::export_schedule_csv(&mut out, s.calendar()).unwrap();
    let csv = String::from_utf8(out).unwrap();
    insta::assert_snapshot!(csv, @r###"
    day,weekday,meal,time,worker
    1,Wed,lunch,11:00,alice
    1,Wed,dinner,19:00,bob
    2,Thu,lunch,11:00,alice
    6,Mon,lunch,11:00,alice
    "###);
}

#[test]
fn unassigned_slots_export_an_empty_worker() {
    let mut s = Scheduler::new(2, 2026).unwrap();
    s.create_slots(&DaySelector::days([28]), MealPeriod::Dinner, &[t("7:30pm")])
        .unwrap();
    let mut out = Vec::new();
    io::export_schedule_csv(&mut out, s.calendar()).unwrap();
    let csv = String::from_utf8(out).unwrap();
    assert_eq!(csv, "day,weekday,meal,time,worker\n28,Sat,dinner,19:30,\n");
}

#[test]
fn import_workers_from_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("workers.csv");
    fs::write(&path, "name,priority\nalice,1\nbob,\ncarol,-2\n").unwrap();

    let workers = io::import_workers_csv(&path).unwrap();
    let summary: Vec<(&str, i32)> = workers.iter().map(|w| (w.id.as_str(), w.priority)).collect();
    assert_eq!(summary, vec![("alice", 1), ("bob", 0), ("carol", -2)]);

    fs::write(&path, "name,priority\ndave,high\n").unwrap();
    assert!(io::import_workers_csv(&path).is_err());
}
