#![forbid(unsafe_code)]
use creneaux::{ClockTime, DaySelector, MealPeriod, MonthCalendar, Roster, SchedError, Worker, WorkerId};

fn t(s: &str) -> ClockTime {
    s.parse().unwrap()
}

fn roster(names: &[&str]) -> Roster {
    let mut r = Roster::new();
    for (i, name) in names.iter().enumerate() {
        r.add(Worker::new(name, i as i32)).unwrap();
    }
    r
}

#[test]
fn month_shape_from_chrono() {
    let oct = MonthCalendar::new(10, 2025).unwrap();
    assert_eq!(oct.num_days(), 31);
    assert_eq!(oct.first_weekday(), 2);

    let feb = MonthCalendar::new(2, 2024).unwrap();
    assert_eq!(feb.num_days(), 29);
    assert_eq!(feb.first_weekday(), 3);

    let dec = MonthCalendar::new(12, 2025).unwrap();
    assert_eq!(dec.num_days(), 31);

    assert!(matches!(
        MonthCalendar::new(13, 2025),
        Err(SchedError::OutOfRange { field: "month", .. })
    ));
}

#[test]
fn weeks_are_monday_based_rows() {
    let oct = MonthCalendar::new(10, 2025).unwrap();
    let week = |d: u8| oct.day(d).unwrap().week_of_month();
    assert_eq!(week(1), 1);
    assert_eq!(week(5), 1);
    assert_eq!(week(6), 2);
    assert_eq!(week(27), 5);
    assert_eq!(week(31), 5);
    assert_eq!(oct.day(6).unwrap().weekday(), 0);

    // juin 2025 commence un dimanche : le lundi 30 tombe sur une 6e ligne
    let june = MonthCalendar::new(6, 2025).unwrap();
    assert_eq!(june.day(1).unwrap().week_of_month(), 1);
    assert_eq!(june.day(2).unwrap().week_of_month(), 2);
    assert_eq!(june.day(30).unwrap().week_of_month(), 5);
}

#[test]
fn next_empty_slot_walks_days_then_lunch_then_dinner() {
    let mut cal = MonthCalendar::new(10, 2025).unwrap();
    let mut r = roster(&["alice"]);
    let alice = WorkerId::new("alice");
    cal.add_slot(2, MealPeriod::Lunch, t("11:00")).unwrap();
    cal.add_slot(1, MealPeriod::Dinner, t("18:00")).unwrap();
    cal.add_slot(1, MealPeriod::Lunch, t("12:00")).unwrap();
    cal.add_slot(1, MealPeriod::Lunch, t("11:30")).unwrap();

    assert_eq!(cal.next_empty_slot(), Some((1, MealPeriod::Lunch, t("11:30"))));
    cal.assign(1, MealPeriod::Lunch, t("11:30"), Some(&alice), &mut r).unwrap();
    cal.assign(1, MealPeriod::Lunch, t("12:00"), Some(&alice), &mut r).unwrap();
    assert_eq!(cal.next_empty_slot(), Some((1, MealPeriod::Dinner, t("18:00"))));
    cal.assign(1, MealPeriod::Dinner, t("18:00"), Some(&alice), &mut r).unwrap();
    assert_eq!(cal.next_empty_slot(), Some((2, MealPeriod::Lunch, t("11:00"))));
}

#[test]
fn assign_transition_keeps_counters_in_step() {
    let mut cal = MonthCalendar::new(10, 2025).unwrap();
    let mut r = roster(&["alice", "bob"]);
    let (alice, bob) = (WorkerId::new("alice"), WorkerId::new("bob"));
    cal.add_slot(6, MealPeriod::Lunch, t("11:00")).unwrap();

    cal.assign(6, MealPeriod::Lunch, t("11:00"), Some(&alice), &mut r).unwrap();
    cal.assign(6, MealPeriod::Lunch, t("11:00"), Some(&alice), &mut r).unwrap();
    assert_eq!(r.find(&alice).unwrap().shifts_this_month(), 1);
    assert_eq!(r.find(&alice).unwrap().shifts_in_week(2), 1);

    cal.assign(6, MealPeriod::Lunch, t("11:00"), Some(&bob), &mut r).unwrap();
    assert_eq!(r.find(&alice).unwrap().shifts_this_month(), 0);
    assert_eq!(r.find(&bob).unwrap().shifts_per_week(), &[0, 1, 0, 0, 0]);

    cal.assign(6, MealPeriod::Lunch, t("11:00"), None, &mut r).unwrap();
    assert_eq!(r.find(&bob).unwrap().shifts_this_month(), 0);
    assert_eq!(cal.day(6).unwrap().assignee(MealPeriod::Lunch, t("11:00")), Some(None));
}

#[test]
fn failed_assign_changes_nothing() {
    let mut cal = MonthCalendar::new(10, 2025).unwrap();
    let mut r = roster(&["alice"]);
    cal.add_slot(1, MealPeriod::Lunch, t("11:00")).unwrap();
    let (cal_before, r_before) = (cal.clone(), r.clone());

    let err = cal
        .assign(1, MealPeriod::Lunch, t("11:00"), Some(&WorkerId::new("ghost")), &mut r)
        .unwrap_err();
    assert!(matches!(err, SchedError::UnknownWorker(_)));
    let err = cal
        .assign(1, MealPeriod::Dinner, t("19:00"), Some(&WorkerId::new("alice")), &mut r)
        .unwrap_err();
    assert!(matches!(err, SchedError::UnknownSlot { day: 1, .. }));

    assert_eq!(cal, cal_before);
    assert_eq!(r, r_before);
}

#[test]
fn removing_a_slot_releases_its_holder() {
    let mut cal = MonthCalendar::new(10, 2025).unwrap();
    let mut r = roster(&["alice"]);
    let alice = WorkerId::new("alice");
    cal.add_slot(3, MealPeriod::Dinner, t("19:00")).unwrap();
    cal.assign(3, MealPeriod::Dinner, t("19:00"), Some(&alice), &mut r).unwrap();

    cal.remove_slot(3, MealPeriod::Dinner, t("19:00"), &mut r).unwrap();
    assert_eq!(cal.slot_count(), 0);
    assert_eq!(r.find(&alice).unwrap().shifts_this_month(), 0);
}

#[test]
fn completeness_follows_slot_contents() {
    let mut cal = MonthCalendar::new(2, 2026).unwrap();
    let mut r = roster(&["alice"]);
    let alice = WorkerId::new("alice");
    assert!(cal.is_complete());

    assert!(cal.add_slot(28, MealPeriod::Lunch, t("12:00")).unwrap());
    assert!(!cal.add_slot(28, MealPeriod::Lunch, t("12:00")).unwrap());
    assert!(!cal.is_complete());
    assert_eq!(cal.empty_slot_count(), 1);

    cal.assign(28, MealPeriod::Lunch, t("12:00"), Some(&alice), &mut r).unwrap();
    assert!(cal.is_complete());

    cal.clear_all(&mut r).unwrap();
    assert!(!cal.is_complete());
    assert_eq!(r.find(&alice).unwrap().shifts_this_month(), 0);
}

#[test]
fn day_selectors_resolve_against_the_month() {
    let cal = MonthCalendar::new(10, 2025).unwrap();
    assert_eq!(
        cal.days_for(&DaySelector::weekdays([0])).unwrap(),
        vec![6, 13, 20, 27]
    );
    assert_eq!(
        cal.days_for(&DaySelector::days([3, 1, 2])).unwrap(),
        vec![1, 2, 3]
    );
    assert!(matches!(
        cal.days_for(&DaySelector::days([32])),
        Err(SchedError::UnknownDay(32))
    ));
    assert!(matches!(
        cal.days_for(&DaySelector::days([0])),
        Err(SchedError::UnknownDay(0))
    ));
    assert!(matches!(
        cal.days_for(&DaySelector::weekdays([7])),
        Err(SchedError::OutOfRange { field: "weekday", .. })
    ));
}

#[test]
fn calendar_serializes_slots_by_time() {
    let mut cal = MonthCalendar::new(3, 2025).unwrap();
    let mut r = roster(&["alice"]);
    cal.add_slot(1, MealPeriod::Lunch, t("11:00")).unwrap();
    cal.assign(1, MealPeriod::Lunch, t("11:00"), Some(&WorkerId::new("alice")), &mut r)
        .unwrap();
    cal.add_slot(1, MealPeriod::Dinner, t("18:30")).unwrap();

    let json = serde_json::to_value(&cal).unwrap();
    assert_eq!(json["first_weekday"], 5);
    assert_eq!(json["days"][0]["lunch"]["11:00"], "alice");
    assert!(json["days"][0]["dinner"]["18:30"].is_null());

    let back: MonthCalendar = serde_json::from_value(json).unwrap();
    assert_eq!(back, cal);
    back.validate().unwrap();
}
