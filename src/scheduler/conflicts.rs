use super::{Conflict, Scheduler};
use crate::matching::{admits, SlotQuery};
use crate::model::WEEKS_PER_MONTH;

pub(super) fn audit(scheduler: &Scheduler) -> Vec<Conflict> {
    let mut out = Vec::new();

    for day in scheduler.calendar.days() {
        for (meal, time, assignee) in day.all_slots() {
            let day_num = day.day_of_month();
            let Some(id) = assignee else {
                out.push(Conflict::EmptySlot {
                    day: day_num,
                    meal,
                    time,
                });
                continue;
            };
            let query = SlotQuery::for_slot(day, meal, time);
            let available = scheduler
                .roster
                .find(id)
                .is_some_and(|w| admits(w, &query));
            if !available {
                out.push(Conflict::Unavailable {
                    worker: id.clone(),
                    day: day_num,
                    meal,
                    time,
                });
            }
        }
    }

    for worker in scheduler.roster.iter() {
        if let Some(max) = worker.monthly_cap() {
            if worker.shifts_this_month() > max {
                out.push(Conflict::MonthlyCapExceeded {
                    worker: worker.id.clone(),
                    assigned: worker.shifts_this_month(),
                    max,
                });
            }
        }
        if let Some(max) = worker.weekly_cap() {
            for week in 1..=WEEKS_PER_MONTH as u8 {
                let assigned = worker.shifts_in_week(week);
                if assigned > max {
                    out.push(Conflict::WeeklyCapExceeded {
                        worker: worker.id.clone(),
                        week,
                        assigned,
                        max,
                    });
                }
            }
        }
    }

    out
}
