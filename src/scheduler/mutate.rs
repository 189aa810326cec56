use super::{SchedError, Scheduler};
use crate::calendar::DaySelector;
use crate::clock::ClockTime;
use crate::model::{MealPeriod, Worker, WorkerId};
use tracing::debug;

pub(super) fn remove_worker(
    scheduler: &mut Scheduler,
    id: &WorkerId,
) -> Result<Worker, SchedError> {
    if scheduler.roster.find(id).is_none() {
        return Err(SchedError::UnknownWorker(id.as_str().to_string()));
    }
    let released = scheduler
        .calendar
        .release_worker(id, &mut scheduler.roster)?;
    debug!(worker = %id, released, "worker removed");
    scheduler
        .roster
        .remove(id)
        .ok_or_else(|| SchedError::UnknownWorker(id.as_str().to_string()))
}

pub(super) fn create_slots(
    scheduler: &mut Scheduler,
    selector: &DaySelector,
    meal: MealPeriod,
    times: &[ClockTime],
) -> Result<usize, SchedError> {
    let mut created = 0;
    for day in scheduler.calendar.days_for(selector)? {
        for time in times {
            if scheduler.calendar.add_slot(day, meal, *time)? {
                created += 1;
            }
        }
    }
    debug!(?selector, %meal, created, "slots created");
    Ok(created)
}

/// Les créneaux absents sont ignorés.
pub(super) fn delete_slots(
    scheduler: &mut Scheduler,
    selector: &DaySelector,
    meal: MealPeriod,
    times: &[ClockTime],
) -> Result<usize, SchedError> {
    let mut deleted = 0;
    for (day, time) in existing_slots(scheduler, selector, meal, Some(times))? {
        scheduler
            .calendar
            .remove_slot(day, meal, time, &mut scheduler.roster)?;
        deleted += 1;
    }
    debug!(?selector, %meal, deleted, "slots deleted");
    Ok(deleted)
}

/// Assignation manuelle : les règles de l'employé ne sont pas consultées
/// (voir l'audit pour les écarts).
pub(super) fn assign_slots(
    scheduler: &mut Scheduler,
    selector: &DaySelector,
    meal: MealPeriod,
    times: &[ClockTime],
    worker: &WorkerId,
) -> Result<usize, SchedError> {
    if scheduler.roster.find(worker).is_none() {
        return Err(SchedError::UnknownWorker(worker.as_str().to_string()));
    }
    let mut assigned = 0;
    for (day, time) in existing_slots(scheduler, selector, meal, Some(times))? {
        scheduler
            .calendar
            .assign(day, meal, time, Some(worker), &mut scheduler.roster)?;
        assigned += 1;
    }
    debug!(worker = %worker, ?selector, %meal, assigned, "slots assigned");
    Ok(assigned)
}

/// `times = None` vide tous les créneaux du service sur les jours visés.
pub(super) fn clear_slots(
    scheduler: &mut Scheduler,
    selector: &DaySelector,
    meal: MealPeriod,
    times: Option<&[ClockTime]>,
) -> Result<usize, SchedError> {
    let mut cleared = 0;
    for (day, time) in existing_slots(scheduler, selector, meal, times)? {
        scheduler
            .calendar
            .assign(day, meal, time, None, &mut scheduler.roster)?;
        cleared += 1;
    }
    debug!(?selector, %meal, cleared, "slots cleared");
    Ok(cleared)
}

/// `(jour, heure)` des créneaux existants visés par l'opération.
fn existing_slots(
    scheduler: &Scheduler,
    selector: &DaySelector,
    meal: MealPeriod,
    times: Option<&[ClockTime]>,
) -> Result<Vec<(u8, ClockTime)>, SchedError> {
    let mut out = Vec::new();
    for day_num in scheduler.calendar.days_for(selector)? {
        let Some(day) = scheduler.calendar.day(day_num) else {
            continue;
        };
        match times {
            Some(times) => out.extend(
                times
                    .iter()
                    .filter(|t| day.has_slot(meal, **t))
                    .map(|t| (day_num, *t)),
            ),
            None => out.extend(day.slots(meal).map(|(t, _)| (day_num, t))),
        }
    }
    Ok(out)
}
