//! Recherche exhaustive en profondeur avec retour arrière chronologique.
//!
//! Chaque tentative passe par [`MonthCalendar::assign`] ; une branche qui
//! échoue est toujours défaite par la même transition (assignation de
//! `None`), ce qui remet calendrier et compteurs dans l'état exact d'avant
//! la tentative.

use super::{util, RunOutcome, RunReport, SchedError, Scheduler};
use crate::calendar::MonthCalendar;
use crate::matching::{matches, SlotQuery};
use crate::model::Roster;
use tracing::{debug, info, trace};

pub(super) fn run(
    scheduler: &mut Scheduler,
    budget: Option<u64>,
) -> Result<RunReport, SchedError> {
    scheduler.calendar.clear_all(&mut scheduler.roster)?;
    let order = util::priority_order(&scheduler.roster);

    info!(
        month = scheduler.calendar.month(),
        year = scheduler.calendar.year(),
        workers = order.len(),
        slots = scheduler.calendar.slot_count(),
        budget = ?budget,
        "starting schedule search"
    );

    let mut search = Search {
        calendar: &mut scheduler.calendar,
        roster: &mut scheduler.roster,
        order: order.clone(),
        steps: 0,
        backtracks: 0,
    };
    let found = search.solve(1, &order, budget)?;
    let (steps, backtracks) = (search.steps, search.backtracks);

    let outcome = match (found, scheduler.calendar.is_complete()) {
        (true, true) => RunOutcome::Complete,
        (true, false) => RunOutcome::BudgetExhausted,
        (false, _) => RunOutcome::Infeasible,
    };
    info!(?outcome, steps, backtracks, "schedule search finished");

    Ok(RunReport {
        outcome,
        steps,
        backtracks,
    })
}

struct Search<'a> {
    calendar: &'a mut MonthCalendar,
    roster: &'a mut Roster,
    /// Roster complet par priorité, recopié à chaque nouveau jour.
    order: Vec<usize>,
    steps: u64,
    backtracks: u64,
}

impl Search<'_> {
    fn solve(
        &mut self,
        day: u8,
        candidates: &[usize],
        budget: Option<u64>,
    ) -> Result<bool, SchedError> {
        self.steps += 1;

        if self.calendar.is_complete() {
            return Ok(true);
        }
        if day > self.calendar.num_days() {
            return Ok(self.calendar.is_complete());
        }
        if budget == Some(0) {
            debug!(day, "step budget exhausted");
            return Ok(true);
        }

        let Some(shift_day) = self.calendar.day(day) else {
            return Ok(self.calendar.is_complete());
        };
        let Some((meal, time)) = shift_day.next_empty_slot() else {
            let fresh = self.order.clone();
            return self.solve(day + 1, &fresh, budget);
        };
        let query = SlotQuery::for_slot(shift_day, meal, time);

        for (pos, &idx) in candidates.iter().enumerate() {
            let Some(worker) = self.roster.get(idx) else {
                continue;
            };
            if !matches(worker, &query) {
                trace!(worker = %worker.id, day, %meal, %time, "candidate rejected");
                continue;
            }
            let id = worker.id.clone();

            self.calendar
                .assign(day, meal, time, Some(&id), self.roster)?;
            debug!(worker = %id, day, %meal, %time, "tentative assignment");

            let remaining = util::without(candidates, pos);
            if self.solve(day, &remaining, budget.map(|b| b - 1))? {
                return Ok(true);
            }

            self.calendar.assign(day, meal, time, None, self.roster)?;
            self.backtracks += 1;
            debug!(worker = %id, day, %meal, %time, "assignment undone");
        }

        Ok(false)
    }
}
