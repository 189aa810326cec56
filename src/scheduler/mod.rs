mod conflicts;
mod mutate;
mod search;
mod types;
mod util;

pub use types::{Conflict, ConflictKind, RunOutcome, RunReport, SchedError};

use crate::calendar::{DaySelector, MonthCalendar};
use crate::clock::ClockTime;
use crate::matching::{matches, QueryBuilder, SlotQuery};
use crate::model::{MealPeriod, Planning, Roster, Worker, WorkerId, WEEKS_PER_MONTH};
use crate::rule::Rule;
use tracing::warn;

/// Scheduler : possède le roster et le calendrier du mois.
///
/// Toute modification d'une assignation passe par la transition du
/// calendrier, ce qui garde les compteurs des employés cohérents.
#[derive(Debug, Clone)]
pub struct Scheduler {
    roster: Roster,
    calendar: MonthCalendar,
}

impl Scheduler {
    pub fn new(month: u32, year: i32) -> Result<Self, SchedError> {
        Ok(Self {
            roster: Roster::new(),
            calendar: MonthCalendar::new(month, year)?,
        })
    }

    /// Reconstruit un scheduler depuis un état persisté.
    ///
    /// Le calendrier est vérifié, les noms doivent être uniques et les
    /// compteurs sont recalculés en rejouant chaque assignation.
    pub fn from_planning(planning: Planning) -> Result<Self, SchedError> {
        let Planning {
            roster: stored,
            mut calendar,
        } = planning;
        calendar.validate()?;

        let mut roster = Roster::new();
        for worker in stored.into_workers() {
            worker.validate_rules()?;
            roster.add(worker)?;
        }
        let before: Vec<(u32, [u32; WEEKS_PER_MONTH])> = roster
            .iter()
            .map(|w| (w.shifts_this_month(), *w.shifts_per_week()))
            .collect();

        roster.reset_counters();
        for (day, meal, time, id) in calendar.detach_assignments() {
            calendar.assign(day, meal, time, Some(&id), &mut roster)?;
        }

        for (worker, (month, weeks)) in roster.iter().zip(before) {
            if worker.shifts_this_month() != month || *worker.shifts_per_week() != weeks {
                warn!(
                    worker = %worker.id,
                    stored = month,
                    actual = worker.shifts_this_month(),
                    "stored counters disagree with calendar, rebuilt"
                );
            }
        }

        Ok(Self { roster, calendar })
    }

    pub fn to_planning(&self) -> Planning {
        Planning {
            roster: self.roster.clone(),
            calendar: self.calendar.clone(),
        }
    }

    pub fn into_planning(self) -> Planning {
        Planning {
            roster: self.roster,
            calendar: self.calendar,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn calendar(&self) -> &MonthCalendar {
        &self.calendar
    }

    pub fn worker(&self, name: &str) -> Option<&Worker> {
        self.roster.find_by_name(name)
    }

    fn worker_mut(&mut self, id: &WorkerId) -> Result<&mut Worker, SchedError> {
        self.roster
            .find_mut(id)
            .ok_or_else(|| SchedError::UnknownWorker(id.as_str().to_string()))
    }

    pub fn add_worker(&mut self, worker: Worker) -> Result<(), SchedError> {
        worker.validate_rules()?;
        let mut worker = worker;
        worker.reset_counters();
        self.roster.add(worker)
    }

    pub fn add_workers(&mut self, workers: Vec<Worker>) -> Result<(), SchedError> {
        workers.into_iter().try_for_each(|w| self.add_worker(w))
    }

    /// Libère d'abord tous ses créneaux, puis retire l'employé.
    pub fn remove_worker(&mut self, id: &WorkerId) -> Result<Worker, SchedError> {
        mutate::remove_worker(self, id)
    }

    pub fn set_priority(&mut self, id: &WorkerId, priority: i32) -> Result<(), SchedError> {
        self.worker_mut(id)?.priority = priority;
        Ok(())
    }

    pub fn add_rule(&mut self, id: &WorkerId, rule: Rule) -> Result<(), SchedError> {
        self.worker_mut(id)?.add_rule(rule)
    }

    pub fn remove_rule(&mut self, id: &WorkerId, index: usize) -> Result<Rule, SchedError> {
        self.worker_mut(id)?
            .remove_rule(index)
            .ok_or_else(|| SchedError::out_of_range("rule index", index as i64))
    }

    pub fn set_monthly_cap(&mut self, id: &WorkerId, max: u32) -> Result<(), SchedError> {
        self.worker_mut(id)?.set_monthly_cap(max);
        Ok(())
    }

    pub fn set_weekly_cap(&mut self, id: &WorkerId, max: u32) -> Result<(), SchedError> {
        self.worker_mut(id)?.set_weekly_cap(max);
        Ok(())
    }

    /// Crée des créneaux vides ; renvoie le nombre de créneaux nouveaux.
    pub fn create_slots(
        &mut self,
        selector: &DaySelector,
        meal: MealPeriod,
        times: &[ClockTime],
    ) -> Result<usize, SchedError> {
        mutate::create_slots(self, selector, meal, times)
    }

    pub fn delete_slots(
        &mut self,
        selector: &DaySelector,
        meal: MealPeriod,
        times: &[ClockTime],
    ) -> Result<usize, SchedError> {
        mutate::delete_slots(self, selector, meal, times)
    }

    pub fn assign_slots(
        &mut self,
        selector: &DaySelector,
        meal: MealPeriod,
        times: &[ClockTime],
        worker: &WorkerId,
    ) -> Result<usize, SchedError> {
        mutate::assign_slots(self, selector, meal, times, worker)
    }

    pub fn clear_slots(
        &mut self,
        selector: &DaySelector,
        meal: MealPeriod,
        times: Option<&[ClockTime]>,
    ) -> Result<usize, SchedError> {
        mutate::clear_slots(self, selector, meal, times)
    }

    /// L'employé pourrait-il tenir un créneau ayant ces attributs ?
    /// Un champ manquant dans `query` donne `MalformedQuery`.
    pub fn query(&self, worker: &WorkerId, query: QueryBuilder) -> Result<bool, SchedError> {
        let worker = self
            .roster
            .find(worker)
            .ok_or_else(|| SchedError::UnknownWorker(worker.as_str().to_string()))?;
        Ok(matches(worker, &query.build()?))
    }

    /// Même question pour un créneau existant du calendrier.
    pub fn query_slot(
        &self,
        worker: &WorkerId,
        day: u8,
        meal: MealPeriod,
        time: ClockTime,
    ) -> Result<bool, SchedError> {
        let shift_day = self
            .calendar
            .day(day)
            .ok_or(SchedError::UnknownDay(u32::from(day)))?;
        if !shift_day.has_slot(meal, time) {
            return Err(SchedError::UnknownSlot {
                day: u32::from(day),
                meal,
                time: time.to_string(),
            });
        }
        let worker = self
            .roster
            .find(worker)
            .ok_or_else(|| SchedError::UnknownWorker(worker.as_str().to_string()))?;
        Ok(matches(worker, &SlotQuery::for_slot(shift_day, meal, time)))
    }

    /// Vide le calendrier puis cherche un planning complet, en essayant les
    /// employés par priorité croissante (ordre d'insertion à égalité).
    ///
    /// `budget` borne le nombre d'appels récursifs. C'est un crochet de test,
    /// pas un mécanisme de correction : un budget épuisé renvoie
    /// [`RunOutcome::BudgetExhausted`] et le calendrier est alors partiel.
    /// Un échec ([`RunOutcome::Infeasible`]) laisse tous les créneaux vides et
    /// tous les compteurs à zéro.
    pub fn run(&mut self, budget: Option<u64>) -> Result<RunReport, SchedError> {
        search::run(self, budget)
    }

    pub fn is_complete(&self) -> bool {
        self.calendar.is_complete()
    }

    pub fn next_empty_slot(&self) -> Option<(u8, MealPeriod, ClockTime)> {
        self.calendar.next_empty_slot()
    }

    /// Écarts d'un calendrier édité à la main : créneaux vides, employés non
    /// disponibles, quotas dépassés.
    pub fn audit(&self) -> Vec<Conflict> {
        conflicts::audit(self)
    }
}
