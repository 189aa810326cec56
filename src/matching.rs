//! Moteur d'appariement employé ↔ créneau.
//!
//! Une [`SlotQuery`] décrit complètement un créneau (service, heure, jour de
//! semaine, semaine du mois, jour du mois). [`matches`] est une fonction pure
//! des règles et compteurs de l'employé et de la requête.

use crate::calendar::ShiftDay;
use crate::clock::ClockTime;
use crate::error::SchedError;
use crate::model::{MealPeriod, Worker};
use crate::rule::{Availability, Rule, Selector};
use tracing::trace;

/// Attributs d'un créneau, toujours complets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    meal: MealPeriod,
    time: ClockTime,
    weekday: u8,
    week_of_month: u8,
    day_of_month: u8,
}

impl SlotQuery {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Requête correspondant à un créneau existant du calendrier.
    pub fn for_slot(day: &ShiftDay, meal: MealPeriod, time: ClockTime) -> Self {
        Self {
            meal,
            time,
            weekday: day.weekday(),
            week_of_month: day.week_of_month(),
            day_of_month: day.day_of_month(),
        }
    }

    pub fn meal(&self) -> MealPeriod {
        self.meal
    }
    pub fn time(&self) -> ClockTime {
        self.time
    }
    pub fn weekday(&self) -> u8 {
        self.weekday
    }
    pub fn week_of_month(&self) -> u8 {
        self.week_of_month
    }
    pub fn day_of_month(&self) -> u8 {
        self.day_of_month
    }
}

/// Construction d'une requête hors calendrier (CLI, tests). Chaque champ est
/// obligatoire ; un oubli donne `MalformedQuery`.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    meal: Option<MealPeriod>,
    time: Option<ClockTime>,
    weekday: Option<u8>,
    week_of_month: Option<u8>,
    day_of_month: Option<u8>,
}

impl QueryBuilder {
    pub fn meal(mut self, meal: MealPeriod) -> Self {
        self.meal = Some(meal);
        self
    }
    pub fn time(mut self, time: ClockTime) -> Self {
        self.time = Some(time);
        self
    }
    pub fn weekday(mut self, weekday: u8) -> Self {
        self.weekday = Some(weekday);
        self
    }
    pub fn week_of_month(mut self, week: u8) -> Self {
        self.week_of_month = Some(week);
        self
    }
    pub fn day_of_month(mut self, day: u8) -> Self {
        self.day_of_month = Some(day);
        self
    }

    pub fn build(self) -> Result<SlotQuery, SchedError> {
        let meal = self
            .meal
            .ok_or(SchedError::MalformedQuery("meal period is required"))?;
        let time = self
            .time
            .ok_or(SchedError::MalformedQuery("start time is required"))?;
        let weekday = self
            .weekday
            .ok_or(SchedError::MalformedQuery("weekday is required"))?;
        let week_of_month = self
            .week_of_month
            .ok_or(SchedError::MalformedQuery("week of month is required"))?;
        let day_of_month = self
            .day_of_month
            .ok_or(SchedError::MalformedQuery("day of month is required"))?;

        if weekday > 6 {
            return Err(SchedError::out_of_range("weekday", weekday));
        }
        if !(1..=5).contains(&week_of_month) {
            return Err(SchedError::out_of_range("week", week_of_month));
        }
        if !(1..=31).contains(&day_of_month) {
            return Err(SchedError::out_of_range("day", day_of_month));
        }

        Ok(SlotQuery {
            meal,
            time,
            weekday,
            week_of_month,
            day_of_month,
        })
    }
}

/// `true` si l'employé peut tenir le créneau décrit par `query`.
///
/// Toutes les règles sont parcourues : un quota atteint ou une exclusion
/// rejette immédiatement, sinon il faut au moins une disponibilité positive.
/// Un employé sans règle n'est jamais retenu.
pub fn matches(worker: &Worker, query: &SlotQuery) -> bool {
    let mut allowed = false;
    for rule in worker.rules() {
        match rule {
            Rule::MonthlyCap { max } => {
                if worker.shifts_this_month() + 1 > *max {
                    trace!(worker = %worker.id, max, "monthly cap reached");
                    return false;
                }
            }
            Rule::WeeklyCap { max } => {
                if worker.shifts_in_week(query.week_of_month) + 1 > *max {
                    trace!(worker = %worker.id, max, week = query.week_of_month, "weekly cap reached");
                    return false;
                }
            }
            Rule::Exclude { .. } => {
                if excludes(rule, query) {
                    trace!(worker = %worker.id, day = query.day_of_month, "day excluded");
                    return false;
                }
            }
            Rule::Availability(av) => allowed |= availability_admits(av, query),
        }
    }
    allowed
}

/// Comme [`matches`] mais sans les quotas : exclusions et disponibilités seules.
pub fn admits(worker: &Worker, query: &SlotQuery) -> bool {
    if worker.rules().iter().any(|rule| excludes(rule, query)) {
        return false;
    }
    worker.rules().iter().any(|rule| match rule {
        Rule::Availability(av) => availability_admits(av, query),
        _ => false,
    })
}

fn meal_matches(rule_meal: Option<MealPeriod>, query_meal: MealPeriod) -> bool {
    rule_meal.map_or(true, |m| m == query_meal)
}

fn excludes(rule: &Rule, query: &SlotQuery) -> bool {
    match rule {
        Rule::Exclude { days, meal } => {
            meal_matches(*meal, query.meal) && days.contains(&query.day_of_month)
        }
        _ => false,
    }
}

fn availability_admits(av: &Availability, query: &SlotQuery) -> bool {
    if !meal_matches(av.meal, query.meal) {
        return false;
    }
    let day_ok = match &av.selector {
        Selector::ByDayOfMonth { days } => days.contains(&query.day_of_month),
        Selector::ByWeekday { weekdays, weeks } => {
            weekdays.contains(&query.weekday)
                && weeks
                    .as_ref()
                    .map_or(true, |w| w.contains(&query.week_of_month))
        }
        Selector::ByWeekOfMonth { weeks, weekdays } => {
            weeks.contains(&query.week_of_month)
                && weekdays
                    .as_ref()
                    .map_or(true, |d| d.contains(&query.weekday))
        }
    };
    day_ok && av.not_before <= query.time
}
