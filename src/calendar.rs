use crate::clock::ClockTime;
use crate::error::SchedError;
use crate::model::{MealPeriod, Roster, WorkerId, WEEKS_PER_MONTH};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

type SlotGroup = BTreeMap<ClockTime, Option<WorkerId>>;

/// Jour du mois : créneaux du midi et du soir, indexés par heure de début.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDay {
    day_of_month: u8,
    weekday: u8,
    week_of_month: u8,
    #[serde(default)]
    lunch: SlotGroup,
    #[serde(default)]
    dinner: SlotGroup,
}

impl ShiftDay {
    fn new(day_of_month: u8, weekday: u8, week_of_month: u8) -> Self {
        Self {
            day_of_month,
            weekday,
            week_of_month,
            lunch: SlotGroup::new(),
            dinner: SlotGroup::new(),
        }
    }

    pub fn day_of_month(&self) -> u8 {
        self.day_of_month
    }

    /// Lundi = 0.
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn week_of_month(&self) -> u8 {
        self.week_of_month
    }

    fn group(&self, meal: MealPeriod) -> &SlotGroup {
        match meal {
            MealPeriod::Lunch => &self.lunch,
            MealPeriod::Dinner => &self.dinner,
        }
    }

    fn group_mut(&mut self, meal: MealPeriod) -> &mut SlotGroup {
        match meal {
            MealPeriod::Lunch => &mut self.lunch,
            MealPeriod::Dinner => &mut self.dinner,
        }
    }

    /// Créneaux d'un service par heure croissante.
    pub fn slots(
        &self,
        meal: MealPeriod,
    ) -> impl Iterator<Item = (ClockTime, Option<&WorkerId>)> + '_ {
        self.group(meal).iter().map(|(t, w)| (*t, w.as_ref()))
    }

    /// Tous les créneaux : midi puis soir, par heure croissante.
    pub fn all_slots(
        &self,
    ) -> impl Iterator<Item = (MealPeriod, ClockTime, Option<&WorkerId>)> + '_ {
        MealPeriod::ALL
            .into_iter()
            .flat_map(move |meal| self.slots(meal).map(move |(t, w)| (meal, t, w)))
    }

    pub fn slot_count(&self) -> usize {
        self.lunch.len() + self.dinner.len()
    }

    pub fn has_slot(&self, meal: MealPeriod, time: ClockTime) -> bool {
        self.group(meal).contains_key(&time)
    }

    /// `None` si le créneau n'existe pas, `Some(None)` s'il est libre.
    pub fn assignee(&self, meal: MealPeriod, time: ClockTime) -> Option<Option<&WorkerId>> {
        self.group(meal).get(&time).map(Option::as_ref)
    }

    /// Crée un créneau vide ; renvoie `false` s'il existait déjà.
    pub fn add_slot(&mut self, meal: MealPeriod, time: ClockTime) -> bool {
        let group = self.group_mut(meal);
        if group.contains_key(&time) {
            return false;
        }
        group.insert(time, None);
        true
    }

    /// Supprime un créneau, en libérant d'abord son titulaire.
    pub fn remove_slot(
        &mut self,
        meal: MealPeriod,
        time: ClockTime,
        roster: &mut Roster,
    ) -> Result<(), SchedError> {
        self.assign(meal, time, None, roster)?;
        self.group_mut(meal).remove(&time);
        Ok(())
    }

    /// Premier créneau libre : midi par heure croissante, puis soir.
    pub fn next_empty_slot(&self) -> Option<(MealPeriod, ClockTime)> {
        self.all_slots()
            .find(|(_, _, w)| w.is_none())
            .map(|(meal, time, _)| (meal, time))
    }

    pub fn is_full(&self) -> bool {
        self.next_empty_slot().is_none()
    }

    pub fn assignments_of(&self, worker: &WorkerId) -> Vec<(MealPeriod, ClockTime)> {
        self.all_slots()
            .filter(|(_, _, w)| *w == Some(worker))
            .map(|(meal, time, _)| (meal, time))
            .collect()
    }

    /// Seule transition qui modifie les compteurs des employés.
    ///
    /// L'ancien titulaire (s'il diffère) est décompté, puis le nouveau (s'il
    /// y en a un) est compté pour la semaine de ce jour. Assigner `None` est
    /// l'opération inverse exacte : c'est elle qui sert d'annulation pendant
    /// la recherche. Rien n'est modifié si une erreur est renvoyée.
    pub fn assign(
        &mut self,
        meal: MealPeriod,
        time: ClockTime,
        worker: Option<&WorkerId>,
        roster: &mut Roster,
    ) -> Result<(), SchedError> {
        let week = self.week_of_month;
        let day = u32::from(self.day_of_month);

        let incoming = worker
            .map(|id| {
                roster
                    .position(id)
                    .ok_or_else(|| SchedError::UnknownWorker(id.as_str().to_string()))
            })
            .transpose()?;

        let slot = self
            .group_mut(meal)
            .get_mut(&time)
            .ok_or_else(|| SchedError::UnknownSlot {
                day,
                meal,
                time: time.to_string(),
            })?;

        if slot.as_ref() == worker {
            return Ok(());
        }

        let outgoing = slot
            .as_ref()
            .map(|id| {
                roster
                    .position(id)
                    .ok_or_else(|| SchedError::UnknownWorker(id.as_str().to_string()))
            })
            .transpose()?;

        if let Some(w) = outgoing.and_then(|idx| roster.get_mut(idx)) {
            w.release_shift(week);
        }
        *slot = worker.cloned();
        if let Some(w) = incoming.and_then(|idx| roster.get_mut(idx)) {
            w.record_shift(week);
        }
        Ok(())
    }

    /// Vide les créneaux d'un service (ou des deux).
    pub fn clear(&mut self, meal: Option<MealPeriod>, roster: &mut Roster) -> Result<(), SchedError> {
        let taken: Vec<(MealPeriod, ClockTime)> = self
            .all_slots()
            .filter(|(m, _, w)| w.is_some() && meal.map_or(true, |only| only == *m))
            .map(|(m, t, _)| (m, t))
            .collect();
        for (m, t) in taken {
            self.assign(m, t, None, roster)?;
        }
        Ok(())
    }
}

/// Choix des jours visés par une opération d'édition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySelector {
    /// Jours du mois (1..=31).
    Days(BTreeSet<u8>),
    /// Chaque occurrence de ces jours de semaine (lundi = 0).
    Weekdays(BTreeSet<u8>),
}

impl DaySelector {
    pub fn days<I: IntoIterator<Item = u8>>(days: I) -> Self {
        DaySelector::Days(days.into_iter().collect())
    }

    pub fn weekdays<I: IntoIterator<Item = u8>>(weekdays: I) -> Self {
        DaySelector::Weekdays(weekdays.into_iter().collect())
    }
}

/// Calendrier d'un mois. `days[i]` est le jour `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    month: u32,
    year: i32,
    num_days: u8,
    first_weekday: u8,
    days: Vec<ShiftDay>,
}

impl MonthCalendar {
    pub fn new(month: u32, year: i32) -> Result<Self, SchedError> {
        if !(1..=12).contains(&month) {
            return Err(SchedError::out_of_range("month", month));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| SchedError::out_of_range("year", year))?;
        let next = match month {
            12 => year
                .checked_add(1)
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            _ => NaiveDate::from_ymd_opt(year, month + 1, 1),
        }
        .ok_or_else(|| SchedError::out_of_range("year", year))?;

        let num_days = u8::try_from(next.signed_duration_since(first).num_days())
            .map_err(|_| SchedError::out_of_range("month", month))?;
        let first_weekday = first.weekday().num_days_from_monday() as u8;

        let days = (0..num_days)
            .map(|i| {
                ShiftDay::new(
                    i + 1,
                    (first_weekday + i) % 7,
                    week_of_month(first_weekday, i),
                )
            })
            .collect();

        Ok(Self {
            month,
            year,
            num_days,
            first_weekday,
            days,
        })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn num_days(&self) -> u8 {
        self.num_days
    }

    pub fn first_weekday(&self) -> u8 {
        self.first_weekday
    }

    pub fn days(&self) -> &[ShiftDay] {
        &self.days
    }

    pub fn day(&self, day_of_month: u8) -> Option<&ShiftDay> {
        let idx = usize::from(day_of_month).checked_sub(1)?;
        self.days.get(idx)
    }

    pub fn day_mut(&mut self, day_of_month: u8) -> Option<&mut ShiftDay> {
        let idx = usize::from(day_of_month).checked_sub(1)?;
        self.days.get_mut(idx)
    }

    fn day_or_err(&mut self, day_of_month: u8) -> Result<&mut ShiftDay, SchedError> {
        self.day_mut(day_of_month)
            .ok_or(SchedError::UnknownDay(u32::from(day_of_month)))
    }

    /// Jours du mois visés par `selector`, par ordre croissant.
    pub fn days_for(&self, selector: &DaySelector) -> Result<Vec<u8>, SchedError> {
        match selector {
            DaySelector::Days(days) => {
                if let Some(bad) = days.iter().find(|d| **d == 0 || **d > self.num_days) {
                    return Err(SchedError::UnknownDay(u32::from(*bad)));
                }
                Ok(days.iter().copied().collect())
            }
            DaySelector::Weekdays(weekdays) => {
                if let Some(bad) = weekdays.iter().find(|d| **d > 6) {
                    return Err(SchedError::out_of_range("weekday", *bad));
                }
                Ok(self
                    .days
                    .iter()
                    .filter(|d| weekdays.contains(&d.weekday))
                    .map(|d| d.day_of_month)
                    .collect())
            }
        }
    }

    pub fn slot_count(&self) -> usize {
        self.days.iter().map(ShiftDay::slot_count).sum()
    }

    pub fn empty_slot_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.all_slots())
            .filter(|(_, _, w)| w.is_none())
            .count()
    }

    /// Vrai si tous les créneaux de tous les jours ont un titulaire.
    pub fn is_complete(&self) -> bool {
        self.days.iter().all(ShiftDay::is_full)
    }

    /// Premier créneau libre du mois : `(jour, service, heure)`.
    pub fn next_empty_slot(&self) -> Option<(u8, MealPeriod, ClockTime)> {
        self.days.iter().find_map(|d| {
            d.next_empty_slot()
                .map(|(meal, time)| (d.day_of_month, meal, time))
        })
    }

    pub fn add_slot(
        &mut self,
        day_of_month: u8,
        meal: MealPeriod,
        time: ClockTime,
    ) -> Result<bool, SchedError> {
        Ok(self.day_or_err(day_of_month)?.add_slot(meal, time))
    }

    pub fn remove_slot(
        &mut self,
        day_of_month: u8,
        meal: MealPeriod,
        time: ClockTime,
        roster: &mut Roster,
    ) -> Result<(), SchedError> {
        self.day_or_err(day_of_month)?.remove_slot(meal, time, roster)
    }

    /// Voir [`ShiftDay::assign`].
    pub fn assign(
        &mut self,
        day_of_month: u8,
        meal: MealPeriod,
        time: ClockTime,
        worker: Option<&WorkerId>,
        roster: &mut Roster,
    ) -> Result<(), SchedError> {
        self.day_or_err(day_of_month)?
            .assign(meal, time, worker, roster)
    }

    pub fn clear_all(&mut self, roster: &mut Roster) -> Result<(), SchedError> {
        for day in &mut self.days {
            day.clear(None, roster)?;
        }
        Ok(())
    }

    /// Libère tous les créneaux tenus par `worker`.
    pub fn release_worker(
        &mut self,
        worker: &WorkerId,
        roster: &mut Roster,
    ) -> Result<usize, SchedError> {
        let mut released = 0;
        for day in &mut self.days {
            for (meal, time) in day.assignments_of(worker) {
                day.assign(meal, time, None, roster)?;
                released += 1;
            }
        }
        Ok(released)
    }

    /// Retire tous les titulaires sans toucher aux compteurs. Réservé à la
    /// reconstruction des compteurs (roster remis à zéro juste avant).
    pub(crate) fn detach_assignments(&mut self) -> Vec<(u8, MealPeriod, ClockTime, WorkerId)> {
        let mut out = Vec::new();
        for day in &mut self.days {
            let day_num = day.day_of_month;
            for meal in MealPeriod::ALL {
                for (time, slot) in day.group_mut(meal).iter_mut() {
                    if let Some(id) = slot.take() {
                        out.push((day_num, meal, *time, id));
                    }
                }
            }
        }
        out
    }

    /// Vérifie qu'un calendrier désérialisé correspond bien à son mois.
    pub fn validate(&self) -> Result<(), SchedError> {
        let fresh = MonthCalendar::new(self.month, self.year)?;
        if fresh.num_days != self.num_days
            || fresh.first_weekday != self.first_weekday
            || fresh.days.len() != self.days.len()
        {
            return Err(SchedError::CorruptState(format!(
                "calendar shape does not match {}/{}",
                self.month, self.year
            )));
        }
        for (expected, actual) in fresh.days.iter().zip(&self.days) {
            if expected.day_of_month != actual.day_of_month
                || expected.weekday != actual.weekday
                || expected.week_of_month != actual.week_of_month
            {
                return Err(SchedError::CorruptState(format!(
                    "day {} does not match {}/{}",
                    actual.day_of_month, self.month, self.year
                )));
            }
        }
        Ok(())
    }
}

/// Ligne (lundi en tête) du jour d'indice `index`, bornée à la 5e semaine.
fn week_of_month(first_weekday: u8, index: u8) -> u8 {
    ((first_weekday + index) / 7 + 1).min(WEEKS_PER_MONTH as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weeks_start_on_monday() {
        // 1er octobre 2025 : mercredi
        assert_eq!(week_of_month(2, 0), 1);
        assert_eq!(week_of_month(2, 4), 1);
        assert_eq!(week_of_month(2, 5), 2);
    }

    #[test]
    fn sixth_calendar_row_folds_into_week_five() {
        // 1er juin 2025 : dimanche, le 30 tombe sur une 6e ligne
        assert_eq!(week_of_month(6, 29), WEEKS_PER_MONTH as u8);
    }
}
