use crate::clock::ClockTime;
use crate::model::{MealPeriod, WorkerId};
use std::fmt;

pub use crate::error::SchedError;

/// Issue d'une recherche.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Tous les créneaux sont pourvus.
    Complete,
    /// Aucun planning complet n'existe avec ces règles ; le calendrier est vide.
    Infeasible,
    /// Le budget d'étapes est épuisé : le contenu du calendrier n'a aucune
    /// valeur, seule sa forme est fiable.
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Appels récursifs effectués.
    pub steps: u64,
    /// Assignations annulées.
    pub backtracks: u64,
}

impl RunReport {
    /// Un budget épuisé compte comme un succès : seul `Infeasible` est un échec.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Complete | RunOutcome::BudgetExhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    EmptySlot,
    Unavailable,
    MonthlyCapExceeded,
    WeeklyCapExceeded,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::EmptySlot => "empty",
            ConflictKind::Unavailable => "unavailable",
            ConflictKind::MonthlyCapExceeded => "monthly_cap",
            ConflictKind::WeeklyCapExceeded => "weekly_cap",
        }
    }
}

/// Anomalie relevée par l'audit d'un calendrier édité à la main.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    EmptySlot {
        day: u8,
        meal: MealPeriod,
        time: ClockTime,
    },
    Unavailable {
        worker: WorkerId,
        day: u8,
        meal: MealPeriod,
        time: ClockTime,
    },
    MonthlyCapExceeded {
        worker: WorkerId,
        assigned: u32,
        max: u32,
    },
    WeeklyCapExceeded {
        worker: WorkerId,
        week: u8,
        assigned: u32,
        max: u32,
    },
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::EmptySlot { .. } => ConflictKind::EmptySlot,
            Conflict::Unavailable { .. } => ConflictKind::Unavailable,
            Conflict::MonthlyCapExceeded { .. } => ConflictKind::MonthlyCapExceeded,
            Conflict::WeeklyCapExceeded { .. } => ConflictKind::WeeklyCapExceeded,
        }
    }

    pub fn worker(&self) -> Option<&WorkerId> {
        match self {
            Conflict::EmptySlot { .. } => None,
            Conflict::Unavailable { worker, .. }
            | Conflict::MonthlyCapExceeded { worker, .. }
            | Conflict::WeeklyCapExceeded { worker, .. } => Some(worker),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::EmptySlot { day, meal, time } => {
                write!(f, "day {day} {meal} {time}: no one assigned")
            }
            Conflict::Unavailable {
                worker,
                day,
                meal,
                time,
            } => write!(f, "day {day} {meal} {time}: {worker} is not available"),
            Conflict::MonthlyCapExceeded {
                worker,
                assigned,
                max,
            } => write!(f, "{worker}: {assigned} shifts this month (max {max})"),
            Conflict::WeeklyCapExceeded {
                worker,
                week,
                assigned,
                max,
            } => write!(f, "{worker}: {assigned} shifts in week {week} (max {max})"),
        }
    }
}
