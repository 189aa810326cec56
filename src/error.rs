use crate::model::MealPeriod;
use thiserror::Error;

/// Erreurs du domaine (parsing, validation, édition du calendrier).
///
/// L'issue d'une recherche n'est jamais une erreur : voir
/// [`crate::scheduler::RunOutcome`].
#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid clock value: {0:?}")]
    InvalidFormat(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("malformed query: {0}")]
    MalformedQuery(&'static str),
    #[error("worker {worker} already has a {kind} cap")]
    DuplicateCap { worker: String, kind: &'static str },
    #[error("invalid rule: {0}")]
    InvalidRule(&'static str),
    #[error("invalid worker name: {0:?}")]
    InvalidName(String),
    #[error("worker already exists: {0}")]
    DuplicateWorker(String),
    #[error("unknown worker: {0}")]
    UnknownWorker(String),
    #[error("unknown day of month: {0}")]
    UnknownDay(u32),
    #[error("no {meal} slot at {time} on day {day}")]
    UnknownSlot {
        day: u32,
        meal: MealPeriod,
        time: String,
    },
    #[error("corrupt state: {0}")]
    CorruptState(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    pub(crate) fn out_of_range(field: &'static str, value: impl Into<i64>) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
        }
    }
}
