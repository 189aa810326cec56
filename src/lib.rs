#![forbid(unsafe_code)]
//! Créneaux — remplissage des services midi/soir d'un mois.
//!
//! - Règles de disponibilité par employé (jours, semaines, heure minimale),
//!   quotas mensuel/hebdomadaire, jours exclus.
//! - Recherche exhaustive en profondeur avec retour arrière, par priorité.
//! - Compteurs d'employés tenus par une unique transition d'assignation.
//! - Stockage fichiers (JSON/CSV) et gabarits de créneaux en dehors du cœur.

pub mod calendar;
pub mod clock;
pub mod error;
#[cfg(feature = "serde")]
pub mod io;
pub mod matching;
pub mod model;
pub mod rule;
pub mod scheduler;
#[cfg(feature = "serde")]
pub mod storage;
#[cfg(feature = "serde")]
pub mod template;

pub use calendar::{DaySelector, MonthCalendar, ShiftDay};
pub use clock::ClockTime;
pub use error::SchedError;
pub use matching::{matches, QueryBuilder, SlotQuery};
pub use model::{MealPeriod, Planning, Roster, Worker, WorkerId};
pub use rule::{Availability, Rule, Selector};
pub use scheduler::{Conflict, ConflictKind, RunOutcome, RunReport, Scheduler};
#[cfg(feature = "serde")]
pub use storage::{JsonStorage, Storage};
#[cfg(feature = "serde")]
pub use template::{apply_template, load_template_from_file, Template, TemplateSlot, TemplateStore};
