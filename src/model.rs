use crate::calendar::MonthCalendar;
use crate::error::SchedError;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Nombre de semaines suivies par mois (une 6e ligne de calendrier est
/// rattachée à la 5e semaine).
pub const WEEKS_PER_MONTH: usize = 5;

/// Service du midi ou du soir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    Lunch,
    Dinner,
}

impl MealPeriod {
    pub const ALL: [MealPeriod; 2] = [MealPeriod::Lunch, MealPeriod::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealPeriod::Lunch => "lunch",
            MealPeriod::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealPeriod {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lunch" | "l" | "midi" => Ok(MealPeriod::Lunch),
            "dinner" | "d" | "soir" => Ok(MealPeriod::Dinner),
            _ => Err(SchedError::InvalidFormat(s.to_string())),
        }
    }
}

/// Identifiant fort d'un employé : son nom, unique dans le roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Employé : règles de disponibilité et compteurs de créneaux.
///
/// Les compteurs ne sont modifiés que par la transition d'assignation du
/// calendrier ([`crate::calendar::MonthCalendar::assign`]) ; on a toujours
/// `shifts_this_month == shifts_per_week.iter().sum()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(rename = "name")]
    pub id: WorkerId,
    /// Plus petit = planifié en premier.
    pub priority: i32,
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    shifts_this_month: u32,
    #[serde(default)]
    shifts_per_week: [u32; WEEKS_PER_MONTH],
}

impl Worker {
    pub fn new<S: AsRef<str>>(name: S, priority: i32) -> Self {
        Self {
            id: WorkerId::new(name),
            priority,
            rules: Vec::new(),
            shifts_this_month: 0,
            shifts_per_week: [0; WEEKS_PER_MONTH],
        }
    }

    /// Builder pratique pour les tests et l'import.
    pub fn with_rule(mut self, rule: Rule) -> Result<Self, SchedError> {
        self.add_rule(rule)?;
        Ok(self)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Ajoute une règle validée. Un second quota du même type est refusé :
    /// utiliser [`Worker::set_monthly_cap`] / [`Worker::set_weekly_cap`] pour
    /// le remplacer.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), SchedError> {
        rule.validate()?;
        let duplicate = match rule {
            Rule::MonthlyCap { .. } => self.monthly_cap().map(|_| "monthly"),
            Rule::WeeklyCap { .. } => self.weekly_cap().map(|_| "weekly"),
            _ => None,
        };
        if let Some(kind) = duplicate {
            return Err(SchedError::DuplicateCap {
                worker: self.id.as_str().to_string(),
                kind,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn remove_rule(&mut self, index: usize) -> Option<Rule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    pub fn set_monthly_cap(&mut self, max: u32) {
        self.replace_cap(Rule::MonthlyCap { max });
    }

    pub fn set_weekly_cap(&mut self, max: u32) {
        self.replace_cap(Rule::WeeklyCap { max });
    }

    fn replace_cap(&mut self, cap: Rule) {
        let same_kind = |r: &Rule| std::mem::discriminant(r) == std::mem::discriminant(&cap);
        match self.rules.iter().position(same_kind) {
            Some(pos) => self.rules[pos] = cap,
            None => self.rules.push(cap),
        }
    }

    pub fn monthly_cap(&self) -> Option<u32> {
        self.rules.iter().find_map(|r| match r {
            Rule::MonthlyCap { max } => Some(*max),
            _ => None,
        })
    }

    pub fn weekly_cap(&self) -> Option<u32> {
        self.rules.iter().find_map(|r| match r {
            Rule::WeeklyCap { max } => Some(*max),
            _ => None,
        })
    }

    /// Vérifie l'ensemble des règles (après désérialisation notamment).
    pub fn validate_rules(&self) -> Result<(), SchedError> {
        let mut monthly = 0;
        let mut weekly = 0;
        for rule in &self.rules {
            rule.validate()?;
            match rule {
                Rule::MonthlyCap { .. } => monthly += 1,
                Rule::WeeklyCap { .. } => weekly += 1,
                _ => {}
            }
        }
        let kind = match (monthly > 1, weekly > 1) {
            (true, _) => "monthly",
            (_, true) => "weekly",
            _ => return Ok(()),
        };
        Err(SchedError::DuplicateCap {
            worker: self.id.as_str().to_string(),
            kind,
        })
    }

    pub fn shifts_this_month(&self) -> u32 {
        self.shifts_this_month
    }

    pub fn shifts_per_week(&self) -> &[u32; WEEKS_PER_MONTH] {
        &self.shifts_per_week
    }

    /// Créneaux déjà tenus pendant la semaine `week` (1..=5).
    pub fn shifts_in_week(&self, week: u8) -> u32 {
        self.shifts_per_week[week_index(week)]
    }

    pub(crate) fn record_shift(&mut self, week: u8) {
        self.shifts_this_month += 1;
        self.shifts_per_week[week_index(week)] += 1;
    }

    pub(crate) fn release_shift(&mut self, week: u8) {
        let idx = week_index(week);
        debug_assert!(self.shifts_per_week[idx] > 0, "releasing a shift never recorded");
        self.shifts_this_month = self.shifts_this_month.saturating_sub(1);
        self.shifts_per_week[idx] = self.shifts_per_week[idx].saturating_sub(1);
    }

    pub(crate) fn reset_counters(&mut self) {
        self.shifts_this_month = 0;
        self.shifts_per_week = [0; WEEKS_PER_MONTH];
    }
}

fn week_index(week: u8) -> usize {
    usize::from(week.clamp(1, WEEKS_PER_MONTH as u8)) - 1
}

/// Comparateur du tri de roster : priorité croissante. Utilisé avec un tri
/// stable, les égalités gardent l'ordre d'insertion.
pub fn by_priority(a: &Worker, b: &Worker) -> Ordering {
    a.priority.cmp(&b.priority)
}

/// Liste des employés, dans l'ordre d'insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    workers: Vec<Worker>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    pub fn add(&mut self, worker: Worker) -> Result<(), SchedError> {
        if worker.id.as_str().trim().is_empty() {
            return Err(SchedError::InvalidName(worker.id.as_str().to_string()));
        }
        if self.position(&worker.id).is_some() {
            return Err(SchedError::DuplicateWorker(worker.id.as_str().to_string()));
        }
        self.workers.push(worker);
        Ok(())
    }

    pub fn find(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id.as_str() == name)
    }

    /// Les compteurs restent inaccessibles en écriture depuis l'extérieur.
    pub fn find_mut(&mut self, id: &WorkerId) -> Option<&mut Worker> {
        self.workers.iter_mut().find(|w| &w.id == id)
    }

    pub fn position(&self, id: &WorkerId) -> Option<usize> {
        self.workers.iter().position(|w| &w.id == id)
    }

    pub(crate) fn into_workers(self) -> Vec<Worker> {
        self.workers
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Worker> {
        self.workers.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Worker> {
        self.workers.get_mut(index)
    }

    /// Ne doit être appelé qu'une fois tous ses créneaux libérés.
    pub(crate) fn remove(&mut self, id: &WorkerId) -> Option<Worker> {
        let pos = self.position(id)?;
        Some(self.workers.remove(pos))
    }

    pub(crate) fn reset_counters(&mut self) {
        self.workers.iter_mut().for_each(Worker::reset_counters);
    }
}

/// État persisté : roster + calendrier du mois.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planning {
    pub roster: Roster,
    pub calendar: MonthCalendar,
}
