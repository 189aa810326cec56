use crate::clock::ClockTime;
use crate::error::SchedError;
use crate::model::MealPeriod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Règle portée par un employé. Un seul « forme » par règle : quota mensuel,
/// quota hebdomadaire, exclusion de jours ou disponibilité.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    MonthlyCap {
        max: u32,
    },
    WeeklyCap {
        max: u32,
    },
    Exclude {
        days: BTreeSet<u8>,
        #[serde(default)]
        meal: Option<MealPeriod>,
    },
    Availability(Availability),
}

/// Disponibilité : à partir de `not_before`, pour un service (ou les deux si
/// `meal` est absent), sur les jours décrits par `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default)]
    pub meal: Option<MealPeriod>,
    pub not_before: ClockTime,
    pub selector: Selector,
}

/// Jours couverts par une disponibilité. Lundi = 0, semaines 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    #[serde(rename = "day_of_month")]
    ByDayOfMonth { days: BTreeSet<u8> },
    #[serde(rename = "weekday")]
    ByWeekday {
        weekdays: BTreeSet<u8>,
        #[serde(default)]
        weeks: Option<BTreeSet<u8>>,
    },
    #[serde(rename = "week_of_month")]
    ByWeekOfMonth {
        weeks: BTreeSet<u8>,
        #[serde(default)]
        weekdays: Option<BTreeSet<u8>>,
    },
}

impl Rule {
    pub fn monthly_cap(max: u32) -> Self {
        Rule::MonthlyCap { max }
    }

    pub fn weekly_cap(max: u32) -> Self {
        Rule::WeeklyCap { max }
    }

    pub fn exclude<I: IntoIterator<Item = u8>>(
        days: I,
        meal: Option<MealPeriod>,
    ) -> Result<Self, SchedError> {
        let rule = Rule::Exclude {
            days: days.into_iter().collect(),
            meal,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), SchedError> {
        match self {
            Rule::MonthlyCap { .. } | Rule::WeeklyCap { .. } => Ok(()),
            Rule::Exclude { days, .. } => check_set(days, "day", 1, 31),
            Rule::Availability(av) => av.selector.validate(),
        }
    }
}

impl From<Availability> for Rule {
    fn from(value: Availability) -> Self {
        Rule::Availability(value)
    }
}

impl Availability {
    pub fn new(selector: Selector, not_before: ClockTime) -> Result<Self, SchedError> {
        selector.validate()?;
        Ok(Self {
            meal: None,
            not_before,
            selector,
        })
    }

    pub fn by_day_of_month<I: IntoIterator<Item = u8>>(
        days: I,
        not_before: ClockTime,
    ) -> Result<Self, SchedError> {
        Self::new(
            Selector::ByDayOfMonth {
                days: days.into_iter().collect(),
            },
            not_before,
        )
    }

    pub fn by_weekday<I: IntoIterator<Item = u8>>(
        weekdays: I,
        weeks: Option<Vec<u8>>,
        not_before: ClockTime,
    ) -> Result<Self, SchedError> {
        Self::new(
            Selector::ByWeekday {
                weekdays: weekdays.into_iter().collect(),
                weeks: weeks.map(|w| w.into_iter().collect()),
            },
            not_before,
        )
    }

    pub fn by_week_of_month<I: IntoIterator<Item = u8>>(
        weeks: I,
        weekdays: Option<Vec<u8>>,
        not_before: ClockTime,
    ) -> Result<Self, SchedError> {
        Self::new(
            Selector::ByWeekOfMonth {
                weeks: weeks.into_iter().collect(),
                weekdays: weekdays.map(|w| w.into_iter().collect()),
            },
            not_before,
        )
    }

    /// Tous les jours de la semaine, toutes les semaines.
    pub fn every_day(not_before: ClockTime) -> Self {
        Self {
            meal: None,
            not_before,
            selector: Selector::ByWeekday {
                weekdays: (0..7).collect(),
                weeks: None,
            },
        }
    }

    /// Restreint la disponibilité à un seul service.
    pub fn for_meal(mut self, meal: MealPeriod) -> Self {
        self.meal = Some(meal);
        self
    }
}

impl Selector {
    pub fn validate(&self) -> Result<(), SchedError> {
        match self {
            Selector::ByDayOfMonth { days } => check_set(days, "day", 1, 31),
            Selector::ByWeekday { weekdays, weeks } => {
                check_set(weekdays, "weekday", 0, 6)?;
                weeks
                    .as_ref()
                    .map_or(Ok(()), |w| check_set(w, "week", 1, 5))
            }
            Selector::ByWeekOfMonth { weeks, weekdays } => {
                check_set(weeks, "week", 1, 5)?;
                weekdays
                    .as_ref()
                    .map_or(Ok(()), |w| check_set(w, "weekday", 0, 6))
            }
        }
    }
}

fn check_set(set: &BTreeSet<u8>, field: &'static str, min: u8, max: u8) -> Result<(), SchedError> {
    if set.is_empty() {
        return Err(SchedError::InvalidRule("selector sets cannot be empty"));
    }
    match set.iter().find(|v| !(min..=max).contains(*v)) {
        Some(v) => Err(SchedError::out_of_range(field, *v)),
        None => Ok(()),
    }
}

fn join_numbers(set: &BTreeSet<u8>) -> String {
    set.iter().map(u8::to_string).collect::<Vec<_>>().join(", ")
}

fn join_weekdays(set: &BTreeSet<u8>) -> String {
    set.iter()
        .filter_map(|d| WEEKDAY_NAMES.get(usize::from(*d)).copied())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::MonthlyCap { max } => write!(f, "at most {max} shift(s) per month"),
            Rule::WeeklyCap { max } => write!(f, "at most {max} shift(s) per week"),
            Rule::Exclude { days, meal } => {
                write!(f, "never on days {}", join_numbers(days))?;
                if let Some(meal) = meal {
                    write!(f, " ({meal})")?;
                }
                Ok(())
            }
            Rule::Availability(av) => {
                let meal = av.meal.map_or("lunch or dinner", |m| m.as_str());
                write!(f, "{meal} from {}, ", av.not_before.display_12h())?;
                match &av.selector {
                    Selector::ByDayOfMonth { days } => write!(f, "days {}", join_numbers(days)),
                    Selector::ByWeekday { weekdays, weeks } => {
                        write!(f, "{}", join_weekdays(weekdays))?;
                        if let Some(weeks) = weeks {
                            write!(f, " (weeks {})", join_numbers(weeks))?;
                        }
                        Ok(())
                    }
                    Selector::ByWeekOfMonth { weeks, weekdays } => {
                        write!(f, "weeks {}", join_numbers(weeks))?;
                        if let Some(weekdays) = weekdays {
                            write!(f, " ({})", join_weekdays(weekdays))?;
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}
