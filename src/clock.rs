use crate::error::SchedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Heure de début d'un créneau (`hh:mm`, 24 h).
///
/// Les deux champs sont toujours dans leur domaine : la seule façon d'obtenir
/// une valeur est [`ClockTime::new`] ou [`ClockTime::parse`]. L'ordre dérivé
/// sur `(hour, minute)` est celui de `hour * 60 + minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, SchedError> {
        if hour > 23 {
            return Err(SchedError::out_of_range("hour", hour));
        }
        if minute > 59 {
            return Err(SchedError::out_of_range("minute", minute));
        }
        Ok(Self { hour, minute })
    }

    /// Accepte `H:MM` ou `HH:MM`, suivi éventuellement de `pm`
    /// (ajoute 12 h aux heures du matin ; `13:00pm` est refusé).
    pub fn parse(text: &str) -> Result<Self, SchedError> {
        let invalid = || SchedError::InvalidFormat(text.to_string());
        let raw = text.trim();

        let sep = raw.find(':').ok_or_else(invalid)?;
        if !(1..=2).contains(&sep) {
            return Err(invalid());
        }
        let hour_raw = &raw[..sep];
        let rest = &raw[sep + 1..];
        let minute_raw = rest.get(..2).ok_or_else(invalid)?;
        let suffix = rest[2..].trim();

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hour_raw) || !all_digits(minute_raw) {
            return Err(invalid());
        }
        let mut hour: u8 = hour_raw.parse().map_err(|_| invalid())?;
        let minute: u8 = minute_raw.parse().map_err(|_| invalid())?;

        if !suffix.is_empty() {
            if !suffix.eq_ignore_ascii_case("pm") {
                return Err(invalid());
            }
            match hour {
                0..=11 => hour += 12,
                12 => {}
                _ => return Err(invalid()),
            }
        }

        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Forme d'affichage : `11:00`, `12:15pm`, `7:30pm`.
    pub fn display_12h(&self) -> String {
        match self.hour {
            0..=11 => format!("{}:{:02}", self.hour, self.minute),
            12 => format!("12:{:02}pm", self.minute),
            h => format!("{}:{:02}pm", h - 12, self.minute),
        }
    }
}

/// Forme canonique de stockage (`H:MM`, 24 h).
impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = SchedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}
