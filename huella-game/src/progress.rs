//! Durable progress record and its history log
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::catalog::Challenge;

/// One attempted daily challenge. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "reto")]
    pub challenge_text: String,
    #[serde(rename = "co2")]
    pub co2_value: f64,
    #[serde(rename = "cumplido")]
    pub completed: bool,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(date: NaiveDate, challenge: &Challenge, completed: bool) -> Self {
        Self {
            date,
            challenge_text: challenge.text.clone(),
            co2_value: challenge.co2_kg,
            completed,
        }
    }
}

/// Additive payout applied to the running totals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reward {
    pub points: u32,
    pub co2_kg: f64,
}

impl Reward {
    #[must_use]
    pub const fn new(points: u32, co2_kg: f64) -> Self {
        Self { points, co2_kg }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            points: 0,
            co2_kg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("a challenge was already recorded for {date}")]
    AlreadyAttempted { date: NaiveDate },
}

/// The user's persisted record.
///
/// Fields are reachable only through accessors and guarded mutators so the
/// record cannot break its own rules: the name is claimed once, totals only
/// grow, and history is append-only with at most one entry per date.
///
/// Missing or `null` fields in stored data deserialize to their defaults.
/// The serialized key order is fixed, which keeps saves byte-stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "nombre", default, deserialize_with = "blank_as_none")]
    name: Option<String>,
    #[serde(rename = "puntos", default, deserialize_with = "null_as_default")]
    points: u32,
    #[serde(rename = "co2_total", default, deserialize_with = "null_as_default")]
    co2_total: f64,
    #[serde(rename = "historial", default, deserialize_with = "null_as_default")]
    history: Vec<HistoryEntry>,
    #[serde(rename = "ciudad", default, deserialize_with = "blank_as_none")]
    city: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Older files store an empty string when the prompt was skipped.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.trim().is_empty()))
}

impl ProgressRecord {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub const fn co2_total(&self) -> f64 {
        self.co2_total
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// The history entry recorded for `date`, if any.
    #[must_use]
    pub fn entry_for(&self, date: NaiveDate) -> Option<&HistoryEntry> {
        self.history.iter().find(|entry| entry.date == date)
    }

    #[must_use]
    pub fn has_attempted_on(&self, date: NaiveDate) -> bool {
        self.entry_for(date).is_some()
    }

    /// Set the name if none is stored yet. Returns `false` and leaves the
    /// record untouched when a name already exists or `name` is blank.
    pub fn claim_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.name.is_some() || name.trim().is_empty() {
            return false;
        }
        self.name = Some(name);
        true
    }

    /// Store (or explicitly overwrite) the default weather location. A blank
    /// city is ignored.
    pub fn set_city(&mut self, city: impl Into<String>) {
        let city = city.into();
        if !city.trim().is_empty() {
            self.city = Some(city);
        }
    }

    /// Add a reward to the running totals. Totals never decrease, so a
    /// negative or non-finite CO2 amount contributes nothing.
    pub fn award(&mut self, reward: Reward) {
        self.points = self.points.saturating_add(reward.points);
        if reward.co2_kg.is_finite() && reward.co2_kg > 0.0 {
            self.co2_total += reward.co2_kg;
        }
    }

    /// Append a history entry, rejecting a second entry for the same date.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::AlreadyAttempted`] if an entry with the same
    /// date already exists; the record is left unchanged.
    pub fn record_attempt(&mut self, entry: HistoryEntry) -> Result<(), ProgressError> {
        if self.has_attempted_on(entry.date) {
            return Err(ProgressError::AlreadyAttempted { date: entry.date });
        }
        self.history.push(entry);
        Ok(())
    }

    /// Number of recorded days on which the challenge was completed.
    #[must_use]
    pub fn completed_days(&self) -> usize {
        self.history.iter().filter(|entry| entry.completed).count()
    }
}
