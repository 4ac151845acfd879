//! Daily challenge engine
//!
//! A day moves from `NotYetAttemptedToday` to `AlreadyAttemptedToday` the
//! moment a history entry dated today is appended, whatever the outcome.
//! Once there, every further attempt is rejected without touching the record.
use chrono::{Local, NaiveDate};
use rand::Rng;
use thiserror::Error;

use crate::ProgressStorage;
use crate::catalog::{Challenge, ChallengeCatalog};
use crate::constants::POINTS_PER_KG;
use crate::progress::{HistoryEntry, ProgressError, ProgressRecord, Reward};
use crate::store::{ProgressStore, StoreError};

/// Source of the current calendar date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Whether today's challenge can still be attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DailyStatus<'a> {
    Available,
    AlreadyAttempted(&'a HistoryEntry),
}

#[must_use]
pub fn status(record: &ProgressRecord, today: NaiveDate) -> DailyStatus<'_> {
    record
        .entry_for(today)
        .map_or(DailyStatus::Available, DailyStatus::AlreadyAttempted)
}

/// Points for completing a challenge: `floor(co2 * 10)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn points_for(co2_kg: f64) -> u32 {
    let raw = (co2_kg * POINTS_PER_KG).floor();
    if raw.is_finite() && raw > 0.0 {
        raw as u32
    } else {
        0
    }
}

#[derive(Debug, Error)]
pub enum DailyError<E>
where
    E: std::error::Error + 'static,
{
    #[error("today's challenge ({date}) was already attempted")]
    AlreadyAttempted { date: NaiveDate },
    #[error(transparent)]
    Store(#[from] StoreError<E>),
}

/// Result of resolving today's challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeOutcome {
    pub entry: HistoryEntry,
    pub points_awarded: u32,
    pub co2_awarded: f64,
    pub total_points: u32,
    pub total_co2: f64,
}

impl ChallengeOutcome {
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.entry.completed
    }
}

/// Entry points for offering and resolving the daily challenge.
pub struct DailyChallenge;

impl DailyChallenge {
    /// Draw today's challenge if it has not been attempted yet.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::AlreadyAttempted`] when a history entry for
    /// `today` exists. Nothing is drawn or mutated in that case.
    pub fn offer<'c, S, R>(
        store: &ProgressStore<S>,
        catalog: &'c ChallengeCatalog,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<&'c Challenge, DailyError<S::Error>>
    where
        S: ProgressStorage,
        R: Rng + ?Sized,
    {
        if let DailyStatus::AlreadyAttempted(entry) = status(store.record(), today) {
            log::debug!("challenge for {} already recorded", entry.date);
            return Err(DailyError::AlreadyAttempted { date: today });
        }
        let challenge = catalog.draw(rng);
        log::debug!("offering challenge {:?} for {today}", challenge.text);
        Ok(challenge)
    }

    /// Apply the user's answer for today's challenge and persist.
    ///
    /// A completed challenge adds `floor(co2 * 10)` points and its CO2 to the
    /// totals. Completed or not, a history entry for `today` is appended.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::AlreadyAttempted`] without mutating anything if
    /// today already has an entry, or [`DailyError::Store`] if saving fails.
    pub fn resolve<S>(
        store: &mut ProgressStore<S>,
        today: NaiveDate,
        challenge: &Challenge,
        completed: bool,
    ) -> Result<ChallengeOutcome, DailyError<S::Error>>
    where
        S: ProgressStorage,
    {
        if store.record().has_attempted_on(today) {
            return Err(DailyError::AlreadyAttempted { date: today });
        }
        let reward = if completed {
            Reward::new(points_for(challenge.co2_kg), challenge.co2_kg)
        } else {
            Reward::none()
        };
        let entry = HistoryEntry::new(today, challenge, completed);

        let appended = store.update(|record| -> Result<(), ProgressError> {
            record.record_attempt(entry.clone())?;
            record.award(reward);
            Ok(())
        })?;
        if let Err(ProgressError::AlreadyAttempted { date }) = appended {
            return Err(DailyError::AlreadyAttempted { date });
        }

        let record = store.record();
        log::info!(
            "challenge for {today} resolved (completed: {completed}), totals {} points / {:.1} kg",
            record.points(),
            record.co2_total()
        );
        Ok(ChallengeOutcome {
            entry,
            points_awarded: reward.points,
            co2_awarded: reward.co2_kg,
            total_points: record.points(),
            total_co2: record.co2_total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn meat() -> Challenge {
        Challenge {
            text: "Reduce tu consumo de carne roja hoy".into(),
            co2_kg: 1.5,
        }
    }

    #[test]
    fn points_are_truncated_product() {
        assert_eq!(points_for(1.5), 15);
        assert_eq!(points_for(2.1), 21);
        assert_eq!(points_for(0.3), 3);
        assert_eq!(points_for(0.25), 2);
        assert_eq!(points_for(-1.0), 0);
        assert_eq!(points_for(f64::NAN), 0);
    }

    #[test]
    fn completed_challenge_awards_points_and_co2() {
        let mut store = ProgressStore::open(MemoryStorage::new()).unwrap();
        let outcome = DailyChallenge::resolve(&mut store, day(1), &meat(), true).unwrap();
        assert_eq!(outcome.points_awarded, 15);
        assert!((outcome.co2_awarded - 1.5).abs() < 1e-9);
        assert_eq!(store.record().points(), 15);
        assert!((store.record().co2_total() - 1.5).abs() < 1e-9);
        assert_eq!(store.record().history().len(), 1);
        assert!(outcome.completed());
    }

    #[test]
    fn declined_challenge_still_records_history() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone()).unwrap();
        let outcome = DailyChallenge::resolve(&mut store, day(2), &meat(), false).unwrap();
        assert_eq!(outcome.points_awarded, 0);
        assert_eq!(store.record().points(), 0);
        assert_eq!(store.record().history().len(), 1);
        assert!(!store.record().history()[0].completed);
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn second_attempt_same_day_is_rejected_without_mutation() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone()).unwrap();
        let catalog = ChallengeCatalog::default_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let challenge = DailyChallenge::offer(&store, &catalog, day(3), &mut rng)
            .unwrap()
            .clone();
        DailyChallenge::resolve(&mut store, day(3), &challenge, true).unwrap();
        let before = store.record().clone();

        assert!(matches!(
            DailyChallenge::offer(&store, &catalog, day(3), &mut rng),
            Err(DailyError::AlreadyAttempted { .. })
        ));
        assert!(matches!(
            DailyChallenge::resolve(&mut store, day(3), &challenge, true),
            Err(DailyError::AlreadyAttempted { .. })
        ));
        assert_eq!(store.record(), &before);
        assert_eq!(storage.save_count(), 1);

        assert!(DailyChallenge::offer(&store, &catalog, day(4), &mut rng).is_ok());
    }

    #[test]
    fn status_reports_todays_entry() {
        let mut store = ProgressStore::open(MemoryStorage::new()).unwrap();
        assert_eq!(status(store.record(), day(5)), DailyStatus::Available);
        DailyChallenge::resolve(&mut store, day(5), &meat(), false).unwrap();
        match status(store.record(), day(5)) {
            DailyStatus::AlreadyAttempted(entry) => assert_eq!(entry.date, day(5)),
            DailyStatus::Available => panic!("expected an entry for today"),
        }
        assert_eq!(status(store.record(), day(6)), DailyStatus::Available);
    }

    #[test]
    fn fixed_clock_returns_its_date() {
        assert_eq!(FixedClock(day(9)).today(), day(9));
    }
}
