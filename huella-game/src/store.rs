//! Owned progress state bound to its storage backend
use thiserror::Error;

use crate::ProgressStorage;
use crate::progress::ProgressRecord;

#[derive(Debug, Error)]
pub enum StoreError<E>
where
    E: std::error::Error + 'static,
{
    #[error("could not load progress: {0}")]
    Load(#[source] E),
    #[error("could not save progress: {0}")]
    Persist(#[source] E),
}

/// The in-session progress record plus the storage it is persisted to.
///
/// Every mutation goes through [`ProgressStore::update`], which saves the
/// full record before returning.
#[derive(Debug)]
pub struct ProgressStore<S: ProgressStorage> {
    storage: S,
    record: ProgressRecord,
}

impl<S: ProgressStorage> ProgressStore<S> {
    /// Load the stored record, or start a fresh one when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Load`] when the storage cannot be read or holds
    /// corrupt data.
    pub fn open(storage: S) -> Result<Self, StoreError<S::Error>> {
        let record = match storage.load().map_err(StoreError::Load)? {
            Some(record) => {
                log::info!(
                    "loaded progress: {} points, {} history entries",
                    record.points(),
                    record.history().len()
                );
                record
            }
            None => {
                log::info!("no saved progress found, starting fresh");
                ProgressRecord::default()
            }
        };
        Ok(Self { storage, record })
    }

    #[must_use]
    pub const fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply a mutation and persist the record immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if saving fails. The in-memory record
    /// keeps the mutation.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut ProgressRecord) -> R,
    ) -> Result<R, StoreError<S::Error>> {
        let result = f(&mut self.record);
        self.persist()?;
        Ok(result)
    }

    /// Save the current record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if the storage rejects the write.
    pub fn persist(&self) -> Result<(), StoreError<S::Error>> {
        self.storage.save(&self.record).map_err(StoreError::Persist)
    }

    /// Claim the user's name if none is stored yet, persisting on success.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if saving fails.
    pub fn claim_name(&mut self, name: &str) -> Result<bool, StoreError<S::Error>> {
        if self.record.name().is_some() || name.trim().is_empty() {
            return Ok(false);
        }
        self.update(|record| record.claim_name(name))
    }

    /// Store the default weather location and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if saving fails.
    pub fn set_city(&mut self, city: &str) -> Result<(), StoreError<S::Error>> {
        self.update(|record| record.set_city(city))
    }

    /// Consume the store, returning the record.
    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        self.record
    }
}
