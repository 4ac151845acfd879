//! Huella Progress Engine
//!
//! Platform-agnostic core logic for the Huella eco-habit tracker: the
//! challenge catalog, the persisted progress record, the once-per-day
//! challenge engine and the minigame. No terminal, network or async
//! dependencies live here.

pub mod catalog;
pub mod constants;
pub mod daily;
pub mod minigame;
pub mod progress;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use catalog::{CatalogError, Challenge, ChallengeCatalog};
pub use daily::{
    ChallengeOutcome, Clock, DailyChallenge, DailyError, DailyStatus, FixedClock, SystemClock,
    points_for, status,
};
pub use minigame::{MinigameOutcome, Position, evaluate, hide_target, play_round};
pub use progress::{HistoryEntry, ProgressError, ProgressRecord, Reward};
pub use storage::{JsonFileStorage, MemoryStorage, StorageError, decode_record, encode_record};
pub use store::{ProgressStore, StoreError};

/// Trait for abstracting save/load of the progress record.
/// Platform-specific implementations should provide this.
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stored record, `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<ProgressRecord>, Self::Error>;

    /// Overwrite the stored record. A later `load` must never observe a
    /// partially written record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, record: &ProgressRecord) -> Result<(), Self::Error>;
}
