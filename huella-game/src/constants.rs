//! Scoring constants for Huella progress logic.
//!
//! Payouts live here rather than in data files so they can only change
//! through reviewed code.

/// Points earned per kilogram of CO2 a completed challenge reduces.
pub(crate) const POINTS_PER_KG: f64 = 10.0;

// Minigame payout ----------------------------------------------------------
pub const MINIGAME_BONUS_POINTS: u32 = 5;
pub const MINIGAME_BONUS_CO2_KG: f64 = 0.5;

/// Default file name for persisted progress, relative to the working directory.
pub const DEFAULT_PROGRESS_FILE: &str = "progreso.json";
