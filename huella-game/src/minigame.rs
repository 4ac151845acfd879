//! "Catch the litter" minigame: guess which of three spots hides it.
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use crate::ProgressStorage;
use crate::constants::{MINIGAME_BONUS_CO2_KG, MINIGAME_BONUS_POINTS};
use crate::progress::Reward;
use crate::store::{ProgressStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Left,
    Center,
    Right,
}

pub const POSITIONS: [Position; 3] = [Position::Left, Position::Center, Position::Right];

impl Position {
    /// Word the player types for this position.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "izquierda",
            Self::Center => "centro",
            Self::Right => "derecha",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown position {0:?}")]
pub struct ParsePositionError(String);

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "izquierda" | "left" => Ok(Self::Left),
            "centro" | "center" => Ok(Self::Center),
            "derecha" | "right" => Ok(Self::Right),
            other => Err(ParsePositionError(other.to_string())),
        }
    }
}

/// What a single round paid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinigameOutcome {
    pub won: bool,
    pub target: Position,
    pub points_awarded: u32,
    pub co2_awarded: f64,
}

/// Hide the litter uniformly at one of the three positions.
pub fn hide_target<R: Rng + ?Sized>(rng: &mut R) -> Position {
    POSITIONS[rng.gen_range(0..POSITIONS.len())]
}

/// Payout for a guess against the hidden target. An unreadable guess misses.
#[must_use]
pub fn evaluate(target: Position, guess: Option<Position>) -> MinigameOutcome {
    let won = guess == Some(target);
    let reward = if won {
        Reward::new(MINIGAME_BONUS_POINTS, MINIGAME_BONUS_CO2_KG)
    } else {
        Reward::none()
    };
    MinigameOutcome {
        won,
        target,
        points_awarded: reward.points,
        co2_awarded: reward.co2_kg,
    }
}

/// Score one round and persist the record, whether or not the guess hit.
///
/// # Errors
///
/// Returns [`StoreError::Persist`] if saving fails.
pub fn play_round<S: ProgressStorage>(
    store: &mut ProgressStore<S>,
    target: Position,
    guess: Option<Position>,
) -> Result<MinigameOutcome, StoreError<S::Error>> {
    let outcome = evaluate(target, guess);
    store.update(|record| {
        record.award(Reward::new(outcome.points_awarded, outcome.co2_awarded));
    })?;
    log::debug!(
        "minigame target {target}, guess {guess:?}, won: {}",
        outcome.won
    );
    Ok(outcome)
}
