//! Static catalog of daily eco challenges
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/challenges.json");

/// A single challenge the user can be offered for the day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Challenge {
    pub text: String,
    /// Kilograms of CO2 the challenge reduces when completed.
    pub co2_kg: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("challenge catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("challenge catalog is empty")]
    Empty,
    #[error("challenge {text:?} has invalid CO2 value {co2_kg}")]
    InvalidCo2 { text: String, co2_kg: f64 },
}

#[derive(Deserialize)]
struct CatalogFile {
    challenges: Vec<Challenge>,
}

/// Fixed collection of challenge definitions. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeCatalog {
    challenges: Vec<Challenge>,
}

impl ChallengeCatalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed, the catalog is empty, or
    /// any challenge carries a non-finite or non-positive CO2 value.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_challenges(file.challenges)
    }

    /// Build a catalog from pre-parsed challenges.
    ///
    /// # Errors
    ///
    /// Returns an error under the same rules as [`ChallengeCatalog::from_json`].
    pub fn from_challenges(challenges: Vec<Challenge>) -> Result<Self, CatalogError> {
        let catalog = Self { challenges };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog bundled with the crate.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
            log::error!("bundled challenge catalog rejected: {err}");
            Self {
                challenges: vec![Challenge {
                    text: String::from("Apaga las luces que no uses"),
                    co2_kg: 0.5,
                }],
            }
        })
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.challenges.is_empty() {
            return Err(CatalogError::Empty);
        }
        if let Some(bad) = self
            .challenges
            .iter()
            .find(|c| !c.co2_kg.is_finite() || c.co2_kg <= 0.0)
        {
            return Err(CatalogError::InvalidCo2 {
                text: bad.text.clone(),
                co2_kg: bad.co2_kg,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    /// Uniformly draw one challenge. Draws are independent, so the same
    /// challenge may come up on consecutive days.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &Challenge {
        let idx = rng.gen_range(0..self.challenges.len());
        &self.challenges[idx]
    }
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
