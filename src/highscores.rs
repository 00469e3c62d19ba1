//! Best value per game
//!
//! Each game keeps a single scalar high-water mark (distance score for the
//! runner, campaign wealth for the quest) stored as a decimal string under
//! its ruleset's `best_key`. Unreadable storage counts as a best of 0.

use crate::error::StorageError;
use crate::persistence::Storage;

/// Persisted best value under one storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestScore {
    pub key: String,
    pub value: u64,
}

impl BestScore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: 0,
        }
    }

    /// Read the stored best, degrading to 0 on any failure
    pub fn load(storage: &dyn Storage, key: &str) -> Self {
        let value = match storage.get(key) {
            Ok(Some(text)) => match text.trim().parse::<u64>() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("{}", StorageError::Malformed { key: key.into() });
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                log::warn!("Could not read best value: {e}");
                0
            }
        };
        log::info!("Best value under `{}`: {}", key, value);
        Self {
            key: key.to_string(),
            value,
        }
    }

    /// Offer a finished run's value; returns true when it raised the best
    pub fn submit(&mut self, value: u64) -> bool {
        if value > self.value {
            self.value = value;
            true
        } else {
            false
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.set(&self.key, &self.value.to_string())
    }
}
