//! Defines the persisted list that consolidated periods are appended to.

use std::fmt::Debug;

use crate::database_id::PeriodId;

use super::{Period, PeriodBuilder, PeriodKey};

/// The errors a [PeriodList] may return.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PeriodStoreError {
    /// The backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The stored periods could not be converted to or from JSON.
    #[error("could not (de)serialize periods: {0}")]
    Serialization(String),

    /// The period table could not be queried.
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A previous writer panicked while holding the lock.
    #[error("the period list lock is poisoned")]
    LockPoisoned,
}

impl From<serde_json::Error> for PeriodStoreError {
    fn from(error: serde_json::Error) -> Self {
        PeriodStoreError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for PeriodStoreError {
    fn from(error: std::io::Error) -> Self {
        PeriodStoreError::Io(error.to_string())
    }
}

/// Stores the consolidated periods of each user and currency.
///
/// Periods come back from [PeriodList::read] in the order they were appended.
pub trait PeriodList: Debug + Send + Sync {
    /// Get every period stored under `key`.
    fn read(&self, key: &PeriodKey) -> Result<Vec<Period>, PeriodStoreError>;

    /// Give `period` an ID and add it to the end of the list for `key`.
    fn append(&self, key: &PeriodKey, period: PeriodBuilder) -> Result<Period, PeriodStoreError>;

    /// Remove period `id` from the list for `key`.
    ///
    /// Returns `false` if there was no such period.
    fn delete(&self, key: &PeriodKey, id: PeriodId) -> Result<bool, PeriodStoreError>;
}
