//! Implements a period list kept in a single JSON file.
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

use crate::database_id::PeriodId;

use super::{Period, PeriodBuilder, PeriodKey, PeriodList, PeriodStoreError};

type PeriodMap = BTreeMap<String, Vec<Period>>;

/// Stores periods in a JSON object that maps each [PeriodKey] string, e.g.
/// "1:USDT/VES", to an array of periods.
///
/// The whole file is read and rewritten on every change, so this is only
/// suitable for small installs.
#[derive(Debug)]
pub struct JsonFilePeriodList {
    path: PathBuf,
    file_lock: Mutex<()>,
}

impl JsonFilePeriodList {
    /// Use the file at `path`. It is created on the first append.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<PeriodMap, PeriodStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(PeriodMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(PeriodMap::new()),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, periods: &PeriodMap) -> Result<(), PeriodStoreError> {
        let contents = serde_json::to_string_pretty(periods)?;

        // Atomic replace.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn with_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, PeriodStoreError>,
    ) -> Result<T, PeriodStoreError> {
        let _guard = self
            .file_lock
            .lock()
            .map_err(|_| PeriodStoreError::LockPoisoned)?;

        f()
    }
}

impl PeriodList for JsonFilePeriodList {
    fn read(&self, key: &PeriodKey) -> Result<Vec<Period>, PeriodStoreError> {
        self.with_lock(|| {
            let mut periods = self.load()?;

            Ok(periods.remove(&key.to_string()).unwrap_or_default())
        })
    }

    fn append(&self, key: &PeriodKey, period: PeriodBuilder) -> Result<Period, PeriodStoreError> {
        self.with_lock(|| {
            let mut periods = self.load()?;

            let next_id = periods
                .values()
                .flatten()
                .map(|period| period.id)
                .max()
                .unwrap_or(0)
                + 1;
            let period = period.finalize(next_id, key);

            periods
                .entry(key.to_string())
                .or_default()
                .push(period.clone());
            self.save(&periods)?;

            Ok(period)
        })
    }

    fn delete(&self, key: &PeriodKey, id: PeriodId) -> Result<bool, PeriodStoreError> {
        self.with_lock(|| {
            let mut periods = self.load()?;

            let Some(list) = periods.get_mut(&key.to_string()) else {
                return Ok(false);
            };

            let count_before = list.len();
            list.retain(|period| period.id != id);
            if list.len() == count_before {
                return Ok(false);
            }

            self.save(&periods)?;

            Ok(true)
        })
    }
}
