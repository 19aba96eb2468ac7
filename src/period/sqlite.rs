//! Implements a SQLite backed period list.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};

use crate::{auth::UserID, database_id::PeriodId, transaction::Transaction};

use super::{Period, PeriodBuilder, PeriodKey, PeriodList, PeriodStoreError};

/// Stores periods in the `period` table, with each period's transactions
/// kept as a JSON array.
#[derive(Debug, Clone)]
pub struct SqlitePeriodList {
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePeriodList {
    /// Create a new period list for the SQLite `connection`.
    ///
    /// The `period` table must already exist, see [create_period_table].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, PeriodStoreError> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            PeriodStoreError::LockPoisoned
        })
    }
}

/// Create the period table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_period_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS period (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                fiat TEXT NOT NULL,
                transactions TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                total_fiat REAL NOT NULL,
                total_usdt REAL NOT NULL,
                commission REAL NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_period_row(row: &Row) -> Result<Period, rusqlite::Error> {
    let raw_transactions: String = row.get(3)?;
    let transactions: Vec<Transaction> = serde_json::from_str(&raw_transactions)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    Ok(Period {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        fiat: row.get(2)?,
        transactions,
        start: row.get(4)?,
        end: row.get(5)?,
        total_fiat: row.get(6)?,
        total_usdt: row.get(7)?,
        commission: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl PeriodList for SqlitePeriodList {
    fn read(&self, key: &PeriodKey) -> Result<Vec<Period>, PeriodStoreError> {
        let connection = self.lock()?;

        let periods = connection
            .prepare(
                "SELECT id, user_id, fiat, transactions, start_date, end_date, \
                    total_fiat, total_usdt, commission, created_at \
                 FROM period WHERE user_id = ?1 AND fiat = ?2 ORDER BY id ASC",
            )?
            .query_map((key.user_id.as_i64(), key.fiat), map_period_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(periods)
    }

    fn append(&self, key: &PeriodKey, period: PeriodBuilder) -> Result<Period, PeriodStoreError> {
        let transactions = serde_json::to_string(&period.transactions)?;
        let connection = self.lock()?;

        connection.execute(
            "INSERT INTO period (user_id, fiat, transactions, start_date, end_date, \
                total_fiat, total_usdt, commission, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            (
                key.user_id.as_i64(),
                key.fiat,
                transactions,
                period.start,
                period.end,
                period.totals.total_fiat,
                period.totals.total_usdt,
                period.totals.commission,
                period.created_at,
            ),
        )?;

        let id = connection.last_insert_rowid();

        Ok(period.finalize(id, key))
    }

    fn delete(&self, key: &PeriodKey, id: PeriodId) -> Result<bool, PeriodStoreError> {
        let connection = self.lock()?;

        let rows_affected = connection.execute(
            "DELETE FROM period WHERE id = ?1 AND user_id = ?2 AND fiat = ?3",
            (id, key.user_id.as_i64(), key.fiat),
        )?;

        Ok(rows_affected > 0)
    }
}
