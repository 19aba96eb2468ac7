//! The consolidated period model.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::PeriodId,
    fiat::Fiat,
    ledger::LedgerTotals,
    transaction::Transaction,
};

/// Identifies the list of periods for one user and currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub user_id: UserID,
    pub fiat: Fiat,
}

impl PeriodKey {
    pub fn new(user_id: UserID, fiat: Fiat) -> Self {
        Self { user_id, fiat }
    }
}

impl Display for PeriodKey {
    /// Formats the key as "{user_id}:USDT/{FIAT}", e.g. "1:USDT/VES".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:USDT/{}", self.user_id, self.fiat)
    }
}

/// A snapshot of a ledger taken when it was consolidated.
///
/// Periods are never changed after they are created. The totals are the ones
/// computed at consolidation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub user_id: UserID,
    pub fiat: Fiat,
    /// The ledger in the order the transactions were added.
    pub transactions: Vec<Transaction>,
    /// The date of the first transaction added to the ledger.
    pub start: Date,
    /// The date of the last transaction added to the ledger.
    pub end: Date,
    pub total_fiat: f64,
    pub total_usdt: f64,
    pub commission: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Period {
    /// Snapshot `transactions` as a new period.
    ///
    /// # Errors
    /// Returns [Error::EmptyLedger] if there are no transactions.
    pub fn snapshot(
        transactions: Vec<Transaction>,
        created_at: OffsetDateTime,
    ) -> Result<PeriodBuilder, Error> {
        let (start, end) = match (transactions.first(), transactions.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(Error::EmptyLedger),
        };

        let totals = LedgerTotals::from_transactions(&transactions);

        Ok(PeriodBuilder {
            transactions,
            start,
            end,
            totals,
            created_at,
        })
    }

    /// The totals stored with the period.
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            total_fiat: self.total_fiat,
            total_usdt: self.total_usdt,
            commission: self.commission,
        }
    }

    /// A short label for the period, e.g. "2025-10-01 to 2025-10-07".
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{} to {}", self.start, self.end)
        }
    }
}

/// A period that has not been given an ID by a [PeriodList](super::PeriodList) yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBuilder {
    pub transactions: Vec<Transaction>,
    pub start: Date,
    pub end: Date,
    pub totals: LedgerTotals,
    pub created_at: OffsetDateTime,
}

impl PeriodBuilder {
    /// Give the period its ID and owner.
    pub fn finalize(self, id: PeriodId, key: &PeriodKey) -> Period {
        Period {
            id,
            user_id: key.user_id,
            fiat: key.fiat,
            transactions: self.transactions,
            start: self.start,
            end: self.end,
            total_fiat: self.totals.total_fiat,
            total_usdt: self.totals.total_usdt,
            commission: self.totals.commission,
            created_at: self.created_at,
        }
    }
}
