//! Totals derived from a ledger of transactions.

use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionType};

/// The share of income in USDT that is owed as commission.
pub const COMMISSION_RATE: f64 = 0.14;

/// The sums shown above a ledger and stored with each consolidated period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of the signed fiat amounts.
    pub total_fiat: f64,
    /// Sum of the signed USDT amounts.
    pub total_usdt: f64,
    /// [COMMISSION_RATE] of the USDT income. Expenses do not reduce it.
    pub commission: f64,
}

impl LedgerTotals {
    /// Sum up `transactions`. An empty ledger gives all zeros.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut total_fiat = 0.0;
        let mut total_usdt = 0.0;
        let mut income_usdt = 0.0;

        for transaction in transactions {
            total_fiat += transaction.amount_fiat;
            total_usdt += transaction.amount_usdt;

            if transaction.transaction_type == TransactionType::Income {
                income_usdt += transaction.amount_usdt;
            }
        }

        Self {
            total_fiat,
            total_usdt,
            commission: income_usdt * COMMISSION_RATE,
        }
    }

    /// Add up the totals of several ledgers, e.g. every consolidated period.
    pub fn sum<'a>(totals: impl IntoIterator<Item = &'a LedgerTotals>) -> Self {
        totals
            .into_iter()
            .fold(LedgerTotals::default(), |acc, totals| LedgerTotals {
                total_fiat: acc.total_fiat + totals.total_fiat,
                total_usdt: acc.total_usdt + totals.total_usdt,
                commission: acc.commission + totals.commission,
            })
    }
}
