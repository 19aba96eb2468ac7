//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    database_id::{DatabaseId, TransactionId},
    fiat::Fiat,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned. Both amounts are stored as positive numbers.
    Income,
    /// Money spent. Both amounts are stored as negative numbers.
    Expense,
}

impl TransactionType {
    /// Give `amount` the sign this type of transaction is stored with.
    ///
    /// The sign the user typed is ignored, so entering `100` or `-100` for an
    /// expense both give `-100`.
    pub fn normalize(self, amount: f64) -> f64 {
        match self {
            TransactionType::Income => amount.abs(),
            TransactionType::Expense => -amount.abs(),
        }
    }

    /// The value used in forms and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction type \"{other}\"").into(),
            )),
        }
    }
}

/// An income or expense recorded in a fiat currency together with its USDT
/// equivalent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user the transaction belongs to.
    pub user_id: UserID,
    /// The currency of `amount_fiat`.
    pub fiat: Fiat,
    /// Whether this is an income or an expense.
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The signed amount in the local currency.
    pub amount_fiat: f64,
    /// The signed amount in USDT.
    pub amount_usdt: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        fiat: Fiat,
        transaction_type: TransactionType,
        amount_fiat: f64,
        amount_usdt: f64,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            fiat,
            transaction_type,
            description: String::new(),
            amount_fiat,
            amount_usdt,
            date,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The amounts may be given with any sign, [create_transaction] stores them
/// with the sign of the transaction type.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The owner of the transaction.
    pub user_id: UserID,
    /// The currency the ledger is kept in.
    pub fiat: Fiat,
    /// Whether this is an income or an expense.
    pub transaction_type: TransactionType,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The amount in the local currency.
    pub amount_fiat: f64,
    /// The amount in USDT.
    pub amount_usdt: f64,
    /// The date when the transaction occurred.
    pub date: Date,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction_type = builder.transaction_type;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" \
                (user_id, fiat, transaction_type, description, amount_fiat, amount_usdt, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, fiat, transaction_type, description, amount_fiat, amount_usdt, date",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.fiat,
                transaction_type,
                builder.description,
                transaction_type.normalize(builder.amount_fiat),
                transaction_type.normalize(builder.amount_usdt),
                builder.date,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, fiat, transaction_type, description, amount_fiat, amount_usdt, date \
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the ledger for one user and currency in the order the transactions
/// were added.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: UserID,
    fiat: Fiat,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, fiat, transaction_type, description, amount_fiat, amount_usdt, date \
             FROM \"transaction\" WHERE user_id = ?1 AND fiat = ?2 ORDER BY id ASC",
        )?
        .query_map((user_id.as_i64(), fiat), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the number of transactions in a user's ledger.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(
    user_id: UserID,
    fiat: Fiat,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1 AND fiat = ?2;",
            (user_id.as_i64(), fiat),
            |row| {
                let count: i64 = row.get(0)?;
                usize::try_from(count)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))
            },
        )
        .map_err(|error| error.into())
}

/// The number of rows changed by an update or delete.
pub type RowsAffected = usize;

/// Delete the transactions in `ids` that belong to `user_id`.
///
/// Either all of the transactions are deleted or none are.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transactions(
    ids: &[TransactionId],
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let mut rows_affected = 0;
    {
        let mut statement = sql_transaction
            .prepare("DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2")?;

        for id in ids {
            rows_affected += statement.execute((id, user_id.as_i64()))?;
        }
    }

    sql_transaction.commit()?;

    Ok(rows_affected)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the user has no transaction with `id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match delete_transactions(&[id], user_id, connection)? {
        0 => Err(Error::DeleteMissingTransaction),
        _ => Ok(()),
    }
}

/// The fields of a transaction that can be edited after it is created.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// The new date.
    pub date: Option<Date>,
    /// The new description.
    pub description: Option<String>,
    /// The new amount in the local currency, with any sign.
    pub amount_fiat: Option<f64>,
    /// The new amount in USDT, with any sign.
    pub amount_usdt: Option<f64>,
}

/// Change the fields of transaction `id` given in `update`.
///
/// The amounts keep the sign of the transaction's type.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the user has no transaction with `id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let current = get_transaction(id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;
    let transaction_type = current.transaction_type;

    let updated = Transaction {
        date: update.date.unwrap_or(current.date),
        description: update.description.unwrap_or(current.description),
        amount_fiat: update
            .amount_fiat
            .map_or(current.amount_fiat, |amount| transaction_type.normalize(amount)),
        amount_usdt: update
            .amount_usdt
            .map_or(current.amount_usdt, |amount| transaction_type.normalize(amount)),
        ..current
    };

    connection.execute(
        "UPDATE \"transaction\" \
         SET description = ?1, amount_fiat = ?2, amount_usdt = ?3, date = ?4 \
         WHERE id = ?5 AND user_id = ?6",
        (
            &updated.description,
            updated.amount_fiat,
            updated.amount_usdt,
            updated.date,
            id,
            user_id.as_i64(),
        ),
    )?;

    Ok(updated)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                fiat TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                description TEXT NOT NULL,
                amount_fiat REAL NOT NULL,
                amount_usdt REAL NOT NULL,
                date TEXT NOT NULL
                )",
        (),
    )?;

    // The ledger query always filters on both columns.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_fiat ON \"transaction\"(user_id, fiat);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let fiat = row.get(2)?;
    let transaction_type = row.get(3)?;
    let description = row.get(4)?;
    let amount_fiat = row.get(5)?;
    let amount_usdt = row.get(6)?;
    let date = row.get(7)?;

    Ok(Transaction {
        id,
        user_id,
        fiat,
        transaction_type,
        description,
        amount_fiat,
        amount_usdt,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_type_tests {
    use super::TransactionType;

    #[test]
    fn expense_is_negative() {
        assert_eq!(TransactionType::Expense.normalize(100.0), -100.0);
        assert_eq!(TransactionType::Expense.normalize(-100.0), -100.0);
    }

    #[test]
    fn income_is_positive() {
        assert_eq!(TransactionType::Income.normalize(100.0), 100.0);
        assert_eq!(TransactionType::Income.normalize(-100.0), 100.0);
    }
}
