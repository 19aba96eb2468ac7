//! Creates the database schema for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, auth::create_user_table, period::create_period_table,
    transaction::create_transaction_table,
};

/// Create the tables for users, transactions and periods if they do not exist.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created, in
/// which case none of them are.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_period_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
