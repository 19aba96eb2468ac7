use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{Html, IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    dashboard::{SUMMARY_CARDS_ID, summary_cards},
    database_id::TransactionId,
    fiat::Fiat,
    ledger::LedgerTotals,
    transaction::{delete_transaction, get_transaction, get_transactions},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete the transaction and return the totals of what is left of its ledger.
fn delete_from_ledger(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(Fiat, LedgerTotals), Error> {
    let transaction =
        get_transaction(transaction_id, user_id, connection).map_err(|error| match error {
            Error::NotFound => Error::DeleteMissingTransaction,
            error => error,
        })?;

    delete_transaction(transaction_id, user_id, connection)?;
    let remaining = get_transactions(user_id, transaction.fiat, connection)?;

    Ok((
        transaction.fiat,
        LedgerTotals::from_transactions(&remaining),
    ))
}

/// A route handler for deleting a transaction.
///
/// Responds with an alert and the recomputed summary cards as an out-of-band
/// swap. The status code has to be 200 OK or htmx will not delete the table row.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => delete_from_ledger(transaction_id, user_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match result {
        Ok((fiat, totals)) => Html(
            html! {
                (summary_cards(SUMMARY_CARDS_ID, &totals, fiat, true))
                (Alert::SuccessSimple {
                    message: "Transaction deleted".to_owned(),
                }
                .into_markup())
            }
            .into_string(),
        )
        .into_response(),
        Err(error) => {
            if error != Error::DeleteMissingTransaction {
                tracing::error!("Could not delete transaction {transaction_id}: {error}");
            }
            error.into_alert_response()
        }
    }
}
