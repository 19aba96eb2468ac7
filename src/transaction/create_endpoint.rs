//! Defines the endpoint for adding a transaction to a ledger.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::DraftForm,
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
    rate::convert,
    timezone::local_today,
    transaction::{Transaction, count_transactions, create_transaction},
    workspace::Workspaces,
};

/// The state needed to add a transaction to a ledger.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Holds the rate the amount is converted with.
    pub workspaces: Workspaces,
    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            workspaces: state.workspaces.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for adding a transaction to the ledger for the currency in
/// the URL, redirects to the dashboard on success.
///
/// Unless the form has a USDT amount, the fiat amount is converted with the
/// dashboard's current rate. The transaction is dated today in the server's
/// timezone.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<Fiat>,
    Form(form): Form<DraftForm>,
) -> Response {
    let amount_fiat = match form.parsed_amount() {
        Some(amount) if amount != 0.0 => amount,
        _ => {
            return Error::Validation("Enter an amount other than zero.".to_owned())
                .into_alert_response();
        }
    };

    let amount_usdt = match form.parsed_amount_usdt() {
        Some(amount_usdt) => amount_usdt,
        None => match convert_with_workspace_rate(&state.workspaces, user_id, fiat, amount_fiat) {
            Ok(amount_usdt) => amount_usdt,
            Err(error) => return error.into_alert_response(),
        },
    };

    let date = match local_today(&state.local_timezone) {
        Ok(date) => date,
        Err(error) => return error.into_alert_response(),
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => {
            add_transaction(&form, fiat, user_id, amount_fiat, amount_usdt, date, &connection)
        }
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match result {
        Ok(transaction) => {
            tracing::debug!(
                "Added transaction {} to the {} ledger of user {user_id}",
                transaction.id,
                fiat.code()
            );
        }
        Err(error) => {
            tracing::error!("Could not create transaction for user {user_id}: {error}");
            return error.into_alert_response();
        }
    }

    if let Err(error) = state
        .workspaces
        .update(user_id, fiat, |workspace| workspace.clear_draft())
    {
        return error.into_alert_response();
    }

    (
        HxRedirect(format_fiat_endpoint(endpoints::DASHBOARD_VIEW, fiat)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn convert_with_workspace_rate(
    workspaces: &Workspaces,
    user_id: UserID,
    fiat: Fiat,
    amount_fiat: f64,
) -> Result<f64, Error> {
    let rate = workspaces.get(user_id, fiat)?.rate.value().ok_or_else(|| {
        Error::Validation(
            "The exchange rate has not loaded yet. Refresh the rate and try again.".to_owned(),
        )
    })?;

    convert(amount_fiat, rate).ok_or_else(|| {
        Error::Validation(format!("Could not convert {amount_fiat} at a rate of {rate}."))
    })
}

fn add_transaction(
    form: &DraftForm,
    fiat: Fiat,
    user_id: UserID,
    amount_fiat: f64,
    amount_usdt: f64,
    date: time::Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = match form.description.trim() {
        "" => format!(
            "Transaction #{}",
            count_transactions(user_id, fiat, connection)? + 1
        ),
        description => description.to_owned(),
    };

    create_transaction(
        Transaction::build(
            user_id,
            fiat,
            form.transaction_type,
            amount_fiat,
            amount_usdt,
            date,
        )
        .description(&description),
        connection,
    )
}
