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
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    endpoints::{self, format_fiat_endpoint},
    timezone::local_today,
    transaction::{TransactionUpdate, update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The fields of a transaction to change. Missing fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct EditTransactionForm {
    date: Option<Date>,
    description: Option<String>,
    amount_fiat: Option<f64>,
    amount_usdt: Option<f64>,
}

impl EditTransactionForm {
    fn validate(self, today: Date) -> Result<TransactionUpdate, Error> {
        if let Some(date) = self.date
            && date > today
        {
            return Err(Error::Validation(format!(
                "{date} is in the future, pick a date on or before {today}."
            )));
        }

        let description = match self.description {
            Some(description) if description.trim().is_empty() => {
                return Err(Error::Validation("The description cannot be empty.".to_owned()));
            }
            description => description.map(|description| description.trim().to_owned()),
        };

        for amount in [self.amount_fiat, self.amount_usdt].into_iter().flatten() {
            if !amount.is_finite() {
                return Err(Error::Validation(format!("{amount} is not a valid amount.")));
            }
        }

        Ok(TransactionUpdate {
            date: self.date,
            description,
            amount_fiat: self.amount_fiat,
            amount_usdt: self.amount_usdt,
        })
    }
}

/// A route handler for changing a transaction, redirects to the dashboard the
/// transaction belongs to on success.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<EditTransactionForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let update = match form.validate(today) {
        Ok(update) => update,
        Err(error) => return error.into_alert_response(),
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => update_transaction(transaction_id, user_id, update, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match result {
        Ok(transaction) => (
            HxRedirect(format_fiat_endpoint(
                endpoints::DASHBOARD_VIEW,
                transaction.fiat,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}
