//! Turns a ledger into a period.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
    transaction::{delete_transactions, get_transactions},
    workspace::Workspaces,
};

use super::{Period, PeriodKey, PeriodList};

/// The state needed to consolidate a ledger.
#[derive(Debug, Clone)]
pub struct ConsolidateState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub workspaces: Workspaces,
    pub period_list: Arc<dyn PeriodList>,
    pub consolidation_locks: ConsolidationLocks,
}

impl FromRef<AppState> for ConsolidateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            workspaces: state.workspaces.clone(),
            period_list: state.period_list.clone(),
            consolidation_locks: state.consolidation_locks.clone(),
        }
    }
}

/// One lock per ledger, held for the whole of a consolidation so that two
/// requests for the same ledger cannot both snapshot it.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationLocks(Arc<Mutex<HashMap<PeriodKey, Arc<Mutex<()>>>>>);

impl ConsolidationLocks {
    fn for_key(&self, key: &PeriodKey) -> Result<Arc<Mutex<()>>, Error> {
        let mut locks = self.0.lock().map_err(|error| {
            tracing::error!("could not acquire consolidation locks: {error}");
            Error::DatabaseLockError
        })?;

        Ok(locks.entry(*key).or_default().clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    mutex.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Move the ledger for `key` into a new period.
///
/// The ledger is only cleared once the period has been saved, so a failure to
/// save leaves the ledger as it was. If the ledger cannot be cleared the new
/// period is removed again.
///
/// Consolidations of the same ledger run one at a time, so a second request
/// that waited on the first finds an empty ledger.
///
/// # Errors
/// Returns:
/// - [Error::EmptyLedger] if there is nothing to consolidate,
/// - [Error::PeriodStore] if the period could not be saved,
/// - or [Error::SqlError] if the ledger could not be read or cleared.
pub fn consolidate(
    key: &PeriodKey,
    db_connection: &Mutex<Connection>,
    period_list: &dyn PeriodList,
    locks: &ConsolidationLocks,
    created_at: OffsetDateTime,
) -> Result<Period, Error> {
    let key_lock = locks.for_key(key)?;
    let _guard = lock(&key_lock)?;

    // The SQLite period list locks the same connection, so the connection
    // lock must be released before appending.
    let transactions = get_transactions(key.user_id, key.fiat, &*lock(db_connection)?)?;
    let ids: Vec<_> = transactions.iter().map(|transaction| transaction.id).collect();

    let period = period_list.append(key, Period::snapshot(transactions, created_at)?)?;

    let deleted = match lock(db_connection)
        .and_then(|connection| delete_transactions(&ids, key.user_id, &connection))
    {
        Ok(deleted) => deleted,
        Err(error) => {
            tracing::error!(
                "Could not clear the ledger for {key}, removing period {}",
                period.id
            );
            if let Err(rollback_error) = period_list.delete(key, period.id) {
                tracing::error!("Could not remove period {}: {rollback_error}", period.id);
            }
            return Err(error);
        }
    };

    if deleted != ids.len() {
        tracing::warn!(
            "Expected to clear {} transactions for {key} but cleared {deleted}",
            ids.len()
        );
    }
    tracing::info!(
        "Consolidated {deleted} transactions for {key} into period {}",
        period.id
    );

    Ok(period)
}

/// A route handler for consolidating the ledger for the currency in the URL,
/// redirects to the balances page on success.
///
/// The dashboard's draft and rate are reset so the next visit starts fresh.
pub async fn consolidate_endpoint(
    State(state): State<ConsolidateState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<Fiat>,
) -> Response {
    let key = PeriodKey::new(user_id, fiat);

    if let Err(error) = consolidate(
        &key,
        &state.db_connection,
        state.period_list.as_ref(),
        &state.consolidation_locks,
        OffsetDateTime::now_utc(),
    ) {
        if error != Error::EmptyLedger {
            tracing::error!("Could not consolidate {key}: {error}");
        }
        return error.into_alert_response();
    }

    if let Err(error) = state
        .workspaces
        .update(user_id, fiat, |workspace| workspace.reset())
    {
        return error.into_alert_response();
    }

    (
        HxRedirect(format_fiat_endpoint(endpoints::BALANCES_VIEW, fiat)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
