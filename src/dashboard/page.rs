//! The dashboard page for one currency.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        cards::{SUMMARY_CARDS_ID, summary_cards},
        draft::draft_form,
        ledger_table::ledger_table,
        rate_panel::rate_panel,
    },
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    ledger::LedgerTotals,
    navigation::NavBar,
    not_found::NotFoundError,
    timezone::get_local_offset,
    transaction::{Transaction, get_transactions},
    workspace::{Workspace, Workspaces},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub workspaces: Workspaces,
    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            workspaces: state.workspaces.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the dashboard for the currency in the URL, e.g. "/dashboard/cop".
///
/// The page asks for a fresh rate as soon as it has loaded.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<String>,
) -> Response {
    let Ok(fiat) = fiat.parse::<Fiat>() else {
        return NotFoundError.into_response();
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let transactions = match state.db_connection.lock() {
        Ok(connection) => get_transactions(user_id, fiat, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };
    let transactions = match transactions {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("Could not get the ledger for user {user_id}: {error}");
            return error.into_response();
        }
    };

    let workspace = match state.workspaces.get(user_id, fiat) {
        Ok(workspace) => workspace,
        Err(error) => return error.into_response(),
    };

    let content = dashboard_view(fiat, &transactions, &workspace, local_offset);

    base(&format!("{} Dashboard", fiat.code()), &content).into_response()
}

fn dashboard_view(
    fiat: Fiat,
    transactions: &[Transaction],
    workspace: &Workspace,
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = NavBar::new(&format_fiat_endpoint(endpoints::DASHBOARD_VIEW, fiat)).into_html();
    let totals = LedgerTotals::from_transactions(transactions);

    html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl"
            {
                header class="flex flex-wrap items-baseline justify-between gap-2 mb-6"
                {
                    h1 class="text-2xl font-bold" { (fiat.code()) " Dashboard" }
                    a href=(format_fiat_endpoint(endpoints::BALANCES_VIEW, fiat)) class=(LINK_STYLE)
                    {
                        "View balances"
                    }
                }

                (summary_cards(SUMMARY_CARDS_ID, &totals, fiat, false))

                div class="grid grid-cols-1 gap-4 mb-6 md:grid-cols-2"
                {
                    (rate_panel(fiat, &workspace.rate, local_offset, true))
                    (draft_form(fiat, &workspace.draft, transactions.len() + 1))
                }

                section
                {
                    div class="flex flex-wrap items-center justify-between gap-2 mb-4"
                    {
                        h2 class="text-xl font-semibold" { "Transactions" }

                        div class="w-full sm:w-auto"
                        {
                            button
                                type="button"
                                id="consolidate-button"
                                hx-post=(format_fiat_endpoint(endpoints::CONSOLIDATE, fiat))
                                hx-confirm={
                                    "Consolidate " (transactions.len())
                                    " transactions into a new period? The ledger will be cleared."
                                }
                                hx-target-error="#alert-container"
                                hx-disabled-elt="this"
                                disabled[transactions.is_empty()]
                                class=(BUTTON_PRIMARY_STYLE)
                            {
                                "Consolidate"
                            }
                        }
                    }

                    (ledger_table(transactions, fiat, true))
                }
            }
        }
    }
}
