//! The page listing a user's consolidated periods for one currency.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::{UtcOffset, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{ledger_table, summary_cards},
    endpoints::{self, format_endpoint, format_fiat_endpoint},
    fiat::Fiat,
    html::{
        BUTTON_DELETE_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_fiat,
        format_usdt,
    },
    ledger::LedgerTotals,
    navigation::NavBar,
    not_found::NotFoundError,
    timezone::get_local_offset,
};

use super::{Period, PeriodKey, PeriodList};

/// The element ID of the totals across every period.
pub const GRAND_TOTALS_ID: &str = "grand-totals";

/// The state needed for the balances page.
#[derive(Debug, Clone)]
pub struct BalancesState {
    pub period_list: Arc<dyn PeriodList>,
    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,
}

impl FromRef<AppState> for BalancesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            period_list: state.period_list.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The totals of every period added together.
pub fn grand_totals(periods: &[Period]) -> LedgerTotals {
    let totals: Vec<LedgerTotals> = periods.iter().map(Period::totals).collect();
    LedgerTotals::sum(&totals)
}

fn period_card(period: &Period, local_offset: UtcOffset) -> Markup {
    let delete_url = format_endpoint(
        &format_fiat_endpoint(endpoints::PERIOD, period.fiat),
        period.id,
    );
    let created_at = period
        .created_at
        .to_offset(local_offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|error| {
            tracing::error!("Could not format period timestamp: {error}");
            period.created_at.to_string()
        });

    html! {
        article id={ "period-" (period.id) } class={ "mb-6 " (CARD_STYLE) }
        {
            header class="flex flex-wrap items-start justify-between gap-2 mb-4"
            {
                div
                {
                    h2 class="text-lg font-semibold" { (period.label()) }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Consolidated " (created_at) " · " (period.transactions.len()) " transactions"
                    }
                }

                button
                    type="button"
                    hx-delete=(delete_url)
                    hx-confirm={ "Delete the period " (period.label()) "? This cannot be undone." }
                    hx-target="closest article"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }

            dl class="grid grid-cols-1 gap-2 mb-4 text-sm sm:grid-cols-3"
            {
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Total " (period.fiat.code()) }
                    dd class="font-semibold" { (format_fiat(period.total_fiat, period.fiat)) }
                }
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Total USDT" }
                    dd class="font-semibold" { (format_usdt(period.total_usdt)) }
                }
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Commission (14%)" }
                    dd class="font-semibold" { (format_usdt(period.commission)) }
                }
            }

            (ledger_table(&period.transactions, period.fiat, false))
        }
    }
}

fn balances_view(fiat: Fiat, periods: &[Period], local_offset: UtcOffset) -> Markup {
    let dashboard_url = format_fiat_endpoint(endpoints::DASHBOARD_VIEW, fiat);
    let nav_bar = NavBar::new(&format_fiat_endpoint(endpoints::BALANCES_VIEW, fiat)).into_html();

    html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl"
            {
                header class="flex flex-wrap items-baseline justify-between gap-2 mb-6"
                {
                    h1 class="text-2xl font-bold" { (fiat.code()) " Balances" }
                    a href=(dashboard_url) class=(LINK_STYLE) { "Back to dashboard" }
                }

                (summary_cards(GRAND_TOTALS_ID, &grand_totals(periods), fiat, false))

                @if periods.is_empty() {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No periods yet. Consolidate the ledger on the dashboard to create one."
                    }
                }

                // Newest first.
                @for period in periods.iter().rev() {
                    (period_card(period, local_offset))
                }
            }
        }
    }
}

/// Display every period consolidated from the ledger for the currency in the URL.
pub async fn get_balances_page(
    State(state): State<BalancesState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<String>,
) -> Response {
    let Ok(fiat) = fiat.parse::<Fiat>() else {
        return NotFoundError.into_response();
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let key = PeriodKey::new(user_id, fiat);
    let periods = match state.period_list.read(&key) {
        Ok(periods) => periods,
        Err(error) => {
            tracing::error!("Could not read the periods for {key}: {error}");
            return Error::from(error).into_response();
        }
    };

    base(
        &format!("{} Balances", fiat.code()),
        &balances_view(fiat, &periods, local_offset),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        db::initialize,
        endpoints::{self, format_endpoint, format_fiat_endpoint},
        fiat::Fiat,
        period::{
            PeriodKey, PeriodList, SqlitePeriodList,
            test_utils::{test_builder, test_transaction},
        },
        test_utils::{assert_valid_html, select_text},
        transaction::TransactionType,
    };

    use super::{BalancesState, get_balances_page};

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let period_list = SqlitePeriodList::new(Arc::new(Mutex::new(connection)));
        let key = PeriodKey::new(UserID::new(1), Fiat::Ves);

        period_list
            .append(
                &key,
                test_builder(vec![
                    test_transaction(1, TransactionType::Income, 360.0, 2.0, date!(2025 - 10 - 01)),
                    test_transaction(2, TransactionType::Expense, 180.0, 1.0, date!(2025 - 10 - 02)),
                ]),
            )
            .unwrap();
        period_list
            .append(
                &key,
                test_builder(vec![test_transaction(
                    3,
                    TransactionType::Income,
                    900.0,
                    5.0,
                    date!(2025 - 10 - 05),
                )]),
            )
            .unwrap();

        let app = Router::new()
            .route(endpoints::BALANCES_VIEW, get(get_balances_page))
            .layer(Extension(UserID::new(1)))
            .with_state(BalancesState {
                period_list: Arc::new(period_list),
                local_timezone: "Etc/UTC".to_owned(),
            });

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn lists_periods_newest_first_with_grand_totals() {
        let server = get_test_server();

        let response = server
            .get(&format_fiat_endpoint(endpoints::BALANCES_VIEW, Fiat::Ves))
            .await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        assert_valid_html(&html);

        let grand_totals = select_text(&html, "#grand-totals p");
        assert_eq!(grand_totals, ["Bs 1,080.00", "6.00 USDT", "0.98 USDT"]);

        let labels = select_text(&html, "article h2");
        assert_eq!(labels, ["2025-10-05", "2025-10-01 to 2025-10-02"]);

        let delete_button = html
            .select(&Selector::parse("#period-1 button[hx-delete]").unwrap())
            .next()
            .expect("no delete button");
        assert_eq!(
            delete_button.value().attr("hx-delete"),
            Some(format_endpoint(&format_fiat_endpoint(endpoints::PERIOD, Fiat::Ves), 1).as_str())
        );

        let rows = html
            .select(&Selector::parse("#period-1 tbody tr").unwrap())
            .count();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn other_currency_has_no_periods() {
        let server = get_test_server();

        let response = server
            .get(&format_fiat_endpoint(endpoints::BALANCES_VIEW, Fiat::Cop))
            .await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        assert!(
            html.select(&Selector::parse("article").unwrap())
                .next()
                .is_none()
        );
        let text: String = html.root_element().text().collect();
        assert!(text.contains("No periods yet."));
    }

    #[tokio::test]
    async fn unknown_currency_is_not_found() {
        let server = get_test_server();

        server
            .get("/dashboard/eur/balances")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
