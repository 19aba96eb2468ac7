use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{Html, IntoResponse, Response},
};
use maud::html;

use crate::{
    AppState, Error, alert::Alert, auth::UserID, dashboard::summary_cards,
    database_id::PeriodId, fiat::Fiat,
};

use super::{PeriodKey, PeriodList, balances_page::GRAND_TOTALS_ID, balances_page::grand_totals};

/// The state needed to delete a period.
#[derive(Debug, Clone)]
pub struct DeletePeriodState {
    pub period_list: Arc<dyn PeriodList>,
}

impl FromRef<AppState> for DeletePeriodState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            period_list: state.period_list.clone(),
        }
    }
}

/// A route handler for deleting a period.
///
/// Responds with an alert and the recomputed grand totals as an out-of-band
/// swap so htmx can remove the period from the page.
pub async fn delete_period_endpoint(
    State(state): State<DeletePeriodState>,
    Extension(user_id): Extension<UserID>,
    Path((fiat, period_id)): Path<(Fiat, PeriodId)>,
) -> Response {
    let key = PeriodKey::new(user_id, fiat);

    let result = state
        .period_list
        .delete(&key, period_id)
        .and_then(|deleted| Ok((deleted, state.period_list.read(&key)?)));

    match result {
        Ok((false, _)) => Error::DeleteMissingPeriod.into_alert_response(),
        Ok((true, periods)) => Html(
            html! {
                (summary_cards(GRAND_TOTALS_ID, &grand_totals(&periods), fiat, true))
                (Alert::SuccessSimple {
                    message: "Period deleted".to_owned(),
                }
                .into_markup())
            }
            .into_string(),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete period {period_id} for {key}: {error}");
            Error::from(error).into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Extension, Router, http::StatusCode, routing::delete};
    use axum_test::TestServer;
    use scraper::Html;
    use tempfile::TempDir;
    use time::macros::date;

    use crate::{
        auth::UserID,
        endpoints::{self, format_endpoint, format_fiat_endpoint},
        fiat::Fiat,
        period::{
            JsonFilePeriodList, PeriodKey, PeriodList,
            test_utils::{test_builder, test_transaction},
        },
        test_utils::select_text,
        transaction::TransactionType,
    };

    use super::{DeletePeriodState, delete_period_endpoint};

    fn get_test_server(period_list: Arc<JsonFilePeriodList>) -> TestServer {
        let app = Router::new()
            .route(endpoints::PERIOD, delete(delete_period_endpoint))
            .layer(Extension(UserID::new(1)))
            .with_state(DeletePeriodState { period_list });

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn period_url(fiat: Fiat, id: i64) -> String {
        format_endpoint(&format_fiat_endpoint(endpoints::PERIOD, fiat), id)
    }

    #[tokio::test]
    async fn deletes_period_and_returns_grand_totals() {
        let dir = TempDir::new().unwrap();
        let period_list = Arc::new(JsonFilePeriodList::new(dir.path().join("periods.json")));
        let key = PeriodKey::new(UserID::new(1), Fiat::Ves);
        let first = period_list
            .append(
                &key,
                test_builder(vec![test_transaction(
                    1,
                    TransactionType::Income,
                    360.0,
                    2.0,
                    date!(2025 - 10 - 01),
                )]),
            )
            .unwrap();
        let second = period_list
            .append(
                &key,
                test_builder(vec![test_transaction(
                    2,
                    TransactionType::Income,
                    900.0,
                    5.0,
                    date!(2025 - 10 - 05),
                )]),
            )
            .unwrap();
        let server = get_test_server(period_list.clone());

        let response = server.delete(&period_url(Fiat::Ves, first.id)).await;

        response.assert_status_ok();
        assert_eq!(period_list.read(&key).unwrap(), vec![second]);
        let html = Html::parse_fragment(&response.text());
        let totals = select_text(&html, "#grand-totals[hx-swap-oob] p");
        assert_eq!(totals, ["Bs 900.00", "5.00 USDT", "0.70 USDT"]);
    }

    #[tokio::test]
    async fn missing_period_is_not_found() {
        let dir = TempDir::new().unwrap();
        let period_list = Arc::new(JsonFilePeriodList::new(dir.path().join("periods.json")));
        let server = get_test_server(period_list);

        let response = server.delete(&period_url(Fiat::Cop, 42)).await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn period_of_other_currency_is_kept() {
        let dir = TempDir::new().unwrap();
        let period_list = Arc::new(JsonFilePeriodList::new(dir.path().join("periods.json")));
        let key = PeriodKey::new(UserID::new(1), Fiat::Ves);
        let period = period_list
            .append(
                &key,
                test_builder(vec![test_transaction(
                    1,
                    TransactionType::Income,
                    360.0,
                    2.0,
                    date!(2025 - 10 - 01),
                )]),
            )
            .unwrap();
        let server = get_test_server(period_list.clone());

        let response = server.delete(&period_url(Fiat::Cop, period.id)).await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(period_list.read(&key).unwrap().len(), 1);
    }
}
