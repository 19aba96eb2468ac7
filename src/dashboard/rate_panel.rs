//! The panel that shows the current USDT rate and the handler that refreshes it.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::draft::draft_usdt,
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_fiat,
    },
    rate::{ConnectionStatus, FetchOutcome, P2PClient, Rate},
    timezone::get_local_offset,
    workspace::{RateState, Workspace, Workspaces},
};

/// The element ID of the rate panel.
pub const RATE_PANEL_ID: &str = "rate-panel";

/// The state needed to refresh a dashboard's rate.
#[derive(Debug, Clone)]
pub struct RefreshRateState {
    pub p2p_client: P2PClient,
    pub workspaces: Workspaces,
    /// The local timezone as a canonical timezone name, e.g. "America/Caracas".
    pub local_timezone: String,
}

impl FromRef<AppState> for RefreshRateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            p2p_client: state.p2p_client.clone(),
            workspaces: state.workspaces.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn format_updated_at(updated_at: OffsetDateTime, local_offset: UtcOffset) -> String {
    updated_at
        .to_offset(local_offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|error| {
            tracing::error!("Could not format rate timestamp: {error}");
            updated_at.to_string()
        })
}

fn status_badge(status: ConnectionStatus) -> Markup {
    let (label, style) = match status {
        ConnectionStatus::Idle => (
            "Waiting",
            "bg-gray-100 text-gray-800 dark:bg-gray-700 dark:text-gray-300",
        ),
        ConnectionStatus::Connected => (
            "Connected",
            "bg-green-100 text-green-800 dark:bg-green-900 dark:text-green-300",
        ),
        ConnectionStatus::Error => (
            "Offline",
            "bg-red-100 text-red-800 dark:bg-red-900 dark:text-red-300",
        ),
    };

    html! {
        span
            data-status=(label.to_lowercase())
            class={ "text-xs font-medium px-2.5 py-0.5 rounded " (style) }
        {
            (label)
        }
    }
}

/// Renders the rate panel.
///
/// With `auto_refresh` the panel asks for a new rate shortly after the page
/// loads and replaces itself with the response.
pub fn rate_panel(
    fiat: Fiat,
    rate_state: &RateState,
    local_offset: UtcOffset,
    auto_refresh: bool,
) -> Markup {
    let refresh_url = format_fiat_endpoint(endpoints::REFRESH_RATE, fiat);

    html! {
        section
            id=(RATE_PANEL_ID)
            class=(CARD_STYLE)
            hx-post=[auto_refresh.then_some(&refresh_url)]
            hx-trigger=[auto_refresh.then_some("load delay:100ms")]
            hx-swap=[auto_refresh.then_some("outerHTML")]
        {
            div class="flex items-center justify-between mb-2"
            {
                h2 class="text-lg font-semibold" { "USDT/" (fiat.code()) " rate" }
                (status_badge(rate_state.status()))
            }

            @match &rate_state.rate {
                Some(rate) => {
                    p class="text-2xl font-bold" data-rate=(rate.price_string())
                    {
                        "1 USDT = " (format_fiat(rate.value, fiat))
                    }

                    dl class="mt-2 text-sm text-gray-500 dark:text-gray-400"
                    {
                        div class="flex gap-1"
                        {
                            dt { "Source:" }
                            dd { (rate.source) }
                        }
                        div class="flex gap-1"
                        {
                            dt { "Last update:" }
                            dd { (format_updated_at(rate.fetched_at, local_offset)) }
                        }
                    }
                }
                None => {
                    p class="text-2xl font-bold text-gray-400" { "Loading rate…" }
                }
            }

            form
                hx-put=(refresh_url)
                hx-target={ "#" (RATE_PANEL_ID) }
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class="mt-4"
            {
                label for="manual-rate" class=(FORM_LABEL_STYLE)
                {
                    "Current rate (" (fiat.code()) " per USDT)"
                }
                div class="flex gap-2"
                {
                    input
                        type="number"
                        name="rate"
                        id="manual-rate"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=[rate_state.rate.as_ref().map(Rate::price_string)]
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    ;
                    button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Set" }
                }
            }

            button
                type="button"
                hx-post=(refresh_url)
                hx-target={ "#" (RATE_PANEL_ID) }
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class={ "mt-4 " (BUTTON_SECONDARY_STYLE) }
            {
                "Refresh rate"
            }
        }
    }
}

/// Fetch a new rate for `fiat` and reconvert the user's draft with it.
///
/// Responds with the new rate panel and an out-of-band update of the draft's
/// USDT amount. A failed fetch is not an error: the fallback rate is used and
/// the panel shows the connection as offline.
pub async fn refresh_rate_endpoint(
    State(state): State<RefreshRateState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<Fiat>,
) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_alert_response(),
    };

    // No locks are held while waiting on the marketplace.
    let outcome = FetchOutcome::now(state.p2p_client.fetch_p2p_price(fiat).await);
    let rate = outcome.resolve(fiat);

    let workspace = match state.workspaces.update(user_id, fiat, |workspace| {
        workspace.set_rate(rate);
        workspace.clone()
    }) {
        Ok(workspace) => workspace,
        Err(error) => return error.into_alert_response(),
    };

    rate_update_response(fiat, &workspace, local_offset)
}

fn rate_update_response(fiat: Fiat, workspace: &Workspace, local_offset: UtcOffset) -> Response {
    html! {
        (rate_panel(fiat, &workspace.rate, local_offset, false))
        (draft_usdt(fiat, &workspace.draft, true))
    }
    .into_response()
}

/// The rate typed in by the user.
#[derive(Debug, Deserialize)]
pub struct ManualRateForm {
    pub rate: String,
}

/// Use the rate typed in by the user for `fiat` and reconvert the draft with
/// it.
///
/// Responds like [refresh_rate_endpoint].
pub async fn set_manual_rate_endpoint(
    State(state): State<RefreshRateState>,
    Extension(user_id): Extension<UserID>,
    Path(fiat): Path<Fiat>,
    Form(form): Form<ManualRateForm>,
) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_alert_response(),
    };

    let rate = form
        .rate
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| Rate::try_manual(value, OffsetDateTime::now_utc()));
    let Some(rate) = rate else {
        return Error::Validation(format!(
            "Enter a rate greater than zero, got \"{}\".",
            form.rate
        ))
        .into_alert_response();
    };
    tracing::debug!("User {user_id} set the {fiat} rate to {}", rate.value);

    match state.workspaces.update(user_id, fiat, |workspace| {
        workspace.set_rate(rate);
        workspace.clone()
    }) {
        Ok(workspace) => rate_update_response(fiat, &workspace, local_offset),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Json, Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use scraper::{Html, Selector};
    use serde_json::json;
    use time::UtcOffset;
    use tokio::net::TcpListener;

    use crate::{
        auth::UserID,
        endpoints::{self, format_fiat_endpoint},
        fiat::Fiat,
        rate::{ConnectionStatus, MANUAL_SOURCE, P2PClient},
        transaction::TransactionType,
        workspace::{RateState, Workspaces},
    };

    use super::{RefreshRateState, rate_panel, refresh_rate_endpoint, set_manual_rate_endpoint};

    async fn spawn_marketplace() -> String {
        let router = Router::new().route(
            "/search",
            post(|| async {
                Json(json!({
                    "success": true,
                    "data": [
                        {"adv": {"price": "4000"}},
                        {"adv": {"price": "4010"}},
                        {"adv": {"price": "3995"}},
                        {"adv": {"price": "4005"}},
                        {"adv": {"price": "4020"}},
                    ]
                }))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        format!("http://{address}/search")
    }

    fn get_test_server(state: RefreshRateState) -> TestServer {
        let app = Router::new()
            .route(
                endpoints::REFRESH_RATE,
                post(refresh_rate_endpoint).put(set_manual_rate_endpoint),
            )
            .layer(Extension(UserID::new(1)))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn first_text(html: &Html, selector: &str) -> String {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .unwrap_or_else(|| panic!("could not find {selector}"))
            .text()
            .collect()
    }

    #[test]
    fn panel_without_rate_refreshes_on_load() {
        let html = Html::parse_fragment(
            &rate_panel(Fiat::Ves, &RateState::default(), UtcOffset::UTC, true).into_string(),
        );

        let panel = html
            .select(&Selector::parse("section#rate-panel").unwrap())
            .next()
            .unwrap();
        assert_eq!(panel.value().attr("hx-trigger"), Some("load delay:100ms"));
        assert_eq!(
            panel.value().attr("hx-post"),
            Some(format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Ves).as_str())
        );
        assert_eq!(first_text(&html, "[data-status]"), "Waiting");
    }

    #[test]
    fn refreshed_panel_does_not_refresh_again() {
        let html = Html::parse_fragment(
            &rate_panel(Fiat::Ves, &RateState::default(), UtcOffset::UTC, false).into_string(),
        );

        let panel = html
            .select(&Selector::parse("section#rate-panel").unwrap())
            .next()
            .unwrap();
        assert_eq!(panel.value().attr("hx-trigger"), None);
    }

    #[tokio::test]
    async fn refresh_uses_marketplace_average() {
        let workspaces = Workspaces::default();
        workspaces
            .update(UserID::new(1), Fiat::Cop, |workspace| {
                workspace.set_draft(TransactionType::Income, Some(80120.0), "")
            })
            .unwrap();
        let server = get_test_server(RefreshRateState {
            p2p_client: P2PClient::new(&spawn_marketplace().await, "", ""),
            workspaces: workspaces.clone(),
            local_timezone: "Etc/UTC".to_owned(),
        });

        let response = server
            .post(&format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Cop))
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(first_text(&html, "[data-rate]"), "1 USDT = COP 4,006.00");
        assert_eq!(first_text(&html, "[data-status]"), "Connected");
        assert!(first_text(&html, "#draft-usdt").contains("20.00 USDT"));

        let workspace = workspaces.get(UserID::new(1), Fiat::Cop).unwrap();
        assert_eq!(workspace.rate.value(), Some(4006.0));
        assert_eq!(workspace.draft.amount_usdt, Some(20.0));
    }

    #[tokio::test]
    async fn failed_refresh_uses_fallback() {
        let workspaces = Workspaces::default();
        let server = get_test_server(RefreshRateState {
            p2p_client: P2PClient::new("http://127.0.0.1:9/search", "", ""),
            workspaces: workspaces.clone(),
            local_timezone: "Etc/UTC".to_owned(),
        });

        let response = server
            .post(&format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Ves))
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(first_text(&html, "[data-rate]"), "1 USDT = Bs 180.00");
        assert_eq!(first_text(&html, "[data-status]"), "Offline");

        let workspace = workspaces.get(UserID::new(1), Fiat::Ves).unwrap();
        assert_eq!(workspace.rate.status(), ConnectionStatus::Error);
        assert_eq!(workspace.rate.value(), Some(180.0));
    }

    #[test]
    fn panel_has_manual_rate_input() {
        let html = Html::parse_fragment(
            &rate_panel(Fiat::Cop, &RateState::default(), UtcOffset::UTC, false).into_string(),
        );

        let form = html
            .select(&Selector::parse("#rate-panel form").unwrap())
            .next()
            .expect("no manual rate form");
        assert_eq!(
            form.value().attr("hx-put"),
            Some(format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Cop).as_str())
        );
        let input = form
            .select(&Selector::parse("input[name=rate]").unwrap())
            .next()
            .expect("no rate input");
        assert_eq!(input.value().attr("type"), Some("number"));
    }

    #[tokio::test]
    async fn manual_rate_recomputes_draft() {
        let workspaces = Workspaces::default();
        workspaces
            .update(UserID::new(1), Fiat::Ves, |workspace| {
                workspace.set_draft(TransactionType::Income, Some(1000.0), "")
            })
            .unwrap();
        let server = get_test_server(RefreshRateState {
            p2p_client: P2PClient::new("http://127.0.0.1:9/search", "", ""),
            workspaces: workspaces.clone(),
            local_timezone: "Etc/UTC".to_owned(),
        });

        let response = server
            .put(&format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Ves))
            .form(&[("rate", "200")])
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(first_text(&html, "[data-rate]"), "1 USDT = Bs 200.00");
        assert!(first_text(&html, "#draft-usdt").contains("5.00 USDT"));

        let workspace = workspaces.get(UserID::new(1), Fiat::Ves).unwrap();
        let rate = workspace.rate.rate.unwrap();
        assert_eq!(rate.value, 200.0);
        assert_eq!(rate.source, MANUAL_SOURCE);
        assert_eq!(rate.status, ConnectionStatus::Connected);
        assert_eq!(workspace.draft.amount_usdt, Some(5.0));
    }

    #[tokio::test]
    async fn manual_rate_must_be_positive() {
        let workspaces = Workspaces::default();
        let server = get_test_server(RefreshRateState {
            p2p_client: P2PClient::new("http://127.0.0.1:9/search", "", ""),
            workspaces: workspaces.clone(),
            local_timezone: "Etc/UTC".to_owned(),
        });

        for rate in ["0", "-3", "abc"] {
            let response = server
                .put(&format_fiat_endpoint(endpoints::REFRESH_RATE, Fiat::Ves))
                .form(&[("rate", rate)])
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
        }
        assert_eq!(workspaces.get(UserID::new(1), Fiat::Ves).unwrap().rate.rate, None);
    }
}
