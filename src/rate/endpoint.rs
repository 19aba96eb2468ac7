//! The JSON endpoint that reports the current USDT price for a fiat currency.

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState,
    fiat::Fiat,
    rate::{FALLBACK_SOURCE, FetchOutcome, MARKETPLACE_SOURCE, P2PClient},
};

/// The state needed for [get_rate_endpoint].
#[derive(Debug, Clone)]
pub struct RateEndpointState {
    /// The client for the upstream price sources.
    pub p2p_client: P2PClient,
}

impl FromRef<AppState> for RateEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            p2p_client: state.p2p_client.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    fiat: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateData {
    pub usdt_fiat_price: String,
    pub usdt_usd_price: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub usd_ves_rate: Option<f64>,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FallbackData {
    pub usdt_fiat_price: String,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// The body returned by [get_rate_endpoint].
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<RateData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fallback: Option<FallbackData>,
}

impl RateResponse {
    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            fallback: None,
        }
    }
}

/// Get the USDT price for the currency in the `fiat` query parameter.
///
/// Responds with HTTP 500 and the currency's fallback price if the
/// marketplace could not be used, or HTTP 400 if the currency is not supported.
pub async fn get_rate_endpoint(
    State(state): State<RateEndpointState>,
    Query(query): Query<RateQuery>,
) -> Response {
    let fiat = match query.fiat.as_deref().map(str::parse::<Fiat>) {
        Some(Ok(fiat)) => fiat,
        Some(Err(error)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RateResponse::error(error.to_string())),
            )
                .into_response();
        }
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RateResponse::error(
                    "missing the \"fiat\" query parameter".to_owned(),
                )),
            )
                .into_response();
        }
    };

    let client = &state.p2p_client;
    let (p2p_price, usdt_usd_price, usd_ves_rate) = tokio::join!(
        client.fetch_p2p_price(fiat),
        client.fetch_usdt_usd_price(),
        async {
            match fiat {
                Fiat::Ves => client.fetch_usd_ves_rate().await,
                Fiat::Cop => None,
            }
        }
    );

    let outcome = FetchOutcome::now(p2p_price);

    if let Err(error) = &outcome.result {
        let error = error.to_string();
        let rate = outcome.resolve(fiat);
        let body = RateResponse {
            success: false,
            data: None,
            error: Some(error),
            fallback: Some(FallbackData {
                usdt_fiat_price: rate.price_string(),
                source: FALLBACK_SOURCE.to_owned(),
                timestamp: rate.fetched_at,
            }),
        };

        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    let rate = outcome.resolve(fiat);
    tracing::info!("USDT/{fiat} price from {MARKETPLACE_SOURCE}: {}", rate.price_string());

    Json(RateResponse {
        success: true,
        data: Some(RateData {
            usdt_fiat_price: rate.price_string(),
            usdt_usd_price,
            usd_ves_rate,
            source: rate.source,
            timestamp: rate.fetched_at,
        }),
        error: None,
        fallback: None,
    })
    .into_response()
}
