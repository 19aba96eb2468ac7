//! HTTP client for the Binance P2P marketplace and the auxiliary price feeds.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::fiat::Fiat;

/// The marketplace search endpoint that lists USDT ads for a fiat currency.
pub const DEFAULT_P2P_URL: &str = "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search";
/// The spot ticker used to sanity check the USDT peg.
pub const DEFAULT_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=USDTUSDC";
/// The public reference rates for USD.
pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Upper bound for a single upstream request, including reading the body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How many ads from the top of the listing are averaged.
const ADS_TO_AVERAGE: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The reasons a marketplace rate could not be obtained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or timed out.
    #[error("could not reach the marketplace: {0}")]
    Network(String),

    /// The marketplace answered with a non-success HTTP status.
    #[error("the marketplace responded with HTTP status {0}")]
    Status(u16),

    /// The body was not the JSON document we expected.
    #[error("the marketplace response could not be parsed: {0}")]
    Malformed(String),

    /// The body parsed but reported `success: false`.
    #[error("the marketplace reported an unsuccessful search")]
    Unsuccessful,

    /// The search returned no ads.
    #[error("the marketplace returned no ads")]
    NoAds,

    /// None of the averaged ads had a numeric price.
    #[error("none of the ads had a valid price")]
    NoValidPrices,

    /// The mean price was zero or negative.
    #[error("the average price {0} is not positive")]
    NonPositive(f64),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else if error.is_decode() {
            FetchError::Malformed(error.to_string())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// The body of a marketplace search request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    page: u32,
    rows: u32,
    pay_types: Vec<String>,
    asset: &'a str,
    trade_type: &'a str,
    fiat: &'a str,
    publisher_type: Option<String>,
}

impl<'a> SearchRequest<'a> {
    fn buy_usdt(fiat: &'a str) -> Self {
        Self {
            page: 1,
            rows: 10,
            pay_types: Vec::new(),
            asset: "USDT",
            trade_type: "BUY",
            fiat,
            publisher_type: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Vec<AdEntry>>,
}

#[derive(Debug, Deserialize)]
struct AdEntry {
    adv: Advertisement,
}

#[derive(Debug, Deserialize)]
struct Advertisement {
    price: serde_json::Value,
}

impl Advertisement {
    /// The ad price as a number, if it is one.
    ///
    /// Prices normally arrive as strings, e.g. "4006.50".
    fn price(&self) -> Option<f64> {
        let price = match &self.price {
            serde_json::Value::String(text) => text.trim().parse::<f64>().ok()?,
            serde_json::Value::Number(number) => number.as_f64()?,
            _ => return None,
        };

        price.is_finite().then_some(price)
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    rates: std::collections::HashMap<String, f64>,
}

/// Reduces a raw marketplace search body to a single price.
///
/// The mean of the first five ads with a parsable price is returned.
fn average_price(body: &str) -> Result<f64, FetchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|error| FetchError::Malformed(error.to_string()))?;

    if !response.success {
        return Err(FetchError::Unsuccessful);
    }

    let ads = match response.data {
        Some(ads) if !ads.is_empty() => ads,
        _ => return Err(FetchError::NoAds),
    };

    let prices: Vec<f64> = ads
        .iter()
        .take(ADS_TO_AVERAGE)
        .filter_map(|entry| entry.adv.price())
        .collect();

    if prices.is_empty() {
        return Err(FetchError::NoValidPrices);
    }

    let mean = prices.iter().sum::<f64>() / prices.len() as f64;

    if mean <= 0.0 {
        return Err(FetchError::NonPositive(mean));
    }

    Ok(mean)
}

/// Client for the upstream price sources.
///
/// Each method makes exactly one request per call. There are no retries.
#[derive(Debug, Clone)]
pub struct P2PClient {
    http: HttpClient,
    p2p_url: String,
    ticker_url: String,
    exchange_rate_url: String,
}

impl Default for P2PClient {
    fn default() -> Self {
        Self::new(DEFAULT_P2P_URL, DEFAULT_TICKER_URL, DEFAULT_EXCHANGE_RATE_URL)
    }
}

impl P2PClient {
    /// Create a client that talks to the given endpoints.
    pub fn new(p2p_url: &str, ticker_url: &str, exchange_rate_url: &str) -> Self {
        Self::with_timeout(p2p_url, ticker_url, exchange_rate_url, REQUEST_TIMEOUT)
    }

    /// Create a client that gives up on a request after `timeout`.
    pub fn with_timeout(
        p2p_url: &str,
        ticker_url: &str,
        exchange_rate_url: &str,
        timeout: Duration,
    ) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!("Failed to build HTTP client, using defaults: {error}");
                HttpClient::new()
            });

        Self {
            http,
            p2p_url: p2p_url.to_owned(),
            ticker_url: ticker_url.to_owned(),
            exchange_rate_url: exchange_rate_url.to_owned(),
        }
    }

    /// Get the average price of USDT in `fiat` from the top marketplace ads.
    ///
    /// # Errors
    /// Returns a [FetchError] describing why no usable price was found.
    pub async fn fetch_p2p_price(&self, fiat: Fiat) -> Result<f64, FetchError> {
        let body = self
            .http
            .post(&self.p2p_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SearchRequest::buy_usdt(fiat.code()))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let price = average_price(&body)?;
        tracing::debug!("Average USDT/{fiat} price from the marketplace: {price}");

        Ok(price)
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, reqwest::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        self.http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    /// Get the USDT/USDC spot price, defaulting to 1.0 on any failure.
    pub async fn fetch_usdt_usd_price(&self) -> f64 {
        let result = self.get_json::<TickerResponse>(&self.ticker_url).await;

        match result.map(|ticker| ticker.price.trim().parse::<f64>()) {
            Ok(Ok(price)) if price.is_finite() => price,
            Ok(_) => {
                tracing::warn!("USDT/USDC ticker returned a non-numeric price");
                1.0
            }
            Err(error) => {
                tracing::warn!("Could not get the USDT/USDC ticker: {error}");
                1.0
            }
        }
    }

    /// Get the reference USD to VES rate, if available.
    pub async fn fetch_usd_ves_rate(&self) -> Option<f64> {
        let result = self
            .get_json::<ExchangeRateResponse>(&self.exchange_rate_url)
            .await;

        match result {
            Ok(response) => response.rates.get("VES").copied(),
            Err(error) => {
                tracing::warn!("Could not get the USD/VES reference rate: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod average_price_tests {
    use super::{FetchError, average_price};

    fn ads_body(prices: &[&str]) -> String {
        let ads = prices
            .iter()
            .map(|price| format!(r#"{{"adv":{{"price":"{price}"}}}}"#))
            .collect::<Vec<_>>()
            .join(",");

        format!(r#"{{"success":true,"data":[{ads}]}}"#)
    }

    #[test]
    fn averages_first_five_ads() {
        let body = ads_body(&["4000", "4010", "3995", "4005", "4020", "9999"]);

        assert_eq!(average_price(&body), Ok(4006.0));
    }

    #[test]
    fn skips_unparsable_prices() {
        let body = ads_body(&["180.5", "abc", "181.5"]);

        assert_eq!(average_price(&body), Ok(181.0));
    }

    #[test]
    fn unparsable_price_still_counts_towards_the_first_five() {
        let body = ads_body(&["10", "x", "20", "30", "40", "1000"]);

        assert_eq!(average_price(&body), Ok(25.0));
    }

    #[test]
    fn fails_when_unsuccessful() {
        let body = r#"{"success":false,"data":[{"adv":{"price":"1"}}]}"#;

        assert_eq!(average_price(body), Err(FetchError::Unsuccessful));
    }

    #[test]
    fn fails_on_empty_list() {
        assert_eq!(
            average_price(r#"{"success":true,"data":[]}"#),
            Err(FetchError::NoAds)
        );
        assert_eq!(
            average_price(r#"{"success":true,"data":null}"#),
            Err(FetchError::NoAds)
        );
    }

    #[test]
    fn fails_when_no_price_parses() {
        let body = ads_body(&["", "n/a"]);

        assert_eq!(average_price(&body), Err(FetchError::NoValidPrices));
    }

    #[test]
    fn fails_on_non_positive_mean() {
        let body = ads_body(&["0", "0"]);

        assert_eq!(average_price(&body), Err(FetchError::NonPositive(0.0)));
    }

    #[test]
    fn fails_on_malformed_body() {
        assert!(matches!(
            average_price("<html>blocked</html>"),
            Err(FetchError::Malformed(_))
        ));
    }
}
