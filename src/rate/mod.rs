//! Market rates for buying USDT with a local currency.
//!
//! The rate is fetched from the Binance P2P marketplace by [P2PClient]. When
//! the marketplace cannot be used, [FetchOutcome::resolve] substitutes the
//! currency's fallback rate so the rest of the app always has a usable rate.

mod client;
mod convert;
mod endpoint;

pub use client::{
    DEFAULT_EXCHANGE_RATE_URL, DEFAULT_P2P_URL, DEFAULT_TICKER_URL, FetchError, P2PClient,
};
pub use convert::convert;
pub use endpoint::get_rate_endpoint;

use time::OffsetDateTime;

use crate::fiat::Fiat;

use convert::round_to_cents;

/// The label shown when the rate came from the marketplace.
pub const MARKETPLACE_SOURCE: &str = "Binance P2P";
/// The label shown when the fallback rate is used.
pub const FALLBACK_SOURCE: &str = "Default value";
/// The label shown when the user typed in the rate.
pub const MANUAL_SOURCE: &str = "Manual";

/// Whether the last rate fetch reached the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No fetch has completed yet.
    #[default]
    Idle,
    /// The last fetch succeeded.
    Connected,
    /// The last fetch failed and the fallback rate is in use.
    Error,
}

/// A resolved rate: fiat units per 1 USDT.
#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    /// Fiat units per USDT, rounded to two decimal places. Always positive.
    pub value: f64,
    /// Where the value came from.
    pub source: String,
    /// When the fetch finished.
    pub fetched_at: OffsetDateTime,
    /// Whether the marketplace was reached.
    pub status: ConnectionStatus,
}

impl Rate {
    /// The fallback rate for `fiat`.
    pub fn fallback(fiat: Fiat, fetched_at: OffsetDateTime) -> Self {
        Self {
            value: fiat.fallback_rate(),
            source: FALLBACK_SOURCE.to_owned(),
            fetched_at,
            status: ConnectionStatus::Error,
        }
    }

    /// A rate typed in by the user, rounded to two decimal places.
    ///
    /// Returns `None` unless `value` is a positive number.
    pub fn try_manual(value: f64, fetched_at: OffsetDateTime) -> Option<Self> {
        let value = round_to_cents(value);

        (value.is_finite() && value > 0.0).then(|| Self {
            value,
            source: MANUAL_SOURCE.to_owned(),
            fetched_at,
            status: ConnectionStatus::Connected,
        })
    }

    /// The rate formatted with two decimals, e.g. "4006.00".
    pub fn price_string(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// The result of a single marketplace fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// The raw mean price, or why there is none.
    pub result: Result<f64, FetchError>,
    /// When the fetch finished.
    pub fetched_at: OffsetDateTime,
}

impl FetchOutcome {
    /// Record the result of a fetch that finished just now.
    pub fn now(result: Result<f64, FetchError>) -> Self {
        Self {
            result,
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    /// Turn the outcome into a usable rate, substituting the fallback for
    /// `fiat` if the fetch failed.
    pub fn resolve(self, fiat: Fiat) -> Rate {
        match self.result {
            Ok(price) => Rate {
                value: round_to_cents(price),
                source: MARKETPLACE_SOURCE.to_owned(),
                fetched_at: self.fetched_at,
                status: ConnectionStatus::Connected,
            },
            Err(error) => {
                tracing::warn!("Using the fallback rate for {fiat}: {error}");
                Rate::fallback(fiat, self.fetched_at)
            }
        }
    }
}
