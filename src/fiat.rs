//! The local currencies a ledger can be kept in.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A fiat currency that USDT is bought with on the P2P marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fiat {
    /// Venezuelan bolívar.
    Ves,
    /// Colombian peso.
    Cop,
}

impl Fiat {
    /// All supported currencies in the order they appear in the navigation bar.
    pub const ALL: [Fiat; 2] = [Fiat::Ves, Fiat::Cop];

    /// The ISO 4217 code, e.g. "VES".
    pub fn code(self) -> &'static str {
        match self {
            Fiat::Ves => "VES",
            Fiat::Cop => "COP",
        }
    }

    /// The lowercase code used in URL paths, e.g. "ves".
    pub fn slug(self) -> &'static str {
        match self {
            Fiat::Ves => "ves",
            Fiat::Cop => "cop",
        }
    }

    /// The human readable name of the currency.
    pub fn name(self) -> &'static str {
        match self {
            Fiat::Ves => "Bolívares",
            Fiat::Cop => "Pesos colombianos",
        }
    }

    /// The currency symbol shown in front of amounts.
    pub fn symbol(self) -> &'static str {
        match self {
            Fiat::Ves => "Bs",
            Fiat::Cop => "COP",
        }
    }

    /// The rate used when the marketplace cannot be reached.
    pub fn fallback_rate(self) -> f64 {
        match self {
            Fiat::Ves => 180.0,
            Fiat::Cop => 4000.0,
        }
    }
}

impl Display for Fiat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The error returned when a string is not a supported currency code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unsupported fiat currency \"{0}\"")]
pub struct UnknownFiat(pub String);

impl FromStr for Fiat {
    type Err = UnknownFiat;

    /// Parses either the code or the URL slug, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VES" => Ok(Fiat::Ves),
            "COP" => Ok(Fiat::Cop),
            _ => Err(UnknownFiat(s.to_owned())),
        }
    }
}

impl Serialize for Fiat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

// Accepts the slug as well so that `Path<Fiat>` works with "/dashboard/ves".
impl<'de> Deserialize<'de> for Fiat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Fiat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Fiat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Fiat, UnknownFiat};

    #[test]
    fn parses_codes_and_slugs() {
        assert_eq!("VES".parse(), Ok(Fiat::Ves));
        assert_eq!("cop".parse(), Ok(Fiat::Cop));
        assert_eq!(" Ves ".parse(), Ok(Fiat::Ves));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!("USD".parse::<Fiat>(), Err(UnknownFiat("USD".to_owned())));
    }

    #[test]
    fn fallback_rates() {
        assert_eq!(Fiat::Ves.fallback_rate(), 180.0);
        assert_eq!(Fiat::Cop.fallback_rate(), 4000.0);
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Fiat::Cop).unwrap(), "\"COP\"");
        assert_eq!(serde_json::from_str::<Fiat>("\"VES\"").unwrap(), Fiat::Ves);
        assert_eq!(serde_json::from_str::<Fiat>("\"cop\"").unwrap(), Fiat::Cop);
    }
}
