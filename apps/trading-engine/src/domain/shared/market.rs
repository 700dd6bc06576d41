//! Market (trading pair) value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a market symbol was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid market '{symbol}': {reason}")]
pub struct MarketParseError {
    /// The rejected input.
    pub symbol: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// A `BASE-QUOTE` trading pair such as `BTC-EUR`.
///
/// Both legs are 2 to 6 uppercase ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Market {
    base: String,
    quote: String,
}

impl Market {
    /// Build a market from its two legs.
    pub fn new(base: &str, quote: &str) -> Result<Self, MarketParseError> {
        format!("{base}-{quote}").parse()
    }

    /// Base asset (what is bought or sold).
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote asset (what the price is denominated in).
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }
}

fn valid_leg(leg: &str) -> bool {
    (2..=6).contains(&leg.len())
        && leg
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && leg.chars().any(|c| c.is_ascii_uppercase())
}

impl FromStr for Market {
    type Err = MarketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| MarketParseError {
            symbol: s.to_string(),
            reason,
        };

        let mut parts = s.split('-');
        let (Some(base), Some(quote), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(err("expected BASE-QUOTE"));
        };
        if !valid_leg(base) || !valid_leg(quote) {
            return Err(err("each leg must be 2-6 uppercase alphanumeric characters"));
        }

        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }
}

impl TryFrom<String> for Market {
    type Error = MarketParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Market> for String {
    fn from(market: Market) -> Self {
        market.to_string()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("BTC-EUR" ; "bitcoin euro")]
    #[test_case("ETH-EUR" ; "ether euro")]
    #[test_case("1INCH-EUR" ; "leading digit")]
    #[test_case("ADA-USDC" ; "four letter quote")]
    fn accepts_valid_markets(symbol: &str) {
        let market: Market = symbol.parse().unwrap();
        assert_eq!(market.to_string(), symbol);
    }

    #[test_case("" ; "empty")]
    #[test_case("BTCEUR" ; "no separator")]
    #[test_case("btc-eur" ; "lowercase")]
    #[test_case("B-EUR" ; "base too short")]
    #[test_case("BTC-EURUSDT" ; "quote too long")]
    #[test_case("BTC-EUR-X" ; "three legs")]
    #[test_case("BT$-EUR" ; "special character")]
    fn rejects_invalid_markets(symbol: &str) {
        assert!(symbol.parse::<Market>().is_err());
    }

    #[test]
    fn exposes_legs() {
        let market = Market::new("BTC", "EUR").unwrap();
        assert_eq!(market.base(), "BTC");
        assert_eq!(market.quote(), "EUR");
    }

    #[test]
    fn deserializes_from_string() {
        let market: Market = serde_json::from_str("\"ETH-EUR\"").unwrap();
        assert_eq!(market.base(), "ETH");
        assert!(serde_json::from_str::<Market>("\"eth-eur\"").is_err());
    }

    proptest! {
        #[test]
        fn display_round_trips(base in "[A-Z]{2,6}", quote in "[A-Z]{2,6}") {
            let market = Market::new(&base, &quote).unwrap();
            prop_assert_eq!(market.to_string().parse::<Market>().unwrap(), market);
        }
    }
}
