use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::BomError;

/// Currencies suppliers are queried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Gbp,
    Eur,
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Usd];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }

    /// Number of decimal places in the currency's minor unit.
    pub fn minor_units(self) -> u32 {
        2
    }

    /// Round to the minor unit, half away from zero.
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointAwayFromZero)
    }

    /// Render an amount rounded to the minor unit, e.g. `0.10` or `£0.10`.
    pub fn format(self, amount: Decimal, with_symbol: bool) -> String {
        let places = self.minor_units() as usize;
        let rounded = self.round(amount);
        if with_symbol {
            format!("{}{:.*}", self.symbol(), places, rounded)
        } else {
            format!("{:.*}", places, rounded)
        }
    }
}

impl FromStr for Currency {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            _ => Err(BomError::UnsupportedCurrency(s.to_string())),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("gbp".parse::<Currency>().unwrap(), Currency::Gbp);
        assert_eq!(" Usd ".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
    }

    #[test]
    fn test_unsupported_currency() {
        let err = "JPY".parse::<Currency>().unwrap_err();
        assert!(matches!(err, BomError::UnsupportedCurrency(ref c) if c == "JPY"));
    }

    #[test]
    fn test_format_rounds_to_minor_unit() {
        assert_eq!(Currency::Gbp.format(dec!(0.1), false), "0.10");
        assert_eq!(Currency::Gbp.format(dec!(0.125), false), "0.13");
        assert_eq!(Currency::Usd.format(dec!(12.3449), true), "$12.34");
        assert_eq!(Currency::Eur.format(dec!(3), true), "€3.00");
    }
}
