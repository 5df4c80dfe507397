//! The currencies accounts can be opened in.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    allocator::{EUR_SEGMENT_WIDTH, UK_SEGMENT_WIDTH, US_SEGMENT_WIDTH},
};

/// A supported account currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Pound sterling, issued with UK IBANs and sort codes.
    Gbp,
    /// Euro, issued with IBANs from the configured EUR country.
    Eur,
    /// US dollar, issued with routing numbers.
    Usd,
}

impl Currency {
    /// Every supported currency, in the order they are offered in forms.
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Usd];

    /// The ISO 4217 code, e.g. "GBP".
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    /// The symbol shown before amounts, e.g. "£".
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }

    /// The number of digits in an account number issued in this currency.
    ///
    /// This matches the width of the account segment of the IBAN so that the
    /// account number can be embedded in it.
    pub fn account_number_length(&self) -> usize {
        match self {
            Currency::Gbp => UK_SEGMENT_WIDTH,
            Currency::Eur => EUR_SEGMENT_WIDTH,
            Currency::Usd => US_SEGMENT_WIDTH,
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            _ => Err(Error::UnsupportedCurrency(s.to_owned())),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
