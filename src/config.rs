//! The fixed identifiers of the institutions that issue accounts.
//!
//! These are loaded once at startup and shared read-only for the life of the
//! process.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, currency::Currency};

/// The institution that issues GBP accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UkInstitution {
    /// The BIC (SWIFT code) of the institution.
    pub bic: String,
    /// The first two digits shared by every sort code the institution issues.
    pub sort_code_prefix: String,
}

impl UkInstitution {
    /// The 4 character bank code used in UK BBANs, taken from the BIC.
    pub fn bank_code(&self) -> &str {
        self.bic.get(..4).unwrap_or(&self.bic)
    }
}

/// The institution that issues EUR accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EurInstitution {
    /// The BIC (SWIFT code) of the institution.
    pub bic: String,
    /// The two letter country code at the start of the IBAN, e.g. "DE".
    pub country_code: String,
    /// The 8 digit national bank code.
    pub bank_code: String,
}

/// The institution that issues USD accounts.
///
/// US accounts get a freshly allocated routing number instead of a fixed bank
/// code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsInstitution {
    /// The BIC (SWIFT code) of the institution.
    pub bic: String,
}

/// The institution constants for every supported currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionConfig {
    /// Issues GBP accounts.
    pub gbp: UkInstitution,
    /// Issues EUR accounts.
    pub eur: EurInstitution,
    /// Issues USD accounts.
    pub usd: UsInstitution,
}

impl Default for InstitutionConfig {
    /// Fictitious institutions for development and tests.
    fn default() -> Self {
        Self {
            gbp: UkInstitution {
                bic: "MOCKGB2L".to_owned(),
                sort_code_prefix: "90".to_owned(),
            },
            eur: EurInstitution {
                bic: "MOCKDEFF".to_owned(),
                country_code: "DE".to_owned(),
                bank_code: "50090001".to_owned(),
            },
            usd: UsInstitution {
                bic: "MOCKUS33".to_owned(),
            },
        }
    }
}

impl InstitutionConfig {
    /// Read and validate the config from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidInstitutionConfig] if the file cannot be read,
    /// is not valid JSON for this type, or fails [InstitutionConfig::validate].
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|error| {
            Error::InvalidInstitutionConfig(format!("could not read {}: {error}", path.display()))
        })?;

        Self::from_json(&text)
    }

    /// Parse and validate the config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidInstitutionConfig] if `text` is not valid JSON
    /// for this type or fails [InstitutionConfig::validate].
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text)
            .map_err(|error| Error::InvalidInstitutionConfig(error.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that every constant has the shape the identifier formats expect.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidInstitutionConfig] describing the first
    /// invalid value.
    pub fn validate(&self) -> Result<(), Error> {
        for (currency, bic) in [
            (Currency::Gbp, &self.gbp.bic),
            (Currency::Eur, &self.eur.bic),
            (Currency::Usd, &self.usd.bic),
        ] {
            if !is_valid_bic(bic) {
                return Err(Error::InvalidInstitutionConfig(format!(
                    "the {currency} BIC \"{bic}\" must be 8 or 11 letters or digits"
                )));
            }
        }

        if !is_digits(&self.gbp.sort_code_prefix, 2) {
            return Err(Error::InvalidInstitutionConfig(format!(
                "the sort code prefix \"{}\" must be 2 digits",
                self.gbp.sort_code_prefix
            )));
        }

        if !is_digits(&self.eur.bank_code, 8) {
            return Err(Error::InvalidInstitutionConfig(format!(
                "the EUR bank code \"{}\" must be 8 digits",
                self.eur.bank_code
            )));
        }

        let country_code = &self.eur.country_code;
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::InvalidInstitutionConfig(format!(
                "the EUR country code \"{country_code}\" must be 2 uppercase letters"
            )));
        }

        Ok(())
    }

    /// The BIC of the institution that issues accounts in `currency`.
    pub fn bic_for(&self, currency: Currency) -> &str {
        match currency {
            Currency::Gbp => &self.gbp.bic,
            Currency::Eur => &self.eur.bic,
            Currency::Usd => &self.usd.bic,
        }
    }
}

fn is_valid_bic(bic: &str) -> bool {
    (bic.len() == 8 || bic.len() == 11) && bic.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_digits(text: &str, length: usize) -> bool {
    text.len() == length && text.chars().all(|c| c.is_ascii_digit())
}
