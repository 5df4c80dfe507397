//! Country specific layouts for IBAN-shaped account identifiers.

use crate::allocator::checksum::check_digits;

/// The width of the variable account segment of a UK BBAN.
pub const UK_SEGMENT_WIDTH: usize = 8;
/// The width of the variable account segment of a euro area BBAN.
pub const EUR_SEGMENT_WIDTH: usize = 10;
/// The width of the variable account segment of a US BBAN.
pub const US_SEGMENT_WIDTH: usize = 10;

/// The fixed institution part of a BBAN along with its country code.
///
/// The full identifier is `country code + check digits + fixed part + account
/// segment`, where only the account segment varies between accounts of one
/// institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IbanFormat {
    /// `GB`, a 4 character bank code, a 6 digit sort code and an 8 digit
    /// account segment.
    Uk { bank_code: String, sort_code: String },
    /// A euro area country code, an 8 digit bank code and a 10 digit account
    /// segment.
    Eur {
        country_code: String,
        bank_code: String,
    },
    /// `US`, a 9 digit routing number and a 10 digit account segment.
    Us { routing_number: String },
}

impl IbanFormat {
    pub fn country_code(&self) -> &str {
        match self {
            IbanFormat::Uk { .. } => "GB",
            IbanFormat::Eur { country_code, .. } => country_code,
            IbanFormat::Us { .. } => "US",
        }
    }

    pub fn segment_width(&self) -> usize {
        match self {
            IbanFormat::Uk { .. } => UK_SEGMENT_WIDTH,
            IbanFormat::Eur { .. } => EUR_SEGMENT_WIDTH,
            IbanFormat::Us { .. } => US_SEGMENT_WIDTH,
        }
    }

    fn bban_prefix(&self) -> String {
        match self {
            IbanFormat::Uk {
                bank_code,
                sort_code,
            } => format!("{bank_code}{sort_code}"),
            IbanFormat::Eur { bank_code, .. } => bank_code.clone(),
            IbanFormat::Us { routing_number } => routing_number.clone(),
        }
    }

    /// Assemble the identifier for the account `segment`.
    ///
    /// The caller should ensure `segment` is [IbanFormat::segment_width] digits.
    pub fn compose(&self, segment: &str) -> String {
        let bban = format!("{}{segment}", self.bban_prefix());
        let country_code = self.country_code();
        let check = check_digits(country_code, &bban);

        format!("{country_code}{check}{bban}")
    }
}
