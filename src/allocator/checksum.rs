//! Check digits for IBAN-shaped identifiers.
//!
//! The digits are derived from the BBAN with country code and `"00"` appended.
//! This is the ISO 13616 check digit calculation, which uses ISO 7064
//! MOD-97-10: appending the country and `"00"` is the same as moving the
//! first four characters of a placeholder IBAN to the end, so any IBAN
//! validator accepts the result.
//!
//! Identifiers issued with these check digits are already stored, so the
//! algorithm must not change, even though the BBANs themselves carry no
//! national check digits and the output is not a real bank account.

/// Compute the two check digits for `bban` issued in `country_code`.
///
/// The digits are `98 - (N mod 97)`, zero padded, where `N` is the number
/// formed by `bban + country_code + "00"` with letters replaced by two-digit
/// values (`A = 10` to `Z = 35`). Characters that are neither ASCII digits
/// nor letters are skipped.
pub fn check_digits(country_code: &str, bban: &str) -> String {
    let remainder = bban
        .chars()
        .chain(country_code.chars())
        .chain("00".chars())
        .fold(0u32, |remainder, c| match c {
            '0'..='9' => (remainder * 10 + c as u32 - '0' as u32) % 97,
            'A'..='Z' | 'a'..='z' => {
                let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 10;
                (remainder * 100 + value) % 97
            }
            _ => remainder,
        });

    format!("{:02}", 98 - remainder)
}
