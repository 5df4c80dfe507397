//! Sources of random decimal digits for building identifier candidates.

use rand::{Rng, rng};

/// A source of decimal digits.
///
/// This abstraction allows the allocator to use the thread-local RNG in
/// production and a fixed sequence of digits in tests.
pub trait DigitSource {
    /// Returns a digit in the range `lowest..=9`.
    ///
    /// Callers must ensure `lowest <= 9`.
    fn next_digit(&mut self, lowest: u8) -> u8;
}

impl<D: DigitSource + ?Sized> DigitSource for &mut D {
    fn next_digit(&mut self, lowest: u8) -> u8 {
        (**self).next_digit(lowest)
    }
}

/// A [DigitSource] that uses the thread-local RNG.
///
/// This type does not store the RNG, it accesses the thread-local generator
/// on each call, so it is safe to create one per request.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl DigitSource for ThreadRandom {
    fn next_digit(&mut self, lowest: u8) -> u8 {
        rng().random_range(lowest..=9)
    }
}

/// Create a string of `length` random digits.
///
/// When `length` is greater than one the first digit is never zero, so the
/// value keeps its length if it is later parsed as an integer.
pub fn random_digits(source: &mut impl DigitSource, length: usize) -> String {
    (0..length)
        .map(|position| {
            let lowest = if position == 0 && length > 1 { 1 } else { 0 };
            char::from(b'0' + source.next_digit(lowest))
        })
        .collect()
}

/// Create a fixed-width string of random digits where any digit, including
/// the first, may be zero.
pub fn random_segment(source: &mut impl DigitSource, width: usize) -> String {
    (0..width)
        .map(|_| char::from(b'0' + source.next_digit(0)))
        .collect()
}

/// A [DigitSource] that cycles through a fixed list of digits.
///
/// A digit lower than the requested minimum is raised to that minimum.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct CycleDigits {
    digits: Vec<u8>,
    position: usize,
}

#[cfg(test)]
impl CycleDigits {
    pub(crate) fn new(digits: &[u8]) -> Self {
        assert!(!digits.is_empty(), "CycleDigits needs at least one digit");

        Self {
            digits: digits.to_vec(),
            position: 0,
        }
    }
}

#[cfg(test)]
impl DigitSource for CycleDigits {
    fn next_digit(&mut self, lowest: u8) -> u8 {
        let digit = self.digits[self.position % self.digits.len()];
        self.position += 1;

        digit.max(lowest)
    }
}
