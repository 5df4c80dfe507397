//! The bounded probe-and-retry loop shared by every identifier generator.

/// The number of candidates tried before an allocation gives up.
pub const MAX_ATTEMPTS: usize = 100;

/// The outcome of [allocate_unique].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation<T> {
    /// The first candidate that did not already exist.
    Accepted(T),
    /// Every one of the [MAX_ATTEMPTS] candidates already existed.
    Exhausted,
}

/// Generate candidates until one does not exist, or until [MAX_ATTEMPTS]
/// candidates have been tried.
///
/// `generate` is called once per attempt and receives the zero-based attempt
/// number. `exists` checks a candidate against the uniqueness domain.
///
/// # Errors
///
/// An error from `exists` is returned immediately and the remaining attempts
/// are skipped.
pub fn allocate_unique<T, E>(
    mut generate: impl FnMut(usize) -> T,
    mut exists: impl FnMut(&T) -> Result<bool, E>,
) -> Result<Allocation<T>, E> {
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = generate(attempt);

        if !exists(&candidate)? {
            return Ok(Allocation::Accepted(candidate));
        }
    }

    Ok(Allocation::Exhausted)
}
