pub mod logging;

/// Asserts the provided `condition` is true, returning the
/// provided `error` if its false
#[inline]
pub fn require<E>(condition: bool, error: E) -> Result<(), E> {
    match condition {
        true => Ok(()),
        false => Err(error),
    }
}
