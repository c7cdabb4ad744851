use thiserror::Error;

/// Recoverable errors surfaced by this crate.
///
/// Per the crate's error-handling design, this is the *only* place an
/// `Err` is returned: [`crate::types::FEMArgs::new`] runs once at process
/// startup, so validating it through a `Result` is the idiomatic choice.
/// Everything downstream of a validated `FEMArgs` either returns a
/// sentinel value (a candidate that failed the band) or aborts via
/// `assert!`/`debug_assert!` on a precondition violation, exactly as the
/// reference implementation does.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// `error_threshold` must stay below 16 so that the `2*e+1`-bit band
    /// fits a 32-bit scalar lane (and the `1 << 2*e` injection bit fits a
    /// 16-bit SIMD lane).
    #[error("error_threshold must be <= {max}, got {got}")]
    ErrorThresholdTooLarge { max: u8, got: u8 },
}
