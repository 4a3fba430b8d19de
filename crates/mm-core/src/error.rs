//! Error types for Murmur
//!
//! All fatal conditions are detected eagerly at call entry; callers receive
//! either a fully valid output signal or one of these errors naming the
//! violated constraint. Non-fatal advisories (stability, suspected transposed
//! buffers) go through `log::warn!` instead.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum MurmurError {
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid filter coefficients: {0}")]
    InvalidCoefficients(String),

    #[error("Invalid filter mode: {0}")]
    InvalidMode(String),

    #[error("Parameter out of range: {0}")]
    ParameterOutOfRange(String),
}

/// Result type alias
pub type MurmurResult<T> = Result<T, MurmurError>;
