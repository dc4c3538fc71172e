//! Errors raised while decoding `/key value` payloads

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload contained no directive at all.
    #[error("Invalid accessory view payload: payload is empty")]
    EmptyPayload,

    /// A key name outside the schema was requested.
    #[error("Invalid accessory view payload: unknown key '{0}'")]
    UnknownKey(String),

    /// A directive that needs a value was given as a bare flag.
    #[error("Invalid accessory view payload: missing value for '{0}'")]
    MissingValue(&'static str),

    #[error("Invalid accessory view payload: unknown accessory view type '{0}'")]
    UnknownAccessoryType(String),

    #[error("Invalid accessory view payload: {0}")]
    Invalid(String),
}
