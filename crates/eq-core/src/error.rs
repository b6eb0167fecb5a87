use thiserror::Error;

pub type EqResult<T> = Result<T, EqError>;

#[derive(Error, Debug)]
pub enum EqError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },

    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { unit: String, quantity: &'static str },

    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: &'static str },
}
